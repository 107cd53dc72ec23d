use crate::cli::{Cli, Commands};
use crate::domain::constants::ARCHIVE_CONTENT_TYPE;
use crate::domain::models::{ArchiveKey, DeleteReport, FetchReport, SpoolErrorsReport, Tier};
use crate::services::output::print_one;
use crate::services::settings::Settings;
use crate::services::storage::{sha256_hex, TieredStorage};
use std::io::Write;
use tracing::info;

pub fn handle_archive_commands(cli: &Cli, settings: &Settings) -> anyhow::Result<bool> {
    let storage = TieredStorage::new(settings);

    match &cli.command {
        Commands::Fetch {
            id,
            cname,
            date,
            digest,
            output,
        } => {
            let key = ArchiveKey::new(cname, id, date)?;
            let data = storage.fetch(Tier::Reports, &key, digest)?;
            match output {
                Some(path) => {
                    std::fs::write(path, &data)?;
                    let report = FetchReport {
                        path: path.display().to_string(),
                        size: data.len(),
                        digest: sha256_hex(&data),
                        content_type: ARCHIVE_CONTENT_TYPE,
                    };
                    print_one(cli.json, report, |r| {
                        format!("{}\t{} bytes\t{}", r.path, r.size, r.content_type)
                    })?;
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&data)?;
                    stdout.flush()?;
                }
            }
        }
        Commands::Delete {
            id,
            cname,
            date,
            digest,
        } => {
            let key = ArchiveKey::new(cname, id, date)?;
            let existed = storage.delete(Tier::Reports, &key)?;
            info!(
                id = key.id(),
                cname = key.cname(),
                digest = %digest,
                existed,
                "report archives deleted"
            );
            let report = DeleteReport {
                id: key.id().to_string(),
                deleted: true,
            };
            print_one(cli.json, report, |r| format!("deleted {}", r.id))?;
        }
        Commands::SpoolErrors => {
            let archives = storage.list_errors(Tier::Corrupted)?;
            let report = SpoolErrorsReport {
                errors_count: archives.len(),
                archives,
            };
            print_one(cli.json, report, |r| {
                let mut lines = vec![format!("errors_count={}", r.errors_count)];
                lines.extend(
                    r.archives
                        .iter()
                        .map(|a| format!("{}\t{}\t{}\t{}", a.cname, a.id, a.date, a.digest)),
                );
                lines.join("\n")
            })?;
        }
        _ => return Ok(false),
    }

    Ok(true)
}
