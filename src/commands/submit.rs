use crate::cli::{Cli, Commands};
use crate::domain::models::{JsonOut, SubmitReport, Submission};
use crate::services::pipeline::IngestionPipeline;
use crate::services::settings::Settings;
use crate::services::upload::UploadClient;
use anyhow::Context;
use std::io::Read;
use std::path::Path;

fn read_archive(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("failed to read archive {}", path.display()))
}

fn print_report(cli: &Cli, report: SubmitReport) -> anyhow::Result<()> {
    let status = report.status;
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: report.outcome.is_delivered(),
                data: &report
            })?
        );
    } else {
        println!("{}", serde_json::to_string(&report.body)?);
    }
    if status >= 500 {
        anyhow::bail!("submission halted with status {}", status);
    }
    Ok(())
}

pub fn handle_submit_commands(cli: &Cli, settings: &Settings) -> anyhow::Result<bool> {
    let (archive, submission, oval) = match &cli.command {
        Commands::SubmitArf {
            archive,
            cname,
            policy,
            date,
        } => (archive, Submission::new(cname, policy, stamp(*date))?, false),
        Commands::SubmitOval {
            archive,
            cname,
            oval_policy,
            date,
        } => (archive, Submission::new(cname, oval_policy, stamp(*date))?, true),
        _ => return Ok(false),
    };

    let data = read_archive(archive)?;
    let pipeline = IngestionPipeline::new(settings, UploadClient::new(settings)?)?;
    let report = if oval {
        pipeline.submit_oval(&submission, &data)
    } else {
        pipeline.submit_arf(&submission, &data)
    };
    print_report(cli, report)?;
    Ok(true)
}

fn stamp(date: Option<i64>) -> i64 {
    date.unwrap_or_else(|| chrono::Utc::now().timestamp())
}
