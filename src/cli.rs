use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "scap-relay",
    version,
    about = "Relay OpenSCAP scan reports to Foreman"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Settings file (default: ~/.config/scap-relay/settings.toml)"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log filter (trace, debug, info, warn, error or an EnvFilter directive)"
    )]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a compressed ARF report archive
    SubmitArf {
        #[arg(help = "Archive path, or - for stdin")]
        archive: PathBuf,
        #[arg(long)]
        cname: String,
        #[arg(long)]
        policy: String,
        #[arg(long, help = "Unix time of the scan (default: now)")]
        date: Option<i64>,
    },
    /// Submit a compressed OVAL results archive
    SubmitOval {
        #[arg(help = "Archive path, or - for stdin")]
        archive: PathBuf,
        #[arg(long)]
        cname: String,
        #[arg(long)]
        oval_policy: String,
        #[arg(long, help = "Unix time of the scan (default: now)")]
        date: Option<i64>,
    },
    /// Read back a stored archive, verified against its digest
    Fetch {
        #[arg(long)]
        id: String,
        #[arg(long)]
        cname: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        digest: String,
        #[arg(long, help = "Write the archive here instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Remove every stored archive of one report
    Delete {
        #[arg(long)]
        id: String,
        #[arg(long)]
        cname: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        digest: String,
    },
    /// List archives parked as corrupted
    SpoolErrors,
}
