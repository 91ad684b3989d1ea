use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "galdiff")]
#[command(about = "Track NPC targets across galaxy scans")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (defaults to ~/.config/galdiff/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Minimum interval between compared scans, e.g. "6h" or "90m"
    #[arg(long, global = true)]
    pub min_delta: Option<String>,

    /// Output as JSON instead of status lines
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Show debug logging on stderr
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Save a collected scan as the newest entry for its system
    Record(InputArgs),

    /// Compare the two most recent saved scans of a system
    Compare(TargetArgs),

    /// Show when a system was last scanned
    Last(LocationArgs),

    /// Delete every saved scan of a system
    Delete(LocationArgs),

    /// Delete only the most recent saved scan of a system
    DeleteLast(LocationArgs),

    /// Import a record exported from the browser userscript
    Import(ImportArgs),
}

/// Trimmed system coordinates; blank input is rejected.
fn location_key(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err("system coordinates cannot be empty".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[derive(Args)]
pub struct InputArgs {
    /// Collector payload file, "-" for stdin
    #[arg(long, short = 'i', default_value = "-")]
    pub input: PathBuf,
}

#[derive(Args)]
pub struct LocationArgs {
    /// System coordinates, e.g. "3:145"
    #[arg(long, short = 'l', value_parser = location_key)]
    pub location: String,
}

#[derive(Args)]
pub struct TargetArgs {
    /// System coordinates, e.g. "3:145"
    #[arg(
        long,
        short = 'l',
        value_parser = location_key,
        conflicts_with = "input",
        required_unless_present = "input"
    )]
    pub location: Option<String>,

    /// Take the system from a collector payload instead (nothing is saved)
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// System coordinates, e.g. "3:145"
    #[arg(long, short = 'l', value_parser = location_key)]
    pub location: String,

    /// Exported record file, "-" for stdin
    #[arg(long, short = 'i', default_value = "-")]
    pub input: PathBuf,
}
