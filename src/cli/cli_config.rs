use std::path::PathBuf;

use clap::Parser;

use crate::application::data::{LogLevel, OnError};

/// Keeps a replica directory identical to a source directory.
#[derive(Parser, Debug, Clone, Default)]
#[command(version)]
pub struct Cli {
    /// Directory to mirror from
    #[clap(long, short, alias = "source_folder")]
    pub source: Option<PathBuf>,

    /// Directory to mirror into; created when missing
    #[clap(long, short, alias = "replica_folder")]
    pub replica: Option<PathBuf>,

    /// Seconds to wait between the end of one pass and the start of the next
    #[clap(long, short, alias = "sync_time", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// File every change is appended to
    #[clap(long, alias = "log_file")]
    pub log_file: Option<PathBuf>,

    /// YAML file providing defaults for the options above
    #[clap(long, short)]
    pub config: Option<PathBuf>,

    /// What to do when an entry cannot be mirrored
    #[clap(long, value_enum)]
    pub on_error: Option<OnError>,

    /// Run a single pass and exit
    #[clap(long)]
    pub once: bool,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}
