use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use snafu::prelude::*;

use crate::{cli::Cli, config::MirrorConfig, ext::BestEffortPathExt, mirror::FailurePolicy};

/// Fully validated settings of a mirror run. Command line values take
/// precedence over the config file.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub interval: Duration,
    pub log_file: PathBuf,
    pub failure_policy: FailurePolicy,
    pub once: bool,
}

impl RuntimeConfig {
    pub fn from_sources(cli: &Cli, file: MirrorConfig) -> Result<Self, ArgumentError> {
        let source = cli
            .source
            .clone()
            .or(file.source)
            .context(MissingSnafu { name: "source" })?;
        let replica = cli
            .replica
            .clone()
            .or(file.replica)
            .context(MissingSnafu { name: "replica" })?;
        let log_file = cli
            .log_file
            .clone()
            .or(file.log_file)
            .context(MissingSnafu { name: "log file" })?;
        let interval = match cli.interval.or(file.interval) {
            Some(0) => return ZeroIntervalSnafu.fail(),
            Some(seconds) => Duration::from_secs(seconds),
            None if cli.once => Duration::ZERO,
            None => return MissingSnafu { name: "interval" }.fail(),
        };
        let failure_policy = cli
            .on_error
            .or(file.on_error)
            .unwrap_or_default()
            .to_failure_policy();

        let source = validate_source(&source)?;
        let replica = prepare_replica(&replica)?;
        ensure!(
            !source.starts_with(&replica) && !replica.starts_with(&source),
            NestedTreesSnafu {
                source_dir: source.clone(),
                replica_dir: replica.clone(),
            }
        );
        let log_file = validate_log_file(&log_file, &replica)?;

        Ok(Self {
            source,
            replica,
            interval,
            log_file,
            failure_policy,
            once: cli.once,
        })
    }
}

fn validate_source(source: &Path) -> Result<PathBuf, ArgumentError> {
    ensure!(
        source.exists(),
        SourceMissingSnafu {
            path: source.to_path_buf()
        }
    );
    ensure!(
        source.is_dir(),
        NotADirectorySnafu {
            path: source.to_path_buf()
        }
    );
    source.canonicalize().context(ResolveSnafu {
        path: source.to_path_buf(),
    })
}

/// Creates the replica root when it does not exist yet.
fn prepare_replica(replica: &Path) -> Result<PathBuf, ArgumentError> {
    if !replica.exists() {
        fs::create_dir_all(replica).context(CreateReplicaSnafu {
            path: replica.to_path_buf(),
        })?;
    }
    ensure!(
        replica.is_dir(),
        NotADirectorySnafu {
            path: replica.to_path_buf()
        }
    );
    replica.canonicalize().context(ResolveSnafu {
        path: replica.to_path_buf(),
    })
}

/// The log file would be deleted by the first pass if it lived in the replica.
fn validate_log_file(log_file: &Path, replica: &Path) -> Result<PathBuf, ArgumentError> {
    let file_name = log_file.file_name().context(InvalidLogFileSnafu {
        path: log_file.to_path_buf(),
    })?;
    let parent = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let log_file = parent
        .canonicalize()
        .context(ResolveSnafu {
            path: parent.to_path_buf(),
        })?
        .join(file_name);

    ensure!(
        !log_file.starts_with(replica),
        LogFileInReplicaSnafu {
            path: log_file.clone()
        }
    );
    Ok(log_file)
}

#[derive(Debug, Snafu)]
pub enum ArgumentError {
    #[snafu(display("No {} given, pass it on the command line or in the config file", name))]
    MissingError { name: &'static str },
    #[snafu(display("The interval must be at least one second"))]
    ZeroIntervalError,
    #[snafu(display("Source directory {} does not exist", path.best_effort_path_display()))]
    SourceMissingError { path: PathBuf },
    #[snafu(display("{} is not a directory", path.best_effort_path_display()))]
    NotADirectoryError { path: PathBuf },
    #[snafu(display("Failed to create replica directory {}", path.best_effort_path_display()))]
    CreateReplicaError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to resolve {}", path.best_effort_path_display()))]
    ResolveError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "Source {} and replica {} must not contain each other",
        source_dir.display(),
        replica_dir.display()
    ))]
    NestedTreesError {
        source_dir: PathBuf,
        replica_dir: PathBuf,
    },
    #[snafu(display("{} does not name a log file", path.display()))]
    InvalidLogFileError { path: PathBuf },
    #[snafu(display(
        "Log file {} lies inside the replica and would be removed",
        path.display()
    ))]
    LogFileInReplicaError { path: PathBuf },
}
