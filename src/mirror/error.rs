use std::path::{Path, PathBuf};

use snafu::Snafu;

use crate::changelog::ChangeLogError;
use crate::filesystem::FileSystemError;
use crate::hashing::HashError;

use super::PassSummary;

/// What went wrong while mirroring a single entry.
#[derive(Debug, Snafu)]
pub enum EntryError {
    #[snafu(display("Failed to fingerprint the entry"), context(false))]
    HashingError { source: HashError },
    #[snafu(display("Failed to update the replica"), context(false))]
    FileSystemError { source: FileSystemError },
    #[snafu(display("Failed to record the change"), context(false))]
    ChangeLogError { source: ChangeLogError },
}

/// An [`EntryError`] tied to the relative path it happened at.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), display("Failed to mirror '{}'", shown(path)))]
pub struct EntryFailure {
    path: PathBuf,
    source: EntryError,
}

impl EntryFailure {
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn error(&self) -> &EntryError {
        &self.source
    }

    pub(crate) fn is_change_log_failure(&self) -> bool {
        matches!(self.source, EntryError::ChangeLogError { .. })
    }
}

fn shown(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        ".".to_string()
    } else {
        path.display().to_string()
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReconcileError {
    #[snafu(display("Mirror pass aborted"))]
    AbortedError { source: EntryFailure },
    #[snafu(display(
        "Mirror pass finished with {} failed entries ({summary})",
        failures.len()
    ))]
    IncompleteError {
        failures: Vec<EntryFailure>,
        summary: PassSummary,
    },
}
