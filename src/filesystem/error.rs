use std::path::PathBuf;

use snafu::Snafu;

use crate::ext::BestEffortPathExt;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FileSystemError {
    #[snafu(display("Failed to list directory {}", path.best_effort_path_display()))]
    ListError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read metadata of {}", path.best_effort_path_display()))]
    MetadataError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "Failed to copy {} to {}",
        from.best_effort_path_display(),
        to.best_effort_path_display()
    ))]
    CopyError {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to create directory {}", path.best_effort_path_display()))]
    CreateDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to remove {}", path.best_effort_path_display()))]
    RemoveError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to walk the directory tree under {}", path.best_effort_path_display()))]
    WalkError {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[snafu(display("Failed to resolve {}", path.best_effort_path_display()))]
    CanonicalizeError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "Refusing to descend into {} again, it was already visited in this pass",
        path.best_effort_path_display()
    ))]
    CycleDetected { path: PathBuf },
}
