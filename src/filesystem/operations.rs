use std::{
    fs,
    path::{Path, PathBuf},
};

use snafu::ResultExt;
use tracing::debug;
use walkdir::WalkDir;

use super::entry::{Entry, EntryKind};
use super::error::{
    CanonicalizeSnafu, CopySnafu, CreateDirSnafu, FileSystemError, MetadataSnafu, RemoveSnafu,
    WalkSnafu,
};

/// Copies `entry` to `target`, which must not exist yet. Directories are
/// copied with their whole subtree, files with `fs::copy` (content and
/// permissions).
pub fn copy_entry(entry: &Entry, target: &Path) -> Result<(), FileSystemError> {
    match entry.kind() {
        EntryKind::File => copy_file(entry.path(), target),
        EntryKind::Directory => copy_tree(entry.path(), target),
    }
}

/// Removes the replica file and copies the source file in its place.
pub fn replace_file(source: &Path, target: &Path) -> Result<(), FileSystemError> {
    fs::remove_file(target).context(RemoveSnafu {
        path: target.to_path_buf(),
    })?;
    copy_file(source, target)
}

/// Removes `path` and everything below it. A symbolic link is removed as a
/// link, its target is left alone.
pub fn remove_entry(path: &Path) -> Result<(), FileSystemError> {
    let metadata = fs::symlink_metadata(path).context(MetadataSnafu {
        path: path.to_path_buf(),
    })?;

    let removed = if metadata.is_dir() {
        debug!("Removing directory tree {}", path.display());
        fs::remove_dir_all(path)
    } else {
        debug!("Removing file {}", path.display());
        fs::remove_file(path)
    };

    removed.context(RemoveSnafu {
        path: path.to_path_buf(),
    })
}

pub fn canonicalize(path: &Path) -> Result<PathBuf, FileSystemError> {
    path.canonicalize().context(CanonicalizeSnafu {
        path: path.to_path_buf(),
    })
}

fn copy_file(source: &Path, target: &Path) -> Result<(), FileSystemError> {
    debug!("Copying {} to {}", source.display(), target.display());
    fs::copy(source, target).context(CopySnafu {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
    })?;
    Ok(())
}

/// Recreates the tree rooted at `source` under `target`. Links are followed;
/// a link loop ends the copy with a walk error.
fn copy_tree(source: &Path, target: &Path) -> Result<(), FileSystemError> {
    for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
        let entry = entry.context(WalkSnafu {
            path: source.to_path_buf(),
        })?;
        // Every walked path lives under `source`
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).context(CreateDirSnafu {
                path: destination.clone(),
            })?;
        } else {
            copy_file(entry.path(), &destination)?;
        }
    }

    Ok(())
}
