use std::{
    cell::OnceCell,
    collections::BTreeMap,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use derive_more::Display;
use snafu::ResultExt;

use crate::hashing::{Digest, FileHasher, HashError};

use super::error::{FileSystemError, ListSnafu, MetadataSnafu};

/// Immediate children of one directory keyed by name, in name order.
pub type DirectoryListing = BTreeMap<OsString, Entry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EntryKind {
    #[display("file")]
    File,
    #[display("directory")]
    Directory,
}

#[derive(Debug)]
pub enum Entry {
    File(FileEntry),
    Directory(DirectoryEntry),
}

impl Entry {
    /// Classifies `path` following symbolic links. A dangling link is
    /// reported as a zero-sized file so that it can still be removed or
    /// fail on copy like any other unreadable file.
    pub fn from_path(path: PathBuf) -> Result<Self, FileSystemError> {
        let metadata = fs::metadata(&path)
            .or_else(|_| fs::symlink_metadata(&path))
            .context(MetadataSnafu { path: path.clone() })?;

        if metadata.is_dir() {
            Ok(Entry::Directory(DirectoryEntry { path }))
        } else {
            let size = if metadata.is_file() { metadata.len() } else { 0 };
            Ok(Entry::File(FileEntry {
                path,
                size,
                digest: OnceCell::new(),
            }))
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::File(_) => EntryKind::File,
            Entry::Directory(_) => EntryKind::Directory,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Entry::File(file) => &file.path,
            Entry::Directory(directory) => &directory.path,
        }
    }
}

#[derive(Debug)]
pub struct FileEntry {
    path: PathBuf,
    size: u64,
    digest: OnceCell<Digest>,
}

impl FileEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Content digest, computed on first use and remembered for the
    /// lifetime of this entry.
    pub fn digest(&self, hasher: &FileHasher) -> Result<Digest, HashError> {
        if let Some(digest) = self.digest.get() {
            return Ok(*digest);
        }
        let digest = hasher.digest(&self.path)?;
        Ok(*self.digest.get_or_init(|| digest))
    }
}

#[derive(Debug)]
pub struct DirectoryEntry {
    path: PathBuf,
}

impl DirectoryEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lists one level of `directory`; deeper levels are listed on demand.
pub fn list_children(directory: &Path) -> Result<DirectoryListing, FileSystemError> {
    let read_dir = fs::read_dir(directory).context(ListSnafu {
        path: directory.to_path_buf(),
    })?;

    read_dir
        .map(|dir_entry| {
            let dir_entry = dir_entry.context(ListSnafu {
                path: directory.to_path_buf(),
            })?;
            let entry = Entry::from_path(dir_entry.path())?;
            Ok((dir_entry.file_name(), entry))
        })
        .collect()
}
