use std::{hash::Hasher, path::Path};

use metrohash::MetroHash64;
use snafu::ResultExt;
use tracing::debug;
use walkdir::WalkDir;

use super::file_hasher::{Digest, FileHasher, HashError, WalkSnafu};

/// Aggregate fingerprint of every file below a directory.
///
/// Files are visited depth-first with siblings sorted by name and their
/// content digests are folded in that order. Directory names are not part of
/// the digest, so two trees holding the same file contents in a different
/// directory layout compare equal. Only use the result to skip work, never
/// to decide what to copy or delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeHasher {
    file_hasher: FileHasher,
}

impl TreeHasher {
    pub fn new(file_hasher: FileHasher) -> Self {
        Self { file_hasher }
    }

    pub fn digest(&self, directory: &Path) -> Result<Digest, HashError> {
        let mut hasher = MetroHash64::new();
        let mut files = 0usize;

        for entry in WalkDir::new(directory)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.context(WalkSnafu {
                path: directory.to_path_buf(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file_digest = self.file_hasher.digest(entry.path())?;
            hasher.write(&file_digest.to_le_bytes());
            files += 1;
        }

        let digest = Digest::from(hasher);
        debug!("Tree digest of {} over {files} files: {digest}", directory.display());
        Ok(digest)
    }
}
