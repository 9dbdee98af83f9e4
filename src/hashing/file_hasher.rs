use std::{
    fs::File,
    hash::Hasher,
    io::{ErrorKind, Read},
    path::{Path, PathBuf},
};

use derive_more::Display;
use metrohash::MetroHash64;
use snafu::{ResultExt, Snafu};

use crate::ext::BestEffortPathExt;

/// Number of bytes read per chunk when streaming a file through the hasher.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{_0:016x}")]
pub struct Digest(u64);

impl Digest {
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl From<MetroHash64> for Digest {
    fn from(hasher: MetroHash64) -> Self {
        Digest(hasher.finish())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FileHasher {
    chunk_size: usize,
}

impl Default for FileHasher {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FileHasher {
    pub fn digest(&self, path: &Path) -> Result<Digest, HashError> {
        let mut file = File::open(path).context(OpenSnafu {
            path: path.to_path_buf(),
        })?;
        let mut buffer = vec![0u8; self.chunk_size];
        let mut hasher = MetroHash64::new();

        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(e).context(ReadSnafu {
                        path: path.to_path_buf(),
                    });
                }
            };
            hasher.write(&buffer[..read]);
        }

        Ok(hasher.into())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HashError {
    #[snafu(display("Failed to open {} for hashing", path.best_effort_path_display()))]
    OpenError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed while reading {} for hashing", path.best_effort_path_display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to walk the directory tree under {}", path.best_effort_path_display()))]
    WalkError {
        path: PathBuf,
        source: walkdir::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn file_with(content: &[u8]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        temp_file
            .write_all(content)
            .expect("Failed to write to temp file");
        temp_file.flush().expect("Failed to flush temp file");
        temp_file
    }

    #[test]
    fn same_content_same_digest() {
        let first = file_with(b"identical content");
        let second = file_with(b"identical content");
        let hasher = FileHasher::default();

        assert_eq!(
            hasher.digest(first.path()).expect("Failed to hash first file"),
            hasher.digest(second.path()).expect("Failed to hash second file"),
        );
    }

    #[test]
    fn equal_length_different_content_differs() {
        let first = file_with(b"v1");
        let second = file_with(b"v2");
        let hasher = FileHasher::default();

        assert_ne!(
            hasher.digest(first.path()).expect("Failed to hash first file"),
            hasher.digest(second.path()).expect("Failed to hash second file"),
        );
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(DEFAULT_CHUNK_SIZE)]
    #[case(1024 * 1024)]
    fn digest_does_not_depend_on_chunk_size(#[case] chunk_size: usize) {
        let content = "0123456789abcdef".repeat(1000);
        let temp_file = file_with(content.as_bytes());

        let expected = FileHasher::default()
            .digest(temp_file.path())
            .expect("Failed to hash with default chunk size");
        let actual = FileHasher { chunk_size }
            .digest(temp_file.path())
            .expect("Failed to hash with custom chunk size");

        assert_eq!(expected, actual);
    }

    #[rstest]
    #[case("")]
    #[case("hello world")]
    #[case("special chars: äöü🚀")]
    #[case("multiline\ncontent\nwith\nnewlines")]
    fn hashing_is_repeatable(#[case] content: &str) {
        let temp_file = file_with(content.as_bytes());
        let hasher = FileHasher::default();

        let first = hasher.digest(temp_file.path()).expect("Failed to hash");
        let second = hasher.digest(temp_file.path()).expect("Failed to hash again");

        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let missing = Path::new("/this/path/does/not/exist.txt");

        match FileHasher::default().digest(missing) {
            Err(HashError::OpenError { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected OpenError, got {other:?}"),
        }
    }

    #[test]
    fn directory_cannot_be_hashed_as_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let result = FileHasher::default().digest(temp_dir.path());

        assert!(result.is_err());
    }

    #[test]
    fn digest_displays_as_fixed_width_hex() {
        assert_eq!(Digest(0xab).to_string(), "00000000000000ab");
    }
}
