//! Content fingerprints for files and whole directory subtrees.
//!
//! A [`Digest`] is a fast, stable, non-cryptographic fingerprint. File
//! digests decide whether a replica file must be replaced; tree digests only
//! decide whether a directory pair needs to be visited at all.

mod file_hasher;
mod tree_hasher;

pub use file_hasher::{Digest, FileHasher, HashError};
pub use tree_hasher::TreeHasher;
