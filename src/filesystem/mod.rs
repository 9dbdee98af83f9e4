//! Transient view of directory contents and the mutating primitives the
//! mirror applies to the replica tree.
//!
//! Entries are derived by listing the filesystem on every pass; nothing here
//! is cached between passes.

mod entry;
mod error;
mod operations;

pub use entry::{DirectoryEntry, DirectoryListing, Entry, EntryKind, FileEntry, list_children};
pub use error::FileSystemError;
pub use operations::{canonicalize, copy_entry, remove_entry, replace_file};
