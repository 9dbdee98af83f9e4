use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use derive_more::Display;

use crate::filesystem::EntryKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SyncEventKind {
    #[display("created")]
    Created,
    #[display("updated")]
    Updated,
    #[display("deleted")]
    Deleted,
}

/// One action taken against the replica tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    kind: SyncEventKind,
    entry_kind: EntryKind,
    relative_path: PathBuf,
    location: PathBuf,
    timestamp: SystemTime,
}

impl SyncEvent {
    /// `relative_path` is relative to the replica root, `location` is the
    /// replica directory that holds the entry.
    pub fn now(
        kind: SyncEventKind,
        entry_kind: EntryKind,
        relative_path: impl Into<PathBuf>,
        location: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind,
            entry_kind,
            relative_path: relative_path.into(),
            location: location.into(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn kind(&self) -> SyncEventKind {
        self.kind
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Names the entry by its own name within `location`.
    pub fn message(&self) -> String {
        let name = self
            .relative_path
            .file_name()
            .unwrap_or(self.relative_path.as_os_str())
            .to_string_lossy();
        let location = self.location.display();
        match (self.kind, self.entry_kind) {
            (SyncEventKind::Created, EntryKind::File) => {
                format!("{name} was created in path {location}")
            }
            (SyncEventKind::Created, EntryKind::Directory) => {
                format!("{name} and its contents were created in path {location}")
            }
            (SyncEventKind::Updated, _) => format!("{name} was modified in path {location}"),
            (SyncEventKind::Deleted, EntryKind::File) => {
                format!("{name} was removed from path {location}")
            }
            (SyncEventKind::Deleted, EntryKind::Directory) => {
                format!("{name} and its content were removed from path {location}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(SyncEventKind::Created, EntryKind::File, "a.txt was created in path /r")]
    #[case(
        SyncEventKind::Created,
        EntryKind::Directory,
        "a.txt and its contents were created in path /r"
    )]
    #[case(SyncEventKind::Updated, EntryKind::File, "a.txt was modified in path /r")]
    #[case(SyncEventKind::Deleted, EntryKind::File, "a.txt was removed from path /r")]
    #[case(
        SyncEventKind::Deleted,
        EntryKind::Directory,
        "a.txt and its content were removed from path /r"
    )]
    fn messages_describe_the_action(
        #[case] kind: SyncEventKind,
        #[case] entry_kind: EntryKind,
        #[case] expected: &str,
    ) {
        let event = SyncEvent::now(kind, entry_kind, "a.txt", "/r");
        assert_eq!(event.message(), expected);
    }

    #[test]
    fn nested_message_names_the_entry_within_its_directory() {
        let event = SyncEvent::now(
            SyncEventKind::Updated,
            EntryKind::File,
            Path::new("docs/guide/intro.md"),
            Path::new("/r/docs/guide"),
        );

        assert_eq!(event.relative_path(), Path::new("docs/guide/intro.md"));
        assert_eq!(event.message(), "intro.md was modified in path /r/docs/guide");
    }
}
