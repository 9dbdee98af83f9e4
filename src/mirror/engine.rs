use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use derive_more::Display;
use snafu::{Report, ResultExt};
use tracing::{debug, warn};

use crate::changelog::{ChangeLog, SyncEvent, SyncEventKind};
use crate::filesystem::{
    self, DirectoryEntry, DirectoryListing, Entry, EntryKind, FileEntry, FileSystemError,
};
use crate::hashing::{FileHasher, TreeHasher};

use super::error::{AbortedSnafu, EntryError, EntryFailure, EntryFailureSnafu, ReconcileError};

/// What to do when a single entry cannot be mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole pass at the first failing entry.
    #[default]
    Abort,
    /// Record the failure, carry on with the remaining entries and report
    /// every failure once the pass is over.
    Continue,
}

/// Counts of the actions taken during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[display("{created} created, {updated} updated, {deleted} deleted")]
pub struct PassSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl PassSummary {
    pub fn is_empty(&self) -> bool {
        self.created + self.updated + self.deleted == 0
    }

    fn count(&mut self, kind: SyncEventKind) {
        match kind {
            SyncEventKind::Created => self.created += 1,
            SyncEventKind::Updated => self.updated += 1,
            SyncEventKind::Deleted => self.deleted += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorEngine {
    file_hasher: FileHasher,
    tree_hasher: TreeHasher,
    failure_policy: FailurePolicy,
}

impl MirrorEngine {
    pub fn new(failure_policy: FailurePolicy) -> Self {
        let file_hasher = FileHasher::default();
        Self {
            file_hasher,
            tree_hasher: TreeHasher::new(file_hasher),
            failure_policy,
        }
    }

    /// Makes `replica` match `source`, reporting every mutation to `log`.
    ///
    /// Both directories must exist. Each call re-derives everything from the
    /// current state of both trees.
    pub fn reconcile(
        &self,
        source: &Path,
        replica: &Path,
        log: &mut dyn ChangeLog,
    ) -> Result<PassSummary, ReconcileError> {
        debug!("Reconciling {} into {}", source.display(), replica.display());
        let mut pass = Pass {
            engine: self,
            log,
            ancestors: Vec::new(),
            failures: Vec::new(),
            summary: PassSummary::default(),
        };

        let root = Path::new("");
        pass.descend(source, replica, root).context(AbortedSnafu)?;

        let Pass {
            failures, summary, ..
        } = pass;
        if failures.is_empty() {
            Ok(summary)
        } else {
            Err(ReconcileError::IncompleteError { failures, summary })
        }
    }
}

/// State of one reconciliation pass.
struct Pass<'a> {
    engine: &'a MirrorEngine,
    log: &'a mut dyn ChangeLog,
    /// Canonical paths of the source directories currently being descended.
    ancestors: Vec<PathBuf>,
    failures: Vec<EntryFailure>,
    summary: PassSummary,
}

impl Pass<'_> {
    /// Reconciles `source_dir` into `replica_dir` guarding against descending
    /// into a directory that is already on the current path.
    fn descend(
        &mut self,
        source_dir: &Path,
        replica_dir: &Path,
        relative: &Path,
    ) -> Result<(), EntryFailure> {
        let canonical = filesystem::canonicalize(source_dir)
            .map_err(EntryError::from)
            .context(EntryFailureSnafu { path: relative })?;

        if self.ancestors.contains(&canonical) {
            return Err(EntryError::from(FileSystemError::CycleDetected { path: canonical }))
                .context(EntryFailureSnafu { path: relative });
        }

        self.ancestors.push(canonical);
        let result = self.reconcile_level(source_dir, replica_dir, relative);
        self.ancestors.pop();
        result
    }

    fn reconcile_level(
        &mut self,
        source_dir: &Path,
        replica_dir: &Path,
        relative: &Path,
    ) -> Result<(), EntryFailure> {
        let source_children = list(source_dir, relative)?;
        let replica_children = list(replica_dir, relative)?;

        for (name, source_entry) in &source_children {
            let relative_child = relative.join(name);
            let outcome = match (source_entry, replica_children.get(name)) {
                (Entry::Directory(source_sub), Some(Entry::Directory(replica_sub))) => {
                    self.reconcile_directories(source_sub, replica_sub, &relative_child)
                }
                (_, None) => self
                    .create(source_entry, replica_dir, name, &relative_child)
                    .context(EntryFailureSnafu {
                        path: &relative_child,
                    }),
                (_, Some(replica_entry)) => self
                    .reconcile_entries(
                        source_entry,
                        replica_entry,
                        replica_dir,
                        name,
                        &relative_child,
                    )
                    .context(EntryFailureSnafu {
                        path: &relative_child,
                    }),
            };
            self.settle(outcome)?;
        }

        for (name, replica_entry) in &replica_children {
            if source_children.contains_key(name) {
                continue;
            }
            let relative_child = relative.join(name);
            let outcome = self
                .delete(replica_entry, replica_dir, &relative_child)
                .context(EntryFailureSnafu {
                    path: &relative_child,
                });
            self.settle(outcome)?;
        }

        Ok(())
    }

    /// Descends into a directory pair unless their tree digests match. With
    /// the continue policy a subtree that cannot be fingerprinted is treated
    /// as changed so that the failing entries get reported individually.
    fn reconcile_directories(
        &mut self,
        source_sub: &DirectoryEntry,
        replica_sub: &DirectoryEntry,
        relative: &Path,
    ) -> Result<(), EntryFailure> {
        let tree_hasher = &self.engine.tree_hasher;
        let digests = tree_hasher
            .digest(source_sub.path())
            .and_then(|source_digest| {
                tree_hasher
                    .digest(replica_sub.path())
                    .map(|replica_digest| (source_digest, replica_digest))
            });

        match digests {
            Ok((source_digest, replica_digest)) if source_digest == replica_digest => {
                debug!("Subtree {} unchanged ({source_digest})", relative.display());
                return Ok(());
            }
            Ok((source_digest, replica_digest)) => debug!(
                "Subtree {} differs ({source_digest} != {replica_digest}), descending",
                relative.display()
            ),
            Err(error) if self.engine.failure_policy == FailurePolicy::Continue => debug!(
                "Subtree {} could not be fingerprinted, descending: {}",
                relative.display(),
                Report::from_error(error)
            ),
            Err(error) => {
                return Err(EntryError::from(error)).context(EntryFailureSnafu { path: relative });
            }
        }

        self.descend(source_sub.path(), replica_sub.path(), relative)
    }

    /// Handles a name present on both sides that is not a directory pair.
    fn reconcile_entries(
        &mut self,
        source_entry: &Entry,
        replica_entry: &Entry,
        replica_dir: &Path,
        name: &OsStr,
        relative: &Path,
    ) -> Result<(), EntryError> {
        match (source_entry, replica_entry) {
            (Entry::File(source_file), Entry::File(replica_file)) => {
                self.reconcile_files(source_file, replica_file, replica_dir, relative)
            }
            _ => {
                debug!(
                    "{} is a {} in the source but a {} in the replica",
                    relative.display(),
                    source_entry.kind(),
                    replica_entry.kind()
                );
                self.delete(replica_entry, replica_dir, relative)?;
                self.create(source_entry, replica_dir, name, relative)
            }
        }
    }

    fn reconcile_files(
        &mut self,
        source_file: &FileEntry,
        replica_file: &FileEntry,
        replica_dir: &Path,
        relative: &Path,
    ) -> Result<(), EntryError> {
        if source_file.size() != replica_file.size() {
            debug!(
                "{} changed size ({} -> {} bytes)",
                relative.display(),
                replica_file.size(),
                source_file.size()
            );
        } else {
            let hasher = &self.engine.file_hasher;
            let source_digest = source_file.digest(hasher)?;
            let replica_digest = replica_file.digest(hasher)?;
            if source_digest == replica_digest {
                return Ok(());
            }
            debug!(
                "{} changed content ({replica_digest} -> {source_digest})",
                relative.display()
            );
        }

        filesystem::replace_file(source_file.path(), replica_file.path())?;
        self.record(SyncEventKind::Updated, EntryKind::File, relative, replica_dir)
    }

    fn create(
        &mut self,
        source_entry: &Entry,
        replica_dir: &Path,
        name: &OsStr,
        relative: &Path,
    ) -> Result<(), EntryError> {
        filesystem::copy_entry(source_entry, &replica_dir.join(name))?;
        self.record(SyncEventKind::Created, source_entry.kind(), relative, replica_dir)
    }

    fn delete(
        &mut self,
        replica_entry: &Entry,
        replica_dir: &Path,
        relative: &Path,
    ) -> Result<(), EntryError> {
        filesystem::remove_entry(replica_entry.path())?;
        self.record(SyncEventKind::Deleted, replica_entry.kind(), relative, replica_dir)
    }

    fn record(
        &mut self,
        kind: SyncEventKind,
        entry_kind: EntryKind,
        relative: &Path,
        replica_dir: &Path,
    ) -> Result<(), EntryError> {
        let event = SyncEvent::now(kind, entry_kind, relative, replica_dir);
        debug!("{kind} {entry_kind} {}", event.relative_path().display());
        self.log.record(&event)?;
        self.summary.count(kind);
        Ok(())
    }

    /// Applies the failure policy to the outcome of one entry. Change log
    /// failures always stop the pass.
    fn settle(&mut self, outcome: Result<(), EntryFailure>) -> Result<(), EntryFailure> {
        match outcome {
            Ok(()) => Ok(()),
            Err(failure)
                if self.engine.failure_policy == FailurePolicy::Continue
                    && !failure.is_change_log_failure() =>
            {
                warn!("{}", Report::from_error(&failure));
                self.failures.push(failure);
                Ok(())
            }
            Err(failure) => Err(failure),
        }
    }
}

fn list(directory: &Path, relative: &Path) -> Result<DirectoryListing, EntryFailure> {
    filesystem::list_children(directory)
        .map_err(EntryError::from)
        .context(EntryFailureSnafu { path: relative })
}
