//! Record of every mutation applied to the replica.
//!
//! The mirror engine reports each action as a [`SyncEvent`] to an injected
//! [`ChangeLog`]. The application wires a [`WriterChangeLog`] that appends to
//! the durable log file and echoes to the terminal.

mod change_log;
mod sync_event;

#[cfg(test)]
pub use change_log::MemoryChangeLog;
pub use change_log::{ChangeLog, ChangeLogError, WriterChangeLog};
pub use sync_event::{SyncEvent, SyncEventKind};
