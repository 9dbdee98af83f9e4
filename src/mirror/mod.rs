//! One-way reconciliation of a replica tree against its source.

mod engine;
mod error;

pub use engine::{FailurePolicy, MirrorEngine, PassSummary};
#[cfg(test)]
pub use error::EntryError;
pub use error::{EntryFailure, ReconcileError};
