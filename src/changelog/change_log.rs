use std::io::Write;

use colored::{ColoredString, Colorize};
use snafu::{ResultExt, Snafu};

use crate::ext::SystemTimeExt;

use super::{SyncEvent, SyncEventKind};

pub trait ChangeLog {
    /// Records one event. The event is written out before this returns.
    fn record(&mut self, event: &SyncEvent) -> Result<(), ChangeLogError>;
}

/// Appends events to a durable sink as `[timestamp] message` blocks
/// separated by a blank line, and echoes the same line to a live sink.
pub struct WriterChangeLog<D: Write, L: Write> {
    durable: D,
    live: L,
    colorize: bool,
}

impl<D: Write, L: Write> WriterChangeLog<D, L> {
    pub fn new(durable: D, live: L) -> Self {
        Self {
            durable,
            live,
            colorize: false,
        }
    }

    pub fn with_color(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    fn paint(&self, kind: SyncEventKind, message: &str) -> ColoredString {
        match (self.colorize, kind) {
            (false, _) => message.normal(),
            (true, SyncEventKind::Created) => message.green(),
            (true, SyncEventKind::Updated) => message.yellow(),
            (true, SyncEventKind::Deleted) => message.red(),
        }
    }
}

impl<D: Write, L: Write> ChangeLog for WriterChangeLog<D, L> {
    fn record(&mut self, event: &SyncEvent) -> Result<(), ChangeLogError> {
        let timestamp = event.timestamp().to_log_timestamp();
        let message = event.message();

        write!(self.durable, "[{timestamp}] {message}\n\n").context(DurableWriteSnafu)?;
        self.durable.flush().context(DurableWriteSnafu)?;

        let painted = self.paint(event.kind(), &message);
        writeln!(self.live, "[{timestamp}] {painted}").context(LiveWriteSnafu)?;
        self.live.flush().context(LiveWriteSnafu)?;

        Ok(())
    }
}

/// Keeps events in memory in the order they were recorded.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryChangeLog {
    pub events: Vec<SyncEvent>,
}

#[cfg(test)]
impl MemoryChangeLog {
    pub fn summary(&self) -> Vec<(SyncEventKind, String)> {
        self.events
            .iter()
            .map(|event| (event.kind(), event.relative_path().display().to_string()))
            .collect()
    }
}

#[cfg(test)]
impl ChangeLog for MemoryChangeLog {
    fn record(&mut self, event: &SyncEvent) -> Result<(), ChangeLogError> {
        self.events.push(event.clone());
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ChangeLogError {
    #[snafu(display("Failed to append to the change log file"))]
    DurableWriteError { source: std::io::Error },
    #[snafu(display("Failed to echo to the live change log"))]
    LiveWriteError { source: std::io::Error },
}
