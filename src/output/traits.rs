//! Output sink trait and errors
//!
//! This module defines the trait interface every destination for archive
//! entries implements.

use crate::archive::ArchiveEntry;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for archive entries
///
/// Output errors are the one class of failure that aborts a run, so sinks
/// should surface them rather than swallow them.
pub trait EntrySink {
    /// Records one archive entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The entry to record
    fn write_entry(&mut self, entry: &ArchiveEntry) -> OutputResult<()>;

    /// Flushes any buffered entries to the underlying destination
    fn flush(&mut self) -> OutputResult<()>;
}

/// Collects entries in memory; used by dry runs and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    pub entries: Vec<ArchiveEntry>,
}

impl MemorySink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntrySink for MemorySink {
    fn write_entry(&mut self, entry: &ArchiveEntry) -> OutputResult<()> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
