//! Output module for recording archive entries and run statistics
//!
//! This module handles:
//! - Writing one line per archive entry to an append-only file
//! - Accumulating and logging crawl statistics

pub mod stats;
mod traits;
mod writer;

pub use stats::{log_statistics, CrawlStats};
pub use traits::{EntrySink, MemorySink, OutputError, OutputResult};
pub use writer::{format_entry, LineWriter, FIELD_DELIMITER};
