//! Archive module: inspection of downloaded packages
//!
//! # Components
//!
//! - `Payload`: a downloaded archive spooled to a temporary file
//! - `ArchiveEntries`: lazy iterator over the archive directory
//! - `infer_media_type`: media type lookup for entry names

mod inspector;
mod media;

use thiserror::Error;

// Re-export main types
pub use inspector::{ArchiveEntries, ArchiveEntry, Payload};
pub use media::infer_media_type;

/// Errors raised while reading an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
