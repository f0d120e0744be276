//! Archive Inspector - lazy scan of a downloaded archive's directory

use super::media::infer_media_type;
use super::ArchiveError;
use std::fs::File;
use std::io::{self, Seek, Write};
use zip::ZipArchive;

/// One file record inside a downloaded archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name of the archive the entry was read from
    pub archive_name: String,

    /// Entry name within the archive, including directories
    pub entry_name: String,

    /// Inferred media type
    pub media_type: String,

    /// Size once decompressed
    pub uncompressed_size: u64,

    /// Size as stored
    pub compressed_size: u64,
}

/// A downloaded archive spooled to an anonymous temporary file
///
/// The file has no name on disk and is deleted by the OS when the handle is
/// dropped, which happens when the payload is converted into
/// [`ArchiveEntries`] and that iterator finishes or is dropped.
#[derive(Debug)]
pub struct Payload {
    archive_name: String,
    file: File,
}

impl Payload {
    /// Writes downloaded bytes to a fresh temporary file
    pub fn spool(archive_name: impl Into<String>, bytes: &[u8]) -> io::Result<Self> {
        let mut file = tempfile::tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        file.rewind()?;

        Ok(Self {
            archive_name: archive_name.into(),
            file,
        })
    }

    /// File name of the archive, taken from the final download URL
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    /// Size of the spooled archive in bytes
    pub fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Opens the archive directory and hands ownership to the entry iterator
    ///
    /// Fails when the payload is not a readable zip archive; the temporary
    /// file is released in that case too.
    pub fn into_entries(self, default_media_type: &str) -> Result<ArchiveEntries, ArchiveError> {
        let archive = ZipArchive::new(self.file)?;
        tracing::debug!(
            "Opened archive {} with {} entries",
            self.archive_name,
            archive.len()
        );

        Ok(ArchiveEntries {
            archive_name: self.archive_name,
            default_media_type: default_media_type.to_string(),
            archive: Some(archive),
            index: 0,
        })
    }
}

/// Lazy, one-shot sequence of entries in archive directory order
///
/// Entries are read with raw access, so sizes come straight from the
/// central directory and no entry data is inflated. The archive and its
/// temporary file are released after the last entry, after the first error,
/// or when the iterator is dropped.
pub struct ArchiveEntries {
    archive_name: String,
    default_media_type: String,
    archive: Option<ZipArchive<File>>,
    index: usize,
}

impl ArchiveEntries {
    /// Returns true once the underlying archive has been released
    pub fn is_released(&self) -> bool {
        self.archive.is_none()
    }

    fn release(&mut self) {
        if self.archive.take().is_some() {
            tracing::trace!("Released archive {}", self.archive_name);
        }
    }
}

impl Iterator for ArchiveEntries {
    type Item = Result<ArchiveEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        let archive = self.archive.as_mut()?;

        if self.index >= archive.len() {
            self.release();
            return None;
        }

        let archive_name = &self.archive_name;
        let default_media_type = &self.default_media_type;
        let entry = archive
            .by_index_raw(self.index)
            .map(|file| ArchiveEntry {
                archive_name: archive_name.clone(),
                entry_name: file.name().to_string(),
                media_type: infer_media_type(file.name(), default_media_type),
                uncompressed_size: file.size(),
                compressed_size: file.compressed_size(),
            });

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                self.release();
                return Some(Err(e.into()));
            }
        };

        self.index += 1;
        Some(Ok(entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.archive {
            Some(archive) => {
                let remaining = archive.len().saturating_sub(self.index);
                (0, Some(remaining))
            }
            None => (0, Some(0)),
        }
    }
}

impl std::iter::FusedIterator for ArchiveEntries {}
