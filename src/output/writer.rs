//! Line-oriented entry output
//!
//! One line per archive entry:
//!
//! ```text
//! app-1.0.apk – res/drawable/icon.png – image/png – 4096
//! ```

use super::traits::{EntrySink, OutputResult};
use crate::archive::ArchiveEntry;
use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Separator placed between the fields of an entry line
pub const FIELD_DELIMITER: &str = " – ";

/// Renders an entry as a single output line, without the newline
///
/// Text fields go through [`escape_field`], so every entry maps to exactly
/// one line with exactly four fields.
pub fn format_entry(entry: &ArchiveEntry) -> String {
    let size = entry.uncompressed_size.to_string();
    [
        escape_field(&entry.archive_name),
        escape_field(&entry.entry_name),
        escape_field(&entry.media_type),
        Cow::Borrowed(size.as_str()),
    ]
    .join(FIELD_DELIMITER)
}

/// Escapes characters that would break the line format
///
/// Control characters and backslashes use Rust escape syntax (`\n`, `\\`,
/// `\u{1b}`). The en dash used by [`FIELD_DELIMITER`] becomes `\u{2013}`.
/// Names without such characters are returned unchanged.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    let needs_escape = |c: char| c.is_control() || c == '\\' || c == '–';
    if !field.contains(needs_escape) {
        return Cow::Borrowed(field);
    }

    let mut escaped = String::with_capacity(field.len() + 8);
    for c in field.chars() {
        if c == '–' {
            escaped.extend(c.escape_unicode());
        } else if needs_escape(c) {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

/// Writes entries as delimiter-separated lines
pub struct LineWriter<W: Write> {
    out: W,
    lines_written: u64,
}

impl<W: Write> LineWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            lines_written: 0,
        }
    }

    /// Number of lines written by this writer
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Consumes the writer and returns the underlying destination
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl LineWriter<BufWriter<File>> {
    /// Opens `path` for appending, creating it if needed
    ///
    /// Existing lines are kept, so consecutive runs accumulate in one file.
    pub fn append_to_path(path: impl AsRef<Path>) -> OutputResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        tracing::debug!("Appending entries to {}", path.as_ref().display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> EntrySink for LineWriter<W> {
    fn write_entry(&mut self, entry: &ArchiveEntry) -> OutputResult<()> {
        writeln!(self.out, "{}", format_entry(entry))?;
        self.lines_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
