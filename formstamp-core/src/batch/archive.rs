//! Zip archive of generated documents
//!
//! Entries are laid out as `{sheet}/{folder}/{name}-{template}.pdf` and are
//! never overwritten: a name already taken in the same folder gets the
//! spreadsheet row number appended.

use super::result::RowError;
use super::template::TemplateKind;
use crate::error::BatchError;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub struct OutputArchive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    used: HashSet<String>,
    entries: Vec<String>,
}

impl Default for OutputArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputArchive {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            used: HashSet::new(),
            entries: Vec::new(),
        }
    }

    /// Path for a row's document that no earlier entry uses
    pub fn entry_path(&self, sheet: &str, kind: TemplateKind, name: &str, row: u32) -> String {
        let folder = format!("{}/{}", sanitize(sheet), kind.folder());
        let name = sanitize(name);

        let path = format!("{folder}/{name}-{}.pdf", kind.file_stem());
        if !self.used.contains(&path) {
            return path;
        }

        let mut candidate = format!("{folder}/{name}-row{row}-{}.pdf", kind.file_stem());
        let mut counter = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{folder}/{name}-row{row}-{counter}-{}.pdf", kind.file_stem());
            counter += 1;
        }
        tracing::debug!("'{}' already taken, using '{}'", path, candidate);
        candidate
    }

    pub fn add(&mut self, path: String, data: &[u8]) -> Result<(), RowError> {
        if self.used.contains(&path) {
            return Err(RowError::Archive(format!("entry '{path}' already exists")));
        }
        self.writer
            .start_file(path.as_str(), self.options)
            .map_err(|e| RowError::Archive(e.to_string()))?;
        self.writer
            .write_all(data)
            .map_err(|e| RowError::Archive(e.to_string()))?;

        self.used.insert(path.clone());
        self.entries.push(path);
        Ok(())
    }

    pub fn entry_names(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the central directory and return the archive bytes
    pub fn finish(self) -> Result<Vec<u8>, BatchError> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| BatchError::Archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// Path separators inside sheet or player names would create extra folders
fn sanitize(component: &str) -> String {
    component.replace(['/', '\\'], "_")
}
