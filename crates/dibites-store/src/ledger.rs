//! The processed-archive ledger (`processed_zips.txt`).
//!
//! A plain text file with one archive identifier per line. An archive in
//! the ledger is never ingested again, whatever its current contents. The
//! file is rewritten whole (sorted) through a temporary file and a rename.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::StoreError;

/// File name of the ledger inside the data root.
pub const LEDGER_FILE: &str = "processed_zips.txt";

/// Set of archive identifiers that have already been handled.
#[derive(Debug, Clone)]
pub struct ProcessedLedger {
    path: PathBuf,
    entries: BTreeSet<String>,
    pending: usize,
}

impl ProcessedLedger {
    /// Load the ledger at `path`. A missing file is an empty ledger.
    ///
    /// Lines are trimmed and blank lines ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(Self {
            path,
            entries,
            pending: 0,
        })
    }

    /// Where the ledger lives on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an archive has been processed.
    pub fn contains(&self, archive_id: &str) -> bool {
        self.entries.contains(archive_id)
    }

    /// Record an archive as processed. Takes effect on disk at [`persist`].
    ///
    /// Returns `false` if the archive was already recorded.
    ///
    /// [`persist`]: Self::persist
    pub fn mark(&mut self, archive_id: impl Into<String>) -> bool {
        let added = self.entries.insert(archive_id.into());
        if added {
            self.pending = self.pending.saturating_add(1);
        }
        added
    }

    /// Number of recorded archives.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no archive has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether there are marks not yet written to disk.
    pub const fn has_pending(&self) -> bool {
        self.pending > 0
    }

    /// Recorded identifiers in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Write the ledger to disk if anything changed since the last write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the temporary file cannot be written
    /// or renamed into place.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        if !self.has_pending() {
            return Ok(());
        }
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        for entry in &self.entries {
            writeln!(temp, "{entry}").map_err(|e| StoreError::io(temp.path(), e))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;

        tracing::debug!(
            ledger = %self.path.display(),
            entries = self.entries.len(),
            added = self.pending,
            "Ledger persisted"
        );
        self.pending = 0;
        Ok(())
    }
}
