//! Archive discovery in the watched folder.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// An archive file found in the watched folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredArchive {
    /// File name, used as the archive identifier in the ledger.
    pub archive_id: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// Last modification time, or the epoch if the platform has none.
    pub modified: SystemTime,
}

/// List archives directly inside `dir` whose extension matches
/// `extension` case-insensitively.
///
/// Results are ordered by modification time, then by file name, so older
/// autosaves are folded in first.
///
/// # Errors
///
/// Returns the I/O error if `dir` cannot be listed.
pub fn discover_archives(dir: &Path, extension: &str) -> io::Result<Vec<DiscoveredArchive>> {
    let mut archives = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !matches {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        archives.push(DiscoveredArchive {
            archive_id: entry.file_name().to_string_lossy().into_owned(),
            path,
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }
    archives.sort_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| a.archive_id.cmp(&b.archive_id))
    });
    Ok(archives)
}
