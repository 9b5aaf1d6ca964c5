//! Named-member access over archive containers.
//!
//! Extractors are written against [`ArchiveSource`] rather than a zip reader
//! directly, so unit tests can feed them an in-memory [`MemoryArchive`].

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{ArchiveError, StageError};

/// Largest member a [`ZipSource`] will read into memory (64 MiB).
///
/// The declared size in a zip header is not trusted; reads stop one byte
/// past this limit whatever the header claims.
pub const MAX_MEMBER_BYTES: u64 = 67_108_864;

/// A container of named members.
pub trait ArchiveSource {
    /// Names of every member, in container order.
    fn member_names(&self) -> Vec<String>;

    /// Read a member's bytes, or `None` if no member has that name.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if the member exists but cannot be read.
    fn read_member(&mut self, name: &str) -> Result<Option<Vec<u8>>, ArchiveError>;

    /// Read a member that a stage cannot do without.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::MemberMissing`] if the member is absent and
    /// [`StageError::Unreadable`] if it cannot be read.
    fn require_member(&mut self, name: &str) -> Result<Vec<u8>, StageError> {
        match self.read_member(name) {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(StageError::MemberMissing {
                member: name.to_owned(),
            }),
            Err(source) => Err(StageError::Unreadable {
                member: name.to_owned(),
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Zip files
// ---------------------------------------------------------------------------

/// An [`ArchiveSource`] backed by a zip container.
pub struct ZipSource<R> {
    inner: ZipArchive<R>,
    member_limit: u64,
}

impl ZipSource<BufReader<File>> {
    /// Open a zip file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if the file cannot be opened or its central
    /// directory cannot be read.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipSource<R> {
    /// Wrap any seekable reader holding a zip container.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Zip`] if the reader does not hold a valid
    /// zip central directory.
    pub fn from_reader(reader: R) -> Result<Self, ArchiveError> {
        Ok(Self {
            inner: ZipArchive::new(reader)?,
            member_limit: MAX_MEMBER_BYTES,
        })
    }

    /// Override the per-member read limit.
    #[must_use]
    pub const fn with_member_limit(mut self, limit: u64) -> Self {
        self.member_limit = limit;
        self
    }
}

impl<R: Read + Seek> ArchiveSource for ZipSource<R> {
    fn member_names(&self) -> Vec<String> {
        self.inner.file_names().map(str::to_owned).collect()
    }

    fn read_member(&mut self, name: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        let mut member = match self.inner.by_name(name) {
            Ok(member) => member,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        member
            .by_ref()
            .take(self.member_limit.saturating_add(1))
            .read_to_end(&mut bytes)?;
        if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > self.member_limit {
            return Err(ArchiveError::MemberTooLarge {
                member: name.to_owned(),
                limit: self.member_limit,
            });
        }
        Ok(Some(bytes))
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// An [`ArchiveSource`] held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    members: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    /// Create an empty archive.
    pub const fn new() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }

    /// Add or replace a member, builder style.
    #[must_use]
    pub fn with_member(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Add or replace a member.
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.members.insert(name.into(), bytes.into());
    }
}

impl ArchiveSource for MemoryArchive {
    fn member_names(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    fn read_member(&mut self, name: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        Ok(self.members.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
        zip_bytes_with(members, SimpleFileOptions::default())
    }

    fn zip_bytes_with(members: &[(&str, &[u8])], options: SimpleFileOptions) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in members {
            assert!(writer.start_file(*name, options).is_ok());
            assert!(writer.write_all(bytes).is_ok());
        }
        writer
            .finish()
            .map(Cursor::into_inner)
            .unwrap_or_default()
    }

    #[test]
    fn zip_source_reads_members() {
        let bytes = zip_bytes(&[("scene.bb8scene", b"{}"), ("bibites/a.bb8", b"[]")]);
        let source = ZipSource::from_reader(Cursor::new(bytes));
        assert!(source.is_ok());
        let mut source = source.unwrap();

        assert_eq!(
            source.member_names(),
            vec!["scene.bb8scene".to_owned(), "bibites/a.bb8".to_owned()]
        );
        assert_eq!(
            source.read_member("bibites/a.bb8").ok().flatten(),
            Some(b"[]".to_vec())
        );
        assert_eq!(source.read_member("missing.json").ok(), Some(None));
    }

    #[test]
    fn zip_source_rejects_garbage() {
        let source = ZipSource::from_reader(Cursor::new(b"not a zip at all".to_vec()));
        assert!(matches!(source, Err(ArchiveError::Zip(_))));
    }

    #[test]
    fn require_member_reports_missing() {
        let mut archive = MemoryArchive::new().with_member("a", "1");
        assert_eq!(archive.require_member("a").ok(), Some(b"1".to_vec()));
        let missing = archive.require_member("b");
        assert!(matches!(missing, Err(StageError::MemberMissing { ref member }) if member == "b"));
    }

    #[test]
    fn oversized_member_is_rejected() {
        let body = vec![b'x'; 2048];
        let bytes = zip_bytes(&[("bibites/big.bb8", &body), ("bibites/small.bb8", b"[]")]);
        let source = ZipSource::from_reader(Cursor::new(bytes));
        assert!(source.is_ok());
        let mut source = source.unwrap().with_member_limit(1024);

        let big = source.read_member("bibites/big.bb8");
        assert!(matches!(
            big,
            Err(ArchiveError::MemberTooLarge { ref member, limit: 1024 })
                if member == "bibites/big.bb8"
        ));
        assert_eq!(
            source.read_member("bibites/small.bb8").ok().flatten(),
            Some(b"[]".to_vec())
        );
    }

    #[test]
    fn forged_zip64_size_does_not_preallocate() {
        let body = vec![b'x'; 4096];
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .large_file(true);
        let mut bytes = zip_bytes_with(&[("bibites/a.bb8", &body)], options);

        // Zip64 extra field: tag 0x0001, length, then the uncompressed size.
        let real = 4096_u64.to_le_bytes();
        let forged = 2_u64.pow(50).to_le_bytes();
        let hits: Vec<usize> = bytes
            .windows(12)
            .enumerate()
            .filter(|(_, w)| w.starts_with(&[0x01, 0x00]) && w.ends_with(&real))
            .map(|(i, _)| i)
            .collect();
        assert!(!hits.is_empty());
        for i in hits {
            if let Some(slot) = bytes.get_mut(i.saturating_add(4)..i.saturating_add(12)) {
                slot.copy_from_slice(&forged);
            }
        }

        // The reader may refuse the forged header; it must not abort on it.
        let read = ZipSource::from_reader(Cursor::new(bytes))
            .ok()
            .and_then(|mut source| source.read_member("bibites/a.bb8").ok().flatten());
        if let Some(read) = read {
            assert!(u64::try_from(read.len()).unwrap_or(u64::MAX) <= MAX_MEMBER_BYTES);
        }
    }
}
