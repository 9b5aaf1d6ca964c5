//! Archive readers and per-stage extractors for Dibites autosave snapshots.
//!
//! An autosave archive is a zip container holding several JSON-ish members.
//! Each member feeds one extraction stage, and every stage reports a typed
//! result so callers can tell a missing member from a malformed one.
//!
//! # Stages
//!
//! | Stage | Member | On failure |
//! |-------|--------|------------|
//! | [`identity`] | `settings.bb8settings` | default simulation name |
//! | [`clock`] | `scene.bb8scene` | `Unknown` time sentinel |
//! | [`species`] | `speciesData.json` | catalog left unchanged |
//! | [`population`] | `bibites/*.bb8` | entity skipped |
//! | [`pellets`] | `pellets.bb8scene` | whole archive discarded |
//!
//! [`extract::extract_archive`] runs all stages against one archive and
//! applies that policy.
//!
//! # Modules
//!
//! - [`archive`] -- Member access over zip files and in-memory maps
//! - [`decode`] -- Lossy decoding and printable-ASCII sanitization
//! - [`error`] -- Stage, archive, and extraction error types

pub mod archive;
pub mod clock;
pub mod decode;
pub mod error;
pub mod extract;
pub mod identity;
pub mod pellets;
pub mod population;
pub mod species;

pub use archive::{ArchiveSource, MAX_MEMBER_BYTES, MemoryArchive, ZipSource};
pub use error::{ArchiveError, ExtractError, Stage, StageError};
pub use extract::{ArchiveExtract, StageFailure, extract_archive, extract_archive_file};
