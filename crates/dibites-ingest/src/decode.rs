//! Lossy decoding for simulation-written members.
//!
//! The simulation occasionally writes stray bytes (encoding artifacts, BOMs,
//! control characters) into otherwise-JSON files. Before parsing, member bytes
//! are decoded as UTF-8 with undecodable sequences dropped, and every
//! character outside printable ASCII (`0x20..=0x7E`) is removed. This trades
//! byte fidelity for parse success: non-ASCII text inside string values is
//! lost, and so are tabs and newlines, which JSON does not need.

use std::ops::RangeInclusive;

use serde_json::Value;

use crate::archive::ArchiveSource;
use crate::error::StageError;

/// Characters kept by [`sanitize`].
pub const PRINTABLE_ASCII: RangeInclusive<char> = ' '..='~';

/// Decode bytes leniently and strip everything but printable ASCII.
pub fn sanitize(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| PRINTABLE_ASCII.contains(c))
        .collect()
}

/// Sanitize then parse as JSON.
///
/// # Errors
///
/// Returns the parser error if the sanitized text is not valid JSON.
pub fn parse_sanitized(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&sanitize(bytes))
}

/// Read a member, sanitize it, and parse it as JSON.
///
/// # Errors
///
/// Returns [`StageError::MemberMissing`], [`StageError::Unreadable`], or
/// [`StageError::Json`].
pub fn read_sanitized_json<A: ArchiveSource + ?Sized>(
    archive: &mut A,
    member: &str,
) -> Result<Value, StageError> {
    let bytes = archive.require_member(member)?;
    parse_sanitized(&bytes).map_err(|source| StageError::Json {
        member: member.to_owned(),
        source,
    })
}
