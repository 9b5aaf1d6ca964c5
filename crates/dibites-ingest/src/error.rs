//! Error types for archive access and extraction.
//!
//! [`StageError`] separates "the data was not there" from "the data was
//! there but unusable" via [`StageError::is_absent`]. Both lead to the same
//! fallback, but the distinction is logged and asserted on in tests.

/// The extraction stages, used as log and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Simulation name from the settings member.
    Identity,
    /// Simulated time from the scene member.
    SimulatedTime,
    /// Species catalog entries from the species data member.
    Species,
    /// Per-species tallies from the entity members.
    Population,
    /// Zone pellet aggregates from the pellets member.
    Pellets,
}

impl Stage {
    /// Stable lowercase name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::SimulatedTime => "simulated_time",
            Self::Species => "species",
            Self::Population => "population",
            Self::Pellets => "pellets",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while reading the archive container itself.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The zip container is unreadable.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Reading the archive file or a member stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A member inflated past the per-member read limit.
    #[error("member {member} exceeds {limit} bytes")]
    MemberTooLarge {
        /// Name of the member.
        member: String,
        /// The limit in bytes.
        limit: u64,
    },
}

/// Why a single stage could not produce its value.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The archive has no member with this name.
    #[error("member {member} not found in archive")]
    MemberMissing {
        /// Name of the missing member.
        member: String,
    },

    /// The member exists but could not be read out of the container.
    #[error("failed to read member {member}: {source}")]
    Unreadable {
        /// Name of the member.
        member: String,
        /// The underlying container error.
        source: ArchiveError,
    },

    /// The member's text is not valid JSON.
    #[error("member {member} is not valid JSON: {source}")]
    Json {
        /// Name of the member.
        member: String,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// A required field is absent or null.
    #[error("required field {field} is missing")]
    FieldMissing {
        /// Path of the field.
        field: &'static str,
    },

    /// A required field is present but has the wrong shape.
    #[error("field {field} is malformed: {detail}")]
    FieldInvalid {
        /// Path of the field.
        field: &'static str,
        /// What was wrong with it.
        detail: String,
    },
}

impl StageError {
    /// Whether the failure means "not present" rather than "present but bad".
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::MemberMissing { .. } | Self::FieldMissing { .. })
    }
}

/// Failures that stop an archive from producing any output.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The file is not a readable zip container (possibly still being written).
    #[error("failed to open archive {archive}: {source}")]
    Open {
        /// Archive identifier.
        archive: String,
        /// The underlying container error.
        source: ArchiveError,
    },

    /// The pellet stage failed, so nothing from this archive may be persisted.
    #[error("pellet stage failed for archive {archive}: {source}")]
    PelletsFailed {
        /// Archive identifier.
        archive: String,
        /// The underlying stage error.
        source: StageError,
    },
}
