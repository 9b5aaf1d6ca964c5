//! Live population tallies from per-entity members.
//!
//! Every living bibite is saved as its own member under `bibites/`. Each one
//! names its species at `genes.speciesID`; this stage counts them. A member
//! that cannot be read or does not name a species is skipped on its own
//! without affecting the rest of the tally.

use std::collections::BTreeMap;

use dibites_types::{PopulationCountRecord, SimulatedTime, SpeciesId};
use serde::Deserialize as _;
use serde_json::Value;
use tracing::{debug, warn};

use crate::archive::ArchiveSource;
use crate::decode::read_sanitized_json;
use crate::error::{Stage, StageError};

/// Directory prefix of entity members, compared case-insensitively.
pub const ENTITY_PREFIX: &str = "bibites/";

/// File suffix of entity members, compared case-insensitively.
pub const ENTITY_SUFFIX: &str = ".bb8";

/// Path of the species id inside an entity member.
pub const ENTITY_SPECIES_FIELD: &str = "genes.speciesID";

/// Whether an archive member holds one living entity.
pub fn is_entity_member(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with(ENTITY_PREFIX) && lower.ends_with(ENTITY_SUFFIX)
}

/// Per-species entity counts for one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationTally {
    counts: BTreeMap<SpeciesId, u64>,
    /// Entity members examined.
    pub scanned: usize,
    /// Entity members skipped because no species id could be read.
    pub skipped: usize,
}

impl PopulationTally {
    /// Count one entity of a species.
    pub fn record(&mut self, species_id: SpeciesId) {
        let count = self.counts.entry(species_id).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Number of distinct species seen.
    pub fn species_count(&self) -> usize {
        self.counts.len()
    }

    /// Count for one species, zero if unseen.
    pub fn count_of(&self, species_id: SpeciesId) -> u64 {
        self.counts.get(&species_id).copied().unwrap_or(0)
    }

    /// One record per distinct species, ordered by species id.
    pub fn records(&self, time: SimulatedTime) -> Vec<PopulationCountRecord> {
        self.counts
            .iter()
            .map(|(&species_id, &count)| PopulationCountRecord {
                time,
                species_id,
                count,
            })
            .collect()
    }
}

/// Tally living entities per species across all entity members.
///
/// Never fails as a whole: unreadable members are logged and skipped, and an
/// archive without entities yields an empty tally.
pub fn tally_population<A: ArchiveSource + ?Sized>(archive: &mut A) -> PopulationTally {
    let mut tally = PopulationTally::default();
    let members: Vec<String> = archive
        .member_names()
        .into_iter()
        .filter(|name| is_entity_member(name))
        .collect();

    for member in members {
        tally.scanned = tally.scanned.saturating_add(1);
        let species = read_sanitized_json(&mut *archive, &member)
            .and_then(|entity| species_of_entity(&entity));
        match species {
            Ok(species_id) => tally.record(species_id),
            Err(e) if e.is_absent() => {
                debug!(
                    stage = %Stage::Population,
                    member = member,
                    error = %e,
                    "entity has no species id, skipping"
                );
                tally.skipped = tally.skipped.saturating_add(1);
            }
            Err(e) => {
                warn!(
                    stage = %Stage::Population,
                    member = member,
                    error = %e,
                    "unreadable entity, skipping"
                );
                tally.skipped = tally.skipped.saturating_add(1);
            }
        }
    }
    tally
}

/// Read the species id of a parsed entity.
///
/// # Errors
///
/// Returns [`StageError::FieldMissing`] if the entity has no species id and
/// [`StageError::FieldInvalid`] if the id is not an integer.
pub fn species_of_entity(entity: &Value) -> Result<SpeciesId, StageError> {
    let raw = entity
        .get("genes")
        .and_then(|genes| genes.get("speciesID"))
        .filter(|value| !value.is_null())
        .ok_or(StageError::FieldMissing {
            field: ENTITY_SPECIES_FIELD,
        })?;
    SpeciesId::deserialize(raw).map_err(|e| StageError::FieldInvalid {
        field: ENTITY_SPECIES_FIELD,
        detail: e.to_string(),
    })
}
