//! Species descriptions from the species data member.
//!
//! Unlike the other members, `speciesData.json` is written as well-formed
//! JSON and is parsed as-is. This stage only collects the descriptions in the
//! archive; folding them into the persisted catalog (first write wins) is
//! done by the store.

use std::collections::BTreeSet;

use dibites_types::SpeciesRecord;
use serde_json::Value;
use tracing::{debug, warn};

use crate::archive::ArchiveSource;
use crate::error::{Stage, StageError};
use crate::identity::json_kind;

/// Member holding recorded species descriptions.
pub const SPECIES_MEMBER: &str = "speciesData.json";

/// Field of the species data holding the description list.
pub const RECORDED_SPECIES_FIELD: &str = "recordedSpecies";

/// Species descriptions collected from one archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeciesBatch {
    /// Distinct descriptions in archive order; the first of any duplicate id
    /// is kept.
    pub records: Vec<SpeciesRecord>,
    /// Entries that did not describe a species and were skipped.
    pub skipped: usize,
}

/// Collect species descriptions from an archive.
///
/// # Errors
///
/// Returns [`StageError`] if the member is missing or unparseable, or lacks
/// the description list. Callers leave the catalog unchanged in that case.
pub fn extract_species<A: ArchiveSource + ?Sized>(
    archive: &mut A,
) -> Result<SpeciesBatch, StageError> {
    let bytes = archive.require_member(SPECIES_MEMBER)?;
    let data: Value = serde_json::from_slice(&bytes).map_err(|source| StageError::Json {
        member: SPECIES_MEMBER.to_owned(),
        source,
    })?;
    species_from_data(data)
}

/// Collect species descriptions from parsed species data.
///
/// # Errors
///
/// See [`extract_species`].
pub fn species_from_data(data: Value) -> Result<SpeciesBatch, StageError> {
    let mut data = match data {
        Value::Object(map) => map,
        other => {
            return Err(StageError::FieldInvalid {
                field: RECORDED_SPECIES_FIELD,
                detail: format!("species data is {}, not an object", json_kind(&other)),
            });
        }
    };

    let entries = match data.remove(RECORDED_SPECIES_FIELD) {
        None | Some(Value::Null) => {
            return Err(StageError::FieldMissing {
                field: RECORDED_SPECIES_FIELD,
            });
        }
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(StageError::FieldInvalid {
                field: RECORDED_SPECIES_FIELD,
                detail: format!("expected a list, got {}", json_kind(&other)),
            });
        }
    };

    let mut batch = SpeciesBatch::default();
    let mut seen = BTreeSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<SpeciesRecord>(entry) {
            Ok(record) => {
                if seen.insert(record.species_id) {
                    batch.records.push(record);
                } else {
                    debug!(
                        stage = %Stage::Species,
                        index = index,
                        species_id = %record.species_id,
                        "duplicate species entry in archive, keeping the first"
                    );
                }
            }
            Err(e) => {
                warn!(
                    stage = %Stage::Species,
                    index = index,
                    error = %e,
                    "skipping unusable species entry"
                );
                batch.skipped = batch.skipped.saturating_add(1);
            }
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use dibites_types::SpeciesId;
    use serde_json::json;

    use super::*;
    use crate::archive::MemoryArchive;

    #[test]
    fn collects_recorded_species() {
        let data = json!({
            "recordedSpecies": [
                {"speciesID": 1, "genericName": "Primus", "parentID": null},
                {"speciesID": 2, "genericName": "Secundus", "parentID": 1}
            ]
        });
        let mut archive = MemoryArchive::new().with_member(SPECIES_MEMBER, data.to_string());
        let batch = extract_species(&mut archive);
        assert!(batch.is_ok());
        let batch = batch.ok().unwrap_or_default();

        let ids: Vec<SpeciesId> = batch.records.iter().map(|r| r.species_id).collect();
        assert_eq!(ids, vec![SpeciesId(1), SpeciesId(2)]);
        assert_eq!(batch.skipped, 0);
    }

    #[test]
    fn first_duplicate_in_archive_wins() {
        let data = json!({
            "recordedSpecies": [
                {"speciesID": 5, "genericName": "Early"},
                {"speciesID": 5, "genericName": "Late"}
            ]
        });
        let batch = species_from_data(data).ok().unwrap_or_default();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(
            batch.records.first().and_then(|r| r.generic_name.as_deref()),
            Some("Early")
        );
    }

    #[test]
    fn unusable_entries_are_skipped() {
        let data = json!({
            "recordedSpecies": [
                {"speciesID": 1},
                {"genericName": "No id"},
                "not an object",
                {"speciesID": "seven"}
            ]
        });
        let batch = species_from_data(data).ok().unwrap_or_default();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.skipped, 3);
    }

    #[test]
    fn missing_list_is_absent() {
        let err = species_from_data(json!({"other": []})).err();
        assert!(err.is_some_and(|e| e.is_absent()));
    }

    #[test]
    fn non_list_is_malformed() {
        let err = species_from_data(json!({"recordedSpecies": 4})).err();
        assert!(matches!(err, Some(StageError::FieldInvalid { .. })));

        let err = species_from_data(json!([1, 2])).err();
        assert!(matches!(err, Some(StageError::FieldInvalid { .. })));
    }

    #[test]
    fn species_member_is_not_sanitized() {
        // A control byte inside the document is a parse error here, unlike
        // the sanitized members.
        let mut archive = MemoryArchive::new()
            .with_member(SPECIES_MEMBER, b"{\"recordedSpecies\": [\x01]}".to_vec());
        let err = extract_species(&mut archive).err();
        assert!(matches!(err, Some(StageError::Json { .. })));
    }

    #[test]
    fn missing_member_is_absent() {
        let err = extract_species(&mut MemoryArchive::new()).err();
        assert!(err.is_some_and(|e| e.is_absent()));
    }
}
