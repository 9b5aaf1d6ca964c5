//! Simulation identity from the settings member.
//!
//! The simulation does not store a run name; the name of its first zone is
//! the closest stable label and is what the tables are grouped by.

use dibites_types::SimulationName;
use serde_json::Value;

use crate::archive::ArchiveSource;
use crate::decode::read_sanitized_json;
use crate::error::StageError;

/// Member holding the simulation settings.
pub const SETTINGS_MEMBER: &str = "settings.bb8settings";

/// Resolve the simulation name of an archive.
///
/// # Errors
///
/// Returns [`StageError`] if the settings member is missing, unparseable, or
/// has no usable first zone name. Callers fall back to
/// [`SimulationName::default`].
pub fn extract_simulation_name<A: ArchiveSource + ?Sized>(
    archive: &mut A,
) -> Result<SimulationName, StageError> {
    let settings = read_sanitized_json(archive, SETTINGS_MEMBER)?;
    simulation_name_from_settings(&settings)
}

/// Resolve the simulation name from parsed settings.
///
/// # Errors
///
/// See [`extract_simulation_name`].
pub fn simulation_name_from_settings(settings: &Value) -> Result<SimulationName, StageError> {
    let zones = match settings.get("zones") {
        None | Some(Value::Null) => return Err(StageError::FieldMissing { field: "zones" }),
        Some(Value::Array(zones)) => zones,
        Some(other) => {
            return Err(StageError::FieldInvalid {
                field: "zones",
                detail: format!("expected a list, got {}", json_kind(other)),
            });
        }
    };

    let first = zones
        .first()
        .ok_or(StageError::FieldMissing { field: "zones[0]" })?;

    match first.get("name") {
        None | Some(Value::Null) => Err(StageError::FieldMissing {
            field: "zones[0].name",
        }),
        Some(Value::String(name)) if !name.trim().is_empty() => {
            Ok(SimulationName::new(name.clone()))
        }
        Some(other) => Err(StageError::FieldInvalid {
            field: "zones[0].name",
            detail: format!("expected a non-empty string, got {other}"),
        }),
    }
}

/// Short description of a JSON value's type for error messages.
pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::archive::MemoryArchive;

    #[test]
    fn first_zone_names_the_simulation() {
        let mut archive = MemoryArchive::new().with_member(
            SETTINGS_MEMBER,
            "\u{feff}{\"zones\": [{\"name\": \"Arena\"}, {\"name\": \"North\"}]}\r\n",
        );
        let name = extract_simulation_name(&mut archive);
        assert_eq!(name.ok(), Some(SimulationName::new("Arena")));
    }

    #[test]
    fn missing_member_is_absent() {
        let mut archive = MemoryArchive::new();
        let err = extract_simulation_name(&mut archive).err();
        assert!(err.is_some_and(|e| e.is_absent()));
    }

    #[test]
    fn corrupt_member_is_malformed() {
        let mut archive = MemoryArchive::new().with_member(SETTINGS_MEMBER, "{\"zones\": [");
        let err = extract_simulation_name(&mut archive).err();
        assert!(matches!(err, Some(StageError::Json { .. })));
    }

    #[test]
    fn empty_zone_list_is_absent() {
        let err = simulation_name_from_settings(&json!({"zones": []})).err();
        assert!(err.is_some_and(|e| e.is_absent()));
    }

    #[test]
    fn non_list_zones_is_malformed() {
        let err = simulation_name_from_settings(&json!({"zones": {"name": "Arena"}})).err();
        assert!(matches!(
            err,
            Some(StageError::FieldInvalid { field: "zones", .. })
        ));
    }

    #[test]
    fn blank_or_numeric_name_is_malformed() {
        let blank = simulation_name_from_settings(&json!({"zones": [{"name": "  "}]}));
        assert!(matches!(blank, Err(StageError::FieldInvalid { .. })));

        let numeric = simulation_name_from_settings(&json!({"zones": [{"name": 3}]}));
        assert!(matches!(numeric, Err(StageError::FieldInvalid { .. })));
    }

    #[test]
    fn unnamed_first_zone_is_absent() {
        let err = simulation_name_from_settings(&json!({"zones": [{"size": 10}]})).err();
        assert!(matches!(
            err,
            Some(StageError::FieldMissing {
                field: "zones[0].name"
            })
        ));
    }
}
