//! Simulated time from the scene member.

use serde_json::Value;

use crate::archive::ArchiveSource;
use crate::decode::read_sanitized_json;
use crate::error::StageError;
use crate::identity::json_kind;

/// Member holding the scene state.
pub const SCENE_MEMBER: &str = "scene.bb8scene";

/// Field of the scene holding elapsed simulated seconds.
pub const SIMULATED_TIME_FIELD: &str = "simulatedTime";

/// Read the simulated time of an archive.
///
/// # Errors
///
/// Returns [`StageError`] if the scene member is missing, unparseable, or has
/// no numeric `simulatedTime`. Callers then tag the archive's rows with
/// [`SimulatedTime::Unknown`](dibites_types::SimulatedTime::Unknown).
pub fn extract_simulated_time<A: ArchiveSource + ?Sized>(
    archive: &mut A,
) -> Result<f64, StageError> {
    let scene = read_sanitized_json(archive, SCENE_MEMBER)?;
    simulated_time_from_scene(&scene)
}

/// Read the simulated time from a parsed scene.
///
/// # Errors
///
/// See [`extract_simulated_time`].
pub fn simulated_time_from_scene(scene: &Value) -> Result<f64, StageError> {
    match scene.get(SIMULATED_TIME_FIELD) {
        None | Some(Value::Null) => Err(StageError::FieldMissing {
            field: SIMULATED_TIME_FIELD,
        }),
        Some(value) => value.as_f64().ok_or_else(|| StageError::FieldInvalid {
            field: SIMULATED_TIME_FIELD,
            detail: format!("expected a number, got {}", json_kind(value)),
        }),
    }
}
