//! Zone pellet aggregates from the pellets member.
//!
//! The member lists the simulation's zones, each with the pellets currently
//! lying in it. Pellets are split into meat and plant (everything that is not
//! meat), and per zone the count, total amount, and mean scale of each
//! category are recorded.
//!
//! This stage is strict. Any defect in the member fails the stage, and the
//! caller then discards everything else extracted from the same archive.

use dibites_types::{PelletCategory, PelletTotals, SimulatedTime, ZonePelletRecord};
use serde::Deserialize;
use serde_json::Value;

use crate::archive::ArchiveSource;
use crate::decode::read_sanitized_json;
use crate::error::StageError;
use crate::identity::json_kind;

/// Member holding zone pellet state.
pub const PELLETS_MEMBER: &str = "pellets.bb8scene";

/// One zone as written by the simulation.
#[derive(Debug, Deserialize)]
struct ZoneDoc {
    name: String,
    pellets: Vec<PelletDoc>,
}

/// One pellet as written by the simulation.
#[derive(Debug, Deserialize)]
struct PelletDoc {
    #[serde(default)]
    material: Option<String>,
    amount: f64,
    scale: f64,
}

/// Running sums for one category in one zone.
#[derive(Debug, Clone, Copy, Default)]
struct CategorySums {
    count: u64,
    amount: f64,
    scale: f64,
}

impl CategorySums {
    fn add(&mut self, pellet: &PelletDoc) {
        self.count = self.count.saturating_add(1);
        self.amount += pellet.amount;
        self.scale += pellet.scale;
    }

    fn totals(self) -> PelletTotals {
        PelletTotals::from_sums(self.count, self.amount, self.scale)
    }
}

/// Aggregate the pellets member of an archive.
///
/// # Errors
///
/// Returns [`StageError`] if the member is missing or unparseable, is not a
/// zone list, or holds a zone or pellet with missing or invalid fields.
pub fn extract_pellets<A: ArchiveSource + ?Sized>(
    archive: &mut A,
    time: SimulatedTime,
) -> Result<Vec<ZonePelletRecord>, StageError> {
    let document = read_sanitized_json(archive, PELLETS_MEMBER)?;
    pellets_from_document(document, time)
}

/// Aggregate a parsed pellets document.
///
/// The document is either the zone list itself or an object holding it under
/// `zones`.
///
/// # Errors
///
/// See [`extract_pellets`].
pub fn pellets_from_document(
    document: Value,
    time: SimulatedTime,
) -> Result<Vec<ZonePelletRecord>, StageError> {
    let zones = match document {
        Value::Array(zones) => zones,
        Value::Object(mut wrapper) => match wrapper.remove("zones") {
            Some(Value::Array(zones)) => zones,
            None | Some(Value::Null) => return Err(StageError::FieldMissing { field: "zones" }),
            Some(other) => {
                return Err(StageError::FieldInvalid {
                    field: "zones",
                    detail: format!("expected a list, got {}", json_kind(&other)),
                });
            }
        },
        other => {
            return Err(StageError::FieldInvalid {
                field: "zones",
                detail: format!("pellets document is {}", json_kind(&other)),
            });
        }
    };

    zones
        .into_iter()
        .enumerate()
        .map(|(index, zone)| {
            let zone = ZoneDoc::deserialize(zone).map_err(|e| StageError::FieldInvalid {
                field: "zones",
                detail: format!("zone {index}: {e}"),
            })?;
            aggregate_zone(&zone, time)
        })
        .collect()
}

fn aggregate_zone(zone: &ZoneDoc, time: SimulatedTime) -> Result<ZonePelletRecord, StageError> {
    let mut plant = CategorySums::default();
    let mut meat = CategorySums::default();

    for (index, pellet) in zone.pellets.iter().enumerate() {
        if !(pellet.amount.is_finite() && pellet.amount >= 0.0) {
            return Err(StageError::FieldInvalid {
                field: "pellets.amount",
                detail: format!(
                    "zone {:?} pellet {index} has amount {}",
                    zone.name, pellet.amount
                ),
            });
        }
        if !pellet.scale.is_finite() {
            return Err(StageError::FieldInvalid {
                field: "pellets.scale",
                detail: format!(
                    "zone {:?} pellet {index} has scale {}",
                    zone.name, pellet.scale
                ),
            });
        }
        match PelletCategory::classify(pellet.material.as_deref()) {
            PelletCategory::Plant => plant.add(pellet),
            PelletCategory::Meat => meat.add(pellet),
        }
    }

    Ok(ZonePelletRecord {
        time,
        zone_name: zone.name.clone(),
        plant: plant.totals(),
        meat: meat.totals(),
    })
}
