//! Rows of the three per-simulation tables.
//!
//! | Table | Row type | Merge rule |
//! |-------|----------|------------|
//! | Species catalog | [`SpeciesRecord`] | keyed by species id, first write wins |
//! | Population counts | [`PopulationCountRecord`] | append-only |
//! | Zone pellets | [`ZonePelletRecord`] | append-only |

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ids::SpeciesId;
use crate::time::SimulatedTime;

// ---------------------------------------------------------------------------
// Species catalog
// ---------------------------------------------------------------------------

/// One species as described by the simulation's species data file.
///
/// Field names follow the upstream JSON. Fields the pipeline does not
/// interpret are kept verbatim in [`attributes`](Self::attributes) so the
/// persisted catalog loses nothing the simulation recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    /// Catalog key.
    #[serde(rename = "speciesID")]
    pub species_id: SpeciesId,

    /// Genus-like display name.
    #[serde(rename = "genericName", default)]
    pub generic_name: Option<String>,

    /// Species-like display name.
    #[serde(rename = "specificName", default)]
    pub specific_name: Option<String>,

    /// Species this one branched from. Root species have none.
    #[serde(rename = "parentID", default)]
    pub parent_id: Option<SpeciesId>,

    /// Genome shared by members of the species at the time it was recorded.
    #[serde(default)]
    pub template: GenomeTemplate,

    /// Every other upstream field, untouched.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Genome template nested inside a species description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenomeTemplate {
    /// Gene name to value. Non-numeric entries are dropped on read.
    #[serde(default, deserialize_with = "numeric_genes")]
    pub genes: BTreeMap<String, f64>,

    /// Neural network nodes, kept as opaque objects.
    #[serde(default)]
    pub nodes: Vec<Value>,

    /// Neural network synapses, kept as opaque objects.
    #[serde(default)]
    pub synapses: Vec<Value>,

    /// Any other template fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn numeric_genes<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(gene, value)| value.as_f64().map(|v| (gene, v)))
        .collect())
}

// ---------------------------------------------------------------------------
// Population counts
// ---------------------------------------------------------------------------

/// Number of live entities of one species at one simulated time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationCountRecord {
    /// Simulated time of the archive the tally came from.
    pub time: SimulatedTime,
    /// Species tallied.
    pub species_id: SpeciesId,
    /// Live entities of that species.
    pub count: u64,
}

// ---------------------------------------------------------------------------
// Zone pellets
// ---------------------------------------------------------------------------

/// The two resource categories pellets are partitioned into.
///
/// This is a deliberate binary split: anything not made of meat counts as
/// plant matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PelletCategory {
    /// Plant pellets and every unrecognized material.
    Plant,
    /// Pellets whose material is exactly `Meat`.
    Meat,
}

impl PelletCategory {
    /// Material literal that selects [`PelletCategory::Meat`].
    pub const MEAT_MATERIAL: &'static str = "Meat";

    /// Classify a pellet by its material field.
    pub fn classify(material: Option<&str>) -> Self {
        if material == Some(Self::MEAT_MATERIAL) {
            Self::Meat
        } else {
            Self::Plant
        }
    }
}

/// Aggregate of one pellet category inside one zone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PelletTotals {
    /// Number of pellets observed.
    pub pellet_count: u64,
    /// Sum of pellet amounts.
    pub total_amount: f64,
    /// Mean pellet scale, `0.0` when no pellets were observed.
    pub avg_scale: f64,
}

impl PelletTotals {
    /// Build totals from running sums, guarding the empty case.
    #[allow(clippy::cast_precision_loss)] // pellet counts stay far below 2^52
    pub fn from_sums(pellet_count: u64, total_amount: f64, scale_sum: f64) -> Self {
        let avg_scale = if pellet_count == 0 {
            0.0
        } else {
            scale_sum / pellet_count as f64
        };
        Self {
            pellet_count,
            total_amount,
            avg_scale,
        }
    }
}

/// Pellet aggregates for one zone at one simulated time.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePelletRecord {
    /// Simulated time of the archive the zone came from.
    pub time: SimulatedTime,
    /// Zone name as written by the simulation.
    pub zone_name: String,
    /// Plant pellet aggregates.
    pub plant: PelletTotals,
    /// Meat pellet aggregates.
    pub meat: PelletTotals,
}

impl ZonePelletRecord {
    /// Total pellets observed in the zone across both categories.
    pub const fn total_pellets(&self) -> u64 {
        self.plant.pellet_count.saturating_add(self.meat.pellet_count)
    }
}
