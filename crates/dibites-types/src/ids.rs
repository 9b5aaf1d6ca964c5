//! Identifier types.
//!
//! Species identifiers arrive from several upstream files that disagree on
//! representation: the species catalog writes them as JSON integers while
//! some entity files quote them. [`SpeciesId`] accepts both.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Identity used when an archive's settings do not name the simulation.
pub const DEFAULT_SIMULATION_NAME: &str = "default_sim";

/// Name of one simulation run.
///
/// All tables derived from archives that resolve to the same name accumulate
/// under one storage folder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimulationName(String);

impl SimulationName {
    /// Wrap a simulation name taken from an archive.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the fallback identity.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_SIMULATION_NAME
    }
}

impl Default for SimulationName {
    fn default() -> Self {
        Self(DEFAULT_SIMULATION_NAME.to_owned())
    }
}

impl core::fmt::Display for SimulationName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a species within one simulation's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SpeciesId(pub i64);

impl SpeciesId {
    /// Return the raw integer value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SpeciesId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Wire shapes a species identifier may take.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpeciesId {
    Integer(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for SpeciesId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawSpeciesId::deserialize(deserializer)? {
            RawSpeciesId::Integer(id) => Ok(Self(id)),
            RawSpeciesId::Text(text) => text
                .trim()
                .parse::<i64>()
                .map(Self)
                .map_err(|e| D::Error::custom(format!("invalid species id {text:?}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_id_from_integer() {
        let id: Result<SpeciesId, _> = serde_json::from_str("17");
        assert_eq!(id.ok(), Some(SpeciesId(17)));
    }

    #[test]
    fn species_id_from_quoted_integer() {
        let id: Result<SpeciesId, _> = serde_json::from_str("\" 42\"");
        assert_eq!(id.ok(), Some(SpeciesId(42)));
    }

    #[test]
    fn species_id_rejects_words_and_fractions() {
        assert!(serde_json::from_str::<SpeciesId>("\"alpha\"").is_err());
        assert!(serde_json::from_str::<SpeciesId>("1.5").is_err());
        assert!(serde_json::from_str::<SpeciesId>("null").is_err());
    }

    #[test]
    fn default_simulation_name() {
        let name = SimulationName::default();
        assert!(name.is_default());
        assert_eq!(name.to_string(), "default_sim");
        assert!(!SimulationName::new("Arena").is_default());
    }
}
