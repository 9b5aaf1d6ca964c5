//! Shared record types for the Dibites snapshot ingestion pipeline.
//!
//! Every crate in the workspace speaks in these types: the extractors in
//! `dibites-ingest` produce them from autosave archives, and `dibites-store`
//! persists them into the per-simulation tables.
//!
//! # Modules
//!
//! - [`ids`] -- Simulation and species identifiers
//! - [`time`] -- The simulated clock value attached to every time-series row
//! - [`records`] -- Species catalog, population count, and zone pellet rows

pub mod ids;
pub mod records;
pub mod time;

// Re-export all public types at crate root for convenience.
pub use ids::{DEFAULT_SIMULATION_NAME, SimulationName, SpeciesId};
pub use records::{
    GenomeTemplate, PelletCategory, PelletTotals, PopulationCountRecord, SpeciesRecord,
    ZonePelletRecord,
};
pub use time::SimulatedTime;
