//! Durable per-simulation tables for Dibites snapshot ingestion.
//!
//! Each simulation owns three Parquet tables under its own folder in the
//! data root:
//!
//! | Table | File | Merge rule |
//! |-------|------|------------|
//! | Species catalog | `species_data.parquet` | union by `speciesID`, first write wins |
//! | Population counts | `species_counts.parquet` | append |
//! | Zone pellets | `pellet_data.parquet` | append |
//!
//! Merging loads the existing tables, folds in one archive's output, and
//! rewrites every table in full. The processed-archive ledger
//! (`processed_zips.txt`) sits at the root of the data folder.

pub mod catalog;
pub mod counts;
pub mod datasets;
pub mod error;
pub mod ledger;
pub mod pellets;
pub mod store;
pub mod summary;
mod table;

pub use catalog::SpeciesCatalog;
pub use counts::PopulationSeries;
pub use datasets::{MergeStats, SimulationDatasets};
pub use error::StoreError;
pub use ledger::ProcessedLedger;
pub use pellets::PelletSeries;
pub use store::SimulationStore;
pub use summary::DatasetSummary;
