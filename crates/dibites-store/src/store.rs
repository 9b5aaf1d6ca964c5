//! On-disk layout of the data root.
//!
//! ```text
//! <root>/
//!   processed_zips.txt
//!   <simulation>/
//!     species_data.parquet
//!     species_counts.parquet
//!     pellet_data.parquet
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use dibites_types::{
    DEFAULT_SIMULATION_NAME, PopulationCountRecord, SimulationName, SpeciesRecord,
    ZonePelletRecord,
};
use tracing::{debug, warn};

use crate::catalog::{SPECIES_FILE, SpeciesCatalog};
use crate::counts::{COUNTS_FILE, PopulationSeries};
use crate::datasets::{MergeStats, SimulationDatasets};
use crate::error::StoreError;
use crate::ledger::{LEDGER_FILE, ProcessedLedger};
use crate::pellets::{PELLETS_FILE, PelletSeries};
use crate::summary::DatasetSummary;
use crate::table::{read_batches, write_batch};

/// Characters kept verbatim in a simulation folder name.
const FOLDER_PUNCTUATION: &[char] = &[' ', '-', '_', '.', '(', ')'];

/// Handle on the data root holding every simulation's tables.
#[derive(Debug, Clone)]
pub struct SimulationStore {
    root: PathBuf,
}

impl SimulationStore {
    /// Create a store rooted at `root`. Nothing is touched on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the processed-archive ledger.
    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    /// Load the processed-archive ledger.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the ledger exists but cannot be read.
    pub fn load_ledger(&self) -> Result<ProcessedLedger, StoreError> {
        ProcessedLedger::load(self.ledger_path())
    }

    /// Folder name used for a simulation.
    ///
    /// Simulation names come from archive contents, so anything outside
    /// letters, digits, and a little punctuation is replaced with `_`, and
    /// leading or trailing dots are dropped. A name with nothing left maps
    /// to the default simulation. A name that had to be altered gets a
    /// hash of the original appended, so `a/b` and `a:b` stay apart.
    pub fn folder_name(name: &SimulationName) -> String {
        let replaced: String = name
            .as_str()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || FOLDER_PUNCTUATION.contains(&c) {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let trimmed = replaced.trim().trim_matches('.');
        if trimmed.is_empty() {
            DEFAULT_SIMULATION_NAME.to_owned()
        } else if trimmed == name.as_str() {
            trimmed.to_owned()
        } else {
            format!("{trimmed}-{:08x}", fnv1a(name.as_str().as_bytes()))
        }
    }

    /// Folder holding a simulation's tables.
    pub fn simulation_dir(&self, name: &SimulationName) -> PathBuf {
        self.root.join(Self::folder_name(name))
    }

    /// Load a simulation's tables. Missing files are empty tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a table exists but cannot be read or does
    /// not have the expected schema.
    pub fn load(&self, name: &SimulationName) -> Result<SimulationDatasets, StoreError> {
        let dir = self.simulation_dir(name);
        Ok(SimulationDatasets {
            catalog: load_table(&dir.join(SPECIES_FILE), SpeciesCatalog::from_batches)?
                .unwrap_or_default(),
            population: load_table(&dir.join(COUNTS_FILE), PopulationSeries::from_batches)?
                .unwrap_or_default(),
            pellets: load_table(&dir.join(PELLETS_FILE), PelletSeries::from_batches)?
                .unwrap_or_default(),
        })
    }

    /// Write all three tables of a simulation in full.
    ///
    /// Tables are written catalog first, then population, then pellets.
    /// Each file is replaced atomically; the three together are not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on the first table that cannot be written.
    pub fn save(
        &self,
        name: &SimulationName,
        datasets: &SimulationDatasets,
    ) -> Result<(), StoreError> {
        let dir = self.simulation_dir(name);

        let path = dir.join(SPECIES_FILE);
        write_batch(&path, &datasets.catalog.to_batch(&path)?)?;
        let path = dir.join(COUNTS_FILE);
        write_batch(&path, &datasets.population.to_batch(&path)?)?;
        let path = dir.join(PELLETS_FILE);
        write_batch(&path, &datasets.pellets.to_batch(&path)?)?;

        debug!(
            simulation = %name,
            dir = %dir.display(),
            species = datasets.catalog.len(),
            count_rows = datasets.population.len(),
            pellet_rows = datasets.pellets.len(),
            "Tables written"
        );
        Ok(())
    }

    /// Load, merge one archive's output, and save.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the existing tables cannot be read or the
    /// merged tables cannot be written. Nothing is written if loading fails.
    pub fn ingest(
        &self,
        name: &SimulationName,
        species: Vec<SpeciesRecord>,
        population: Vec<PopulationCountRecord>,
        pellets: Vec<ZonePelletRecord>,
    ) -> Result<MergeStats, StoreError> {
        let mut datasets = self.load(name)?;
        let stats = datasets.merge(species, population, pellets);
        self.save(name, &datasets)?;
        Ok(stats)
    }

    /// Summarize a simulation, treating unreadable tables as empty.
    pub fn summary(&self, name: &SimulationName) -> DatasetSummary {
        let dir = self.simulation_dir(name);
        let datasets = SimulationDatasets {
            catalog: load_lenient(&dir.join(SPECIES_FILE), SpeciesCatalog::from_batches),
            population: load_lenient(&dir.join(COUNTS_FILE), PopulationSeries::from_batches),
            pellets: load_lenient(&dir.join(PELLETS_FILE), PelletSeries::from_batches),
        };
        DatasetSummary::from_datasets(&datasets)
    }

    /// Folder names of every simulation with at least one table, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the data root exists but cannot be
    /// listed.
    pub fn list_simulations(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let dir = entry.path();
            let has_table = [SPECIES_FILE, COUNTS_FILE, PELLETS_FILE]
                .iter()
                .any(|file| dir.join(file).is_file());
            if has_table {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// 32-bit FNV-1a. Stable across platforms and releases, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0x811c_9dc5, |hash, &b| (hash ^ u32::from(b)).wrapping_mul(0x0100_0193))
}

type Parse<T> = fn(&[RecordBatch], &Path) -> Result<T, StoreError>;

fn load_table<T>(path: &Path, parse: Parse<T>) -> Result<Option<T>, StoreError> {
    read_batches(path)?
        .map(|batches| parse(&batches, path))
        .transpose()
}

fn load_lenient<T: Default>(path: &Path, parse: Parse<T>) -> T {
    match load_table(path, parse) {
        Ok(table) => table.unwrap_or_default(),
        Err(e) => {
            warn!(table = %path.display(), error = %e, "Unreadable table treated as empty");
            T::default()
        }
    }
}
