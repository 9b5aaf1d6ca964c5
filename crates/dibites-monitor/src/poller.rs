//! One pass over the watched folder.
//!
//! A pass lists archives, skips those already in the ledger, and for each
//! new one runs extraction and folds the result into the tables of the
//! simulation it belongs to. The ledger is written once at the end of the
//! pass.
//!
//! | Outcome | Tables | Ledger |
//! |---------|--------|--------|
//! | Ingested | written | marked |
//! | Discarded (pellet stage failed) | untouched | marked |
//! | Deferred (unreadable zip, storage error) | untouched or partial | not marked |
//!
//! Deferred archives are retried on the next pass. A zip that fails to open
//! is often still being written by the simulation.

use dibites_ingest::{ExtractError, extract_archive_file};
use dibites_store::{MergeStats, ProcessedLedger, SimulationStore};
use tracing::{debug, error, info, warn};

use crate::config::IngestSettings;
use crate::discovery::{DiscoveredArchive, discover_archives};
use crate::error::MonitorError;

/// What happened to one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Tables updated.
    Ingested(MergeStats),
    /// Nothing persisted; never retried.
    Discarded,
    /// Nothing marked; retried next pass.
    Deferred,
}

/// Tallies for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Archives found in the folder.
    pub discovered: usize,
    /// Archives already in the ledger.
    pub skipped: usize,
    /// Archives folded into tables.
    pub ingested: usize,
    /// Archives whose output was thrown away.
    pub discarded: usize,
    /// Archives left for the next pass.
    pub failed: usize,
    /// Species newly cataloged across ingested archives.
    pub species_added: usize,
    /// Population rows appended across ingested archives.
    pub count_rows: usize,
    /// Pellet rows appended across ingested archives.
    pub pellet_rows: usize,
}

impl PassReport {
    /// Archives newly recorded in the ledger by this pass.
    pub const fn marked(&self) -> usize {
        self.ingested.saturating_add(self.discarded)
    }

    fn record(&mut self, outcome: ArchiveOutcome) {
        let slot = match outcome {
            ArchiveOutcome::Ingested(stats) => {
                self.species_added = self.species_added.saturating_add(stats.species_added);
                self.count_rows = self.count_rows.saturating_add(stats.count_rows);
                self.pellet_rows = self.pellet_rows.saturating_add(stats.pellet_rows);
                &mut self.ingested
            }
            ArchiveOutcome::Discarded => &mut self.discarded,
            ArchiveOutcome::Deferred => &mut self.failed,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Drives passes over the watched folder.
pub struct Poller {
    settings: IngestSettings,
    store: SimulationStore,
    ledger: ProcessedLedger,
}

impl Poller {
    /// Build a poller and load the ledger from the data root.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Store`] if the ledger exists but cannot be
    /// read.
    pub fn new(settings: IngestSettings) -> Result<Self, MonitorError> {
        let store = SimulationStore::new(&settings.data_dir);
        let ledger = store.load_ledger()?;
        info!(
            ledger = %ledger.path().display(),
            processed = ledger.len(),
            "Ledger loaded"
        );
        Ok(Self {
            settings,
            store,
            ledger,
        })
    }

    /// The settings this poller runs with.
    pub const fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// The in-memory ledger.
    pub const fn ledger(&self) -> &ProcessedLedger {
        &self.ledger
    }

    /// Run one pass over the watched folder.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Discovery`] if the folder cannot be listed
    /// and [`MonitorError::Store`] if the ledger cannot be written. Marks
    /// made before a failed ledger write stay in memory and are written by
    /// the next pass.
    pub fn run_pass(&mut self) -> Result<PassReport, MonitorError> {
        let archives =
            discover_archives(&self.settings.autosave_dir, &self.settings.archive_extension)
                .map_err(|source| MonitorError::Discovery {
                    path: self.settings.autosave_dir.clone(),
                    source,
                })?;

        let mut report = PassReport {
            discovered: archives.len(),
            ..PassReport::default()
        };
        for archive in &archives {
            if self.ledger.contains(&archive.archive_id) {
                report.skipped = report.skipped.saturating_add(1);
                continue;
            }
            let outcome = self.process(archive);
            if !matches!(outcome, ArchiveOutcome::Deferred) {
                self.ledger.mark(archive.archive_id.clone());
            }
            report.record(outcome);
        }

        self.ledger.persist()?;
        Ok(report)
    }

    /// Extract one archive and fold it into its simulation's tables.
    pub fn process(&self, archive: &DiscoveredArchive) -> ArchiveOutcome {
        let id = archive.archive_id.as_str();
        debug!(archive = id, "Processing archive");

        let extract = match extract_archive_file(&archive.path) {
            Ok(extract) => extract,
            Err(e @ ExtractError::PelletsFailed { .. }) => {
                warn!(archive = id, stage = "pellets", error = %e, "Archive discarded");
                return ArchiveOutcome::Discarded;
            }
            Err(e @ ExtractError::Open { .. }) => {
                warn!(
                    archive = id,
                    stage = "open",
                    error = %e,
                    "Archive unreadable, will retry"
                );
                return ArchiveOutcome::Deferred;
            }
        };

        let simulation = extract.simulation;
        let time = extract.time;
        let degraded: Vec<&str> = extract.degraded.iter().map(|f| f.stage.as_str()).collect();
        let stats = match self.store.ingest(
            &simulation,
            extract.species,
            extract.population,
            extract.pellets,
        ) {
            Ok(stats) => stats,
            Err(e) => {
                error!(
                    archive = id,
                    stage = "persist",
                    simulation = %simulation,
                    error = %e,
                    "Failed to persist tables, will retry"
                );
                return ArchiveOutcome::Deferred;
            }
        };

        info!(
            archive = id,
            simulation = %simulation,
            time = %time,
            species_added = stats.species_added,
            count_rows = stats.count_rows,
            pellet_rows = stats.pellet_rows,
            skipped_entities = extract.skipped_entities,
            degraded = ?degraded,
            "Archive ingested"
        );
        let summary = self.store.summary(&simulation);
        info!(
            simulation = %simulation,
            total_species = summary.total_species,
            alive_species = summary.alive_species,
            latest_time = ?summary.latest_time,
            count_rows = summary.count_rows,
            pellet_rows = summary.pellet_rows,
            "Simulation summary"
        );
        ArchiveOutcome::Ingested(stats)
    }
}
