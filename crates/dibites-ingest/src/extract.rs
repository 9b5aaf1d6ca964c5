//! Whole-archive extraction.
//!
//! Runs every stage against one archive and applies the failure policy:
//!
//! 1. Identity -- on failure, use the default simulation name.
//! 2. Simulated time -- on failure, stamp rows with the `Unknown` sentinel.
//! 3. Species -- on failure, contribute no catalog entries.
//! 4. Population -- unreadable entities are skipped one by one.
//! 5. Pellets -- on failure, discard the whole archive.
//!
//! Stages 1-4 are independent of each other: a broken scene never changes the
//! resolved identity, and so on. Degraded stages are returned alongside the
//! data in [`ArchiveExtract::degraded`].

use std::path::Path;

use dibites_types::{
    PopulationCountRecord, SimulatedTime, SimulationName, SpeciesRecord, ZonePelletRecord,
};
use tracing::{debug, info_span, warn};

use crate::archive::{ArchiveSource, ZipSource};
use crate::clock::extract_simulated_time;
use crate::error::{ExtractError, Stage, StageError};
use crate::identity::extract_simulation_name;
use crate::pellets::extract_pellets;
use crate::population::tally_population;
use crate::species::extract_species;

/// A stage that fell back to its default.
#[derive(Debug)]
pub struct StageFailure {
    /// Which stage degraded.
    pub stage: Stage,
    /// Why it degraded.
    pub error: StageError,
}

/// Everything one archive contributes to its simulation's tables.
#[derive(Debug)]
pub struct ArchiveExtract {
    /// Simulation the archive belongs to.
    pub simulation: SimulationName,
    /// Simulated time stamped on every row below.
    pub time: SimulatedTime,
    /// Species described in the archive, distinct by id.
    pub species: Vec<SpeciesRecord>,
    /// One tally per species alive in the archive.
    pub population: Vec<PopulationCountRecord>,
    /// One aggregate per zone.
    pub pellets: Vec<ZonePelletRecord>,
    /// Entity members skipped by the population stage.
    pub skipped_entities: usize,
    /// Stages that fell back to defaults.
    pub degraded: Vec<StageFailure>,
}

impl ArchiveExtract {
    /// Whether the given stage fell back to its default.
    pub fn is_degraded(&self, stage: Stage) -> bool {
        self.degraded.iter().any(|failure| failure.stage == stage)
    }
}

/// Open a zip archive on disk and extract it.
///
/// # Errors
///
/// Returns [`ExtractError::Open`] if the file is not a readable zip, and
/// [`ExtractError::PelletsFailed`] if the pellet stage fails.
pub fn extract_archive_file(path: &Path) -> Result<ArchiveExtract, ExtractError> {
    let archive_id = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mut source = ZipSource::open(path).map_err(|source| ExtractError::Open {
        archive: archive_id.clone(),
        source,
    })?;
    extract_archive(&mut source, &archive_id)
}

/// Extract every stage from an open archive.
///
/// # Errors
///
/// Returns [`ExtractError::PelletsFailed`] if the pellet stage fails; the
/// other stages never fail the archive.
pub fn extract_archive<A: ArchiveSource + ?Sized>(
    archive: &mut A,
    archive_id: &str,
) -> Result<ArchiveExtract, ExtractError> {
    let _span = info_span!("archive", archive = archive_id).entered();
    let mut degraded = Vec::new();

    let simulation = match extract_simulation_name(archive) {
        Ok(name) => name,
        Err(error) => {
            warn!(
                archive = archive_id,
                stage = %Stage::Identity,
                absent = error.is_absent(),
                error = %error,
                "using default simulation name"
            );
            degraded.push(StageFailure {
                stage: Stage::Identity,
                error,
            });
            SimulationName::default()
        }
    };

    let time = match extract_simulated_time(archive) {
        Ok(seconds) => SimulatedTime::Known(seconds),
        Err(error) => {
            warn!(
                archive = archive_id,
                stage = %Stage::SimulatedTime,
                absent = error.is_absent(),
                error = %error,
                "simulated time unavailable, rows will be stamped Unknown"
            );
            degraded.push(StageFailure {
                stage: Stage::SimulatedTime,
                error,
            });
            SimulatedTime::Unknown
        }
    };

    let species = match extract_species(archive) {
        Ok(batch) => {
            debug!(
                archive = archive_id,
                stage = %Stage::Species,
                described = batch.records.len(),
                skipped = batch.skipped,
                "species descriptions read"
            );
            batch.records
        }
        Err(error) => {
            warn!(
                archive = archive_id,
                stage = %Stage::Species,
                absent = error.is_absent(),
                error = %error,
                "no species descriptions, catalog left unchanged"
            );
            degraded.push(StageFailure {
                stage: Stage::Species,
                error,
            });
            Vec::new()
        }
    };

    let tally = tally_population(archive);
    if tally.species_count() == 0 {
        warn!(
            archive = archive_id,
            stage = %Stage::Population,
            scanned = tally.scanned,
            skipped = tally.skipped,
            "no species ids found in entity members"
        );
    } else {
        debug!(
            archive = archive_id,
            stage = %Stage::Population,
            scanned = tally.scanned,
            skipped = tally.skipped,
            species = tally.species_count(),
            "population tallied"
        );
    }

    let pellets = extract_pellets(archive, time).map_err(|source| ExtractError::PelletsFailed {
        archive: archive_id.to_owned(),
        source,
    })?;

    Ok(ArchiveExtract {
        simulation,
        time,
        species,
        population: tally.records(time),
        pellets,
        skipped_entities: tally.skipped,
        degraded,
    })
}
