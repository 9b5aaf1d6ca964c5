//! Headline numbers for one simulation, read the way a dashboard would.
//!
//! Unlike [`SimulationStore::load`](crate::SimulationStore::load), this path
//! never fails: a missing, empty, or unreadable table counts as empty.

use std::collections::BTreeSet;

use crate::datasets::SimulationDatasets;

/// Summary of one simulation's tables.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DatasetSummary {
    /// Species ever cataloged.
    pub total_species: usize,
    /// Species with a non-zero count at the latest known time.
    pub alive_species: usize,
    /// Latest known simulated time in the population series.
    pub latest_time: Option<f64>,
    /// Rows in the population series.
    pub count_rows: usize,
    /// Rows in the pellet series.
    pub pellet_rows: usize,
}

impl DatasetSummary {
    /// Summarize already loaded tables.
    pub fn from_datasets(datasets: &SimulationDatasets) -> Self {
        let latest_time = datasets.population.latest_time();
        let alive_species = latest_time.map_or(0, |latest| {
            datasets
                .population
                .rows_at(latest)
                .filter(|row| row.count > 0)
                .map(|row| row.species_id)
                .collect::<BTreeSet<_>>()
                .len()
        });
        Self {
            total_species: datasets.catalog.len(),
            alive_species,
            latest_time,
            count_rows: datasets.population.len(),
            pellet_rows: datasets.pellets.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use dibites_types::{PopulationCountRecord, SimulatedTime, SpeciesId};

    use super::*;

    fn count(time: f64, id: i64, count: u64) -> PopulationCountRecord {
        PopulationCountRecord {
            time: SimulatedTime::Known(time),
            species_id: SpeciesId(id),
            count,
        }
    }

    #[test]
    fn alive_species_counted_at_latest_time_only() {
        let mut datasets = SimulationDatasets::default();
        datasets.population.append(vec![
            count(10.0, 1, 5),
            count(10.0, 2, 1),
            count(20.0, 1, 2),
            count(20.0, 3, 0),
            count(20.0, 1, 2),
        ]);
        let summary = DatasetSummary::from_datasets(&datasets);
        assert_eq!(summary.alive_species, 1);
        assert_eq!(summary.count_rows, 5);
        assert!(summary.latest_time.is_some_and(|t| t.total_cmp(&20.0).is_eq()));
    }

    #[test]
    fn empty_datasets_summarize_to_zero() {
        let summary = DatasetSummary::from_datasets(&SimulationDatasets::default());
        assert_eq!(summary, DatasetSummary::default());
    }
}
