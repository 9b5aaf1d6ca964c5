//! The three tables of one simulation and their merge rules.

use dibites_types::{PopulationCountRecord, SpeciesRecord, ZonePelletRecord};

use crate::catalog::SpeciesCatalog;
use crate::counts::PopulationSeries;
use crate::pellets::PelletSeries;

/// Catalog, population series, and pellet series of one simulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationDatasets {
    /// Species catalog, distinct by id.
    pub catalog: SpeciesCatalog,
    /// Population counts, append-only.
    pub population: PopulationSeries,
    /// Zone pellet aggregates, append-only.
    pub pellets: PelletSeries,
}

/// What a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// New species added to the catalog.
    pub species_added: usize,
    /// Species already cataloged and therefore discarded.
    pub species_known: usize,
    /// Population rows appended.
    pub count_rows: usize,
    /// Pellet rows appended.
    pub pellet_rows: usize,
}

impl SimulationDatasets {
    /// Fold one archive's output into the tables.
    ///
    /// Species are unioned by id keeping the existing record; population
    /// and pellet rows are appended as they are.
    pub fn merge(
        &mut self,
        species: Vec<SpeciesRecord>,
        population: Vec<PopulationCountRecord>,
        pellets: Vec<ZonePelletRecord>,
    ) -> MergeStats {
        let offered = species.len();
        let species_added = self.catalog.merge(species);
        MergeStats {
            species_added,
            species_known: offered.saturating_sub(species_added),
            count_rows: self.population.append(population),
            pellet_rows: self.pellets.append(pellets),
        }
    }
}

#[cfg(test)]
mod tests {
    use dibites_types::{GenomeTemplate, PelletTotals, SimulatedTime, SpeciesId};

    use super::*;

    fn species(id: i64) -> SpeciesRecord {
        SpeciesRecord {
            species_id: SpeciesId(id),
            generic_name: None,
            specific_name: None,
            parent_id: None,
            template: GenomeTemplate::default(),
            attributes: serde_json::Map::new(),
        }
    }

    #[test]
    fn merging_twice_keeps_catalog_and_duplicates_rows() {
        let time = SimulatedTime::Known(42.0);
        let population = vec![PopulationCountRecord {
            time,
            species_id: SpeciesId(1),
            count: 3,
        }];
        let pellets = vec![ZonePelletRecord {
            time,
            zone_name: "north".to_owned(),
            plant: PelletTotals::from_sums(1, 5.0, 1.0),
            meat: PelletTotals::default(),
        }];

        let mut datasets = SimulationDatasets::default();
        let first = datasets.merge(vec![species(1)], population.clone(), pellets.clone());
        let second = datasets.merge(vec![species(1)], population, pellets);

        assert_eq!(first.species_added, 1);
        assert_eq!(second.species_added, 0);
        assert_eq!(second.species_known, 1);
        assert_eq!(datasets.catalog.len(), 1);
        assert_eq!(datasets.population.len(), 2);
        assert_eq!(datasets.pellets.len(), 2);
    }
}
