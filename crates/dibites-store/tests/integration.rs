//! Integration tests for the `dibites-store` tables and ledger.
//!
//! Every test works in its own temporary data root.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::float_cmp
)]

use std::fs;

use dibites_store::{ProcessedLedger, SimulationStore};
use dibites_types::{
    GenomeTemplate, PelletTotals, PopulationCountRecord, SimulatedTime, SimulationName,
    SpeciesId, SpeciesRecord, ZonePelletRecord,
};
use serde_json::json;
use tempfile::TempDir;

fn species(id: i64, generic: &str) -> SpeciesRecord {
    SpeciesRecord {
        species_id: SpeciesId(id),
        generic_name: Some(generic.to_owned()),
        specific_name: None,
        parent_id: None,
        template: GenomeTemplate::default(),
        attributes: serde_json::Map::new(),
    }
}

fn counts(time: f64, tallies: &[(i64, u64)]) -> Vec<PopulationCountRecord> {
    tallies
        .iter()
        .map(|&(id, count)| PopulationCountRecord {
            time: SimulatedTime::Known(time),
            species_id: SpeciesId(id),
            count,
        })
        .collect()
}

fn zone(time: SimulatedTime, name: &str) -> ZonePelletRecord {
    ZonePelletRecord {
        time,
        zone_name: name.to_owned(),
        plant: PelletTotals::from_sums(1, 5.0, 1.0),
        meat: PelletTotals::from_sums(2, 2.0, 4.0),
    }
}

// =============================================================================
// Catalog union
// =============================================================================

#[test]
fn catalog_union_keeps_first_archive_fields() {
    let root = TempDir::new().unwrap();
    let store = SimulationStore::new(root.path());
    let sim = SimulationName::new("lake");

    store
        .ingest(&sim, vec![species(1, "A-one"), species(2, "A-two")], Vec::new(), Vec::new())
        .unwrap();
    let stats = store
        .ingest(&sim, vec![species(1, "B-one"), species(3, "B-three")], Vec::new(), Vec::new())
        .unwrap();
    assert_eq!(stats.species_added, 1);
    assert_eq!(stats.species_known, 1);

    let loaded = store.load(&sim).unwrap();
    let ids: Vec<i64> = loaded
        .catalog
        .records()
        .iter()
        .map(|r| r.species_id.into_inner())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(
        loaded.catalog.get(SpeciesId(1)).unwrap().generic_name.as_deref(),
        Some("A-one")
    );
}

#[test]
fn catalog_keeps_opaque_upstream_fields() {
    let root = TempDir::new().unwrap();
    let store = SimulationStore::new(root.path());
    let sim = SimulationName::default();

    let record: SpeciesRecord = serde_json::from_value(json!({
        "speciesID": "12",
        "genericName": "Velox",
        "specificName": "rapida",
        "parentID": 4,
        "template": {
            "genes": {"Diet": 0.25, "Tag": "x"},
            "nodes": [{"Index": 0, "Type": 1}],
            "synapses": [{"From": 0, "To": 1}],
            "version": 3
        },
        "colorR": 0.5,
        "lineage": [1, 4]
    }))
    .unwrap();
    store.ingest(&sim, vec![record.clone()], Vec::new(), Vec::new()).unwrap();

    let loaded = store.load(&sim).unwrap();
    assert_eq!(loaded.catalog.records(), &[record]);
}

// =============================================================================
// Reprocessing
// =============================================================================

#[test]
fn reprocessing_duplicates_rows_but_not_species() {
    let root = TempDir::new().unwrap();
    let store = SimulationStore::new(root.path());
    let sim = SimulationName::new("run");

    for _ in 0..2 {
        store
            .ingest(
                &sim,
                vec![species(1, "A")],
                counts(60.0, &[(1, 4)]),
                vec![zone(SimulatedTime::Known(60.0), "north")],
            )
            .unwrap();
    }

    let loaded = store.load(&sim).unwrap();
    assert_eq!(loaded.catalog.len(), 1);
    assert_eq!(loaded.population.len(), 2);
    assert_eq!(loaded.pellets.len(), 2);
    assert_eq!(loaded.population.rows()[0], loaded.population.rows()[1]);
}

#[test]
fn simulations_are_kept_apart() {
    let root = TempDir::new().unwrap();
    let store = SimulationStore::new(root.path());

    store
        .ingest(
            &SimulationName::new("alpha"),
            vec![species(1, "A")],
            counts(1.0, &[(1, 1)]),
            Vec::new(),
        )
        .unwrap();
    store
        .ingest(&SimulationName::new("beta"), vec![species(2, "B")], Vec::new(), Vec::new())
        .unwrap();

    assert_eq!(store.list_simulations().unwrap(), vec!["alpha", "beta"]);
    assert_eq!(store.load(&SimulationName::new("beta")).unwrap().population.len(), 0);
    assert!(root.path().join("alpha").join("species_counts.parquet").is_file());
}

#[test]
fn unknown_time_round_trips_as_null() {
    let root = TempDir::new().unwrap();
    let store = SimulationStore::new(root.path());
    let sim = SimulationName::default();

    store
        .ingest(&sim, Vec::new(), Vec::new(), vec![zone(SimulatedTime::Unknown, "south")])
        .unwrap();
    let loaded = store.load(&sim).unwrap();
    assert_eq!(loaded.pellets.rows()[0].time, SimulatedTime::Unknown);
    assert_eq!(loaded.pellets.rows()[0].meat.avg_scale, 2.0);
}

// =============================================================================
// Malformed tables
// =============================================================================

#[test]
fn corrupt_table_fails_load_but_not_summary() {
    let root = TempDir::new().unwrap();
    let store = SimulationStore::new(root.path());
    let sim = SimulationName::new("broken");

    store
        .ingest(
            &sim,
            vec![species(1, "A"), species(2, "B")],
            counts(9.0, &[(1, 2), (2, 1)]),
            Vec::new(),
        )
        .unwrap();
    let counts_path = store.simulation_dir(&sim).join("species_counts.parquet");
    fs::write(&counts_path, b"not parquet").unwrap();

    assert!(store.load(&sim).is_err());
    assert!(
        store.ingest(&sim, vec![species(3, "C")], Vec::new(), Vec::new()).is_err(),
        "a failed load must not overwrite history"
    );
    assert_eq!(fs::read(&counts_path).unwrap(), b"not parquet");

    let summary = store.summary(&sim);
    assert_eq!(summary.total_species, 2);
    assert_eq!(summary.count_rows, 0);
    assert_eq!(summary.alive_species, 0);
}

#[test]
fn summary_reports_alive_species_at_latest_time() {
    let root = TempDir::new().unwrap();
    let store = SimulationStore::new(root.path());
    let sim = SimulationName::default();

    store
        .ingest(
            &sim,
            vec![species(1, "A"), species(2, "B")],
            counts(10.0, &[(1, 3), (2, 1)]),
            Vec::new(),
        )
        .unwrap();
    store
        .ingest(
            &sim,
            Vec::new(),
            counts(20.0, &[(2, 5)]),
            vec![zone(SimulatedTime::Known(20.0), "north")],
        )
        .unwrap();

    let summary = store.summary(&sim);
    assert_eq!(summary.total_species, 2);
    assert_eq!(summary.alive_species, 1);
    assert_eq!(summary.latest_time, Some(20.0));
    assert_eq!(summary.count_rows, 3);
    assert_eq!(summary.pellet_rows, 1);
}

// =============================================================================
// Ledger
// =============================================================================

#[test]
fn ledger_survives_reload() {
    let root = TempDir::new().unwrap();
    let store = SimulationStore::new(root.path());

    let mut ledger = store.load_ledger().unwrap();
    assert!(ledger.is_empty());
    ledger.mark("autosave_2.zip");
    ledger.mark("autosave_1.zip");
    ledger.persist().unwrap();

    let reloaded = ProcessedLedger::load(store.ledger_path()).unwrap();
    assert!(reloaded.contains("autosave_1.zip"));
    assert!(reloaded.contains("autosave_2.zip"));
    assert!(!reloaded.contains("autosave_3.zip"));
    assert_eq!(
        fs::read_to_string(store.ledger_path()).unwrap(),
        "autosave_1.zip\nautosave_2.zip\n"
    );
}
