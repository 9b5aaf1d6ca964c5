//! The population time series (`species_counts.parquet`).
//!
//! Append-only. One row per (archive, species) with a non-zero count.
//! An unknown simulated time is stored as a null `update_time`.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use dibites_types::{PopulationCountRecord, SimulatedTime, SpeciesId};

use crate::error::StoreError;
use crate::table::{build_batch, column, required};

/// File name of the population series inside a simulation folder.
pub const COUNTS_FILE: &str = "species_counts.parquet";

/// Population rows for one simulation in ingestion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationSeries {
    rows: Vec<PopulationCountRecord>,
}

impl PopulationSeries {
    /// Create an empty series.
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ingestion order.
    pub fn rows(&self) -> &[PopulationCountRecord] {
        &self.rows
    }

    /// Append rows. No deduplication takes place.
    pub fn append<I>(&mut self, rows: I) -> usize
    where
        I: IntoIterator<Item = PopulationCountRecord>,
    {
        let before = self.rows.len();
        self.rows.extend(rows);
        self.rows.len().saturating_sub(before)
    }

    /// Latest known simulated time in the series.
    pub fn latest_time(&self) -> Option<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.time.seconds())
            .reduce(f64::max)
    }

    /// Rows stamped with exactly `seconds`.
    pub fn rows_at(&self, seconds: f64) -> impl Iterator<Item = &PopulationCountRecord> {
        self.rows
            .iter()
            .filter(move |row| row.time.seconds().is_some_and(|t| t.total_cmp(&seconds).is_eq()))
    }

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("update_time", DataType::Float64, true),
            Field::new("speciesID", DataType::Int64, false),
            Field::new("count", DataType::UInt64, false),
        ]))
    }

    pub(crate) fn to_batch(&self, path: &Path) -> Result<RecordBatch, StoreError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from_iter(self.rows.iter().map(|r| r.time.seconds()))),
            Arc::new(Int64Array::from_iter_values(
                self.rows.iter().map(|r| r.species_id.into_inner()),
            )),
            Arc::new(UInt64Array::from_iter_values(self.rows.iter().map(|r| r.count))),
        ];
        build_batch(path, Self::schema(), columns)
    }

    pub(crate) fn from_batches(batches: &[RecordBatch], path: &Path) -> Result<Self, StoreError> {
        let mut series = Self::new();
        for batch in batches {
            let times = column::<Float64Array>(batch, "update_time", path)?;
            let ids = column::<Int64Array>(batch, "speciesID", path)?;
            let counts = column::<UInt64Array>(batch, "count", path)?;
            for row in 0..batch.num_rows() {
                let species_id =
                    required(ids.is_valid(row).then(|| ids.value(row)), "speciesID", row, path)?;
                let count =
                    required(counts.is_valid(row).then(|| counts.value(row)), "count", row, path)?;
                series.rows.push(PopulationCountRecord {
                    time: SimulatedTime::from(times.is_valid(row).then(|| times.value(row))),
                    species_id: SpeciesId(species_id),
                    count,
                });
            }
        }
        Ok(series)
    }
}
