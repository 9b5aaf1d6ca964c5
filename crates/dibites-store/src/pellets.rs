//! The pellet time series (`pellet_data.parquet`).
//!
//! Append-only, one row per (archive, zone).

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use dibites_types::{PelletTotals, SimulatedTime, ZonePelletRecord};

use crate::error::StoreError;
use crate::table::{build_batch, column, required};

/// File name of the pellet series inside a simulation folder.
pub const PELLETS_FILE: &str = "pellet_data.parquet";

/// Zone pellet rows for one simulation in ingestion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PelletSeries {
    rows: Vec<ZonePelletRecord>,
}

impl PelletSeries {
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
    pub fn rows(&self) -> &[ZonePelletRecord] {
        &self.rows
    }

    /// Append rows. No deduplication takes place.
    pub fn append<I>(&mut self, rows: I) -> usize
    where
        I: IntoIterator<Item = ZonePelletRecord>,
    {
        let before = self.rows.len();
        self.rows.extend(rows);
        self.rows.len().saturating_sub(before)
    }

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("update_time", DataType::Float64, true),
            Field::new("zone_name", DataType::Utf8, false),
            Field::new("plant_pellet_count", DataType::UInt64, false),
            Field::new("plant_total_amount", DataType::Float64, false),
            Field::new("plant_avg_scale", DataType::Float64, false),
            Field::new("meat_pellet_count", DataType::UInt64, false),
            Field::new("meat_total_amount", DataType::Float64, false),
            Field::new("meat_avg_scale", DataType::Float64, false),
        ]))
    }

    pub(crate) fn to_batch(&self, path: &Path) -> Result<RecordBatch, StoreError> {
        let rows = &self.rows;
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.time.seconds()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.zone_name.as_str()))),
        ];
        columns.extend(totals_columns(rows, |r| &r.plant));
        columns.extend(totals_columns(rows, |r| &r.meat));
        build_batch(path, Self::schema(), columns)
    }

    pub(crate) fn from_batches(batches: &[RecordBatch], path: &Path) -> Result<Self, StoreError> {
        let mut series = Self::new();
        for batch in batches {
            let times = column::<Float64Array>(batch, "update_time", path)?;
            let zones = column::<StringArray>(batch, "zone_name", path)?;
            let plant = TotalsColumns::load(batch, "plant", path)?;
            let meat = TotalsColumns::load(batch, "meat", path)?;

            for row in 0..batch.num_rows() {
                let zone_name = required(
                    zones.is_valid(row).then(|| zones.value(row)),
                    "zone_name",
                    row,
                    path,
                )?;
                series.rows.push(ZonePelletRecord {
                    time: SimulatedTime::from(times.is_valid(row).then(|| times.value(row))),
                    zone_name: zone_name.to_owned(),
                    plant: plant.read(row, path)?,
                    meat: meat.read(row, path)?,
                });
            }
        }
        Ok(series)
    }
}

fn totals_columns(
    rows: &[ZonePelletRecord],
    pick: fn(&ZonePelletRecord) -> &PelletTotals,
) -> [ArrayRef; 3] {
    [
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| pick(r).pellet_count))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| pick(r).total_amount))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| pick(r).avg_scale))),
    ]
}

/// The three aggregate columns of one pellet category.
struct TotalsColumns<'a> {
    prefix: &'static str,
    count: &'a UInt64Array,
    amount: &'a Float64Array,
    scale: &'a Float64Array,
}

impl<'a> TotalsColumns<'a> {
    fn load(batch: &'a RecordBatch, prefix: &'static str, path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            prefix,
            count: column(batch, &format!("{prefix}_pellet_count"), path)?,
            amount: column(batch, &format!("{prefix}_total_amount"), path)?,
            scale: column(batch, &format!("{prefix}_avg_scale"), path)?,
        })
    }

    fn read(&self, row: usize, path: &Path) -> Result<PelletTotals, StoreError> {
        let prefix = self.prefix;
        Ok(PelletTotals {
            pellet_count: required(
                self.count.is_valid(row).then(|| self.count.value(row)),
                &format!("{prefix}_pellet_count"),
                row,
                path,
            )?,
            total_amount: required(
                self.amount.is_valid(row).then(|| self.amount.value(row)),
                &format!("{prefix}_total_amount"),
                row,
                path,
            )?,
            avg_scale: required(
                self.scale.is_valid(row).then(|| self.scale.value(row)),
                &format!("{prefix}_avg_scale"),
                row,
                path,
            )?,
        })
    }
}
