//! The species catalog table (`species_data.parquet`).
//!
//! | Column | Type | Notes |
//! |--------|------|-------|
//! | `speciesID` | Int64 | unique |
//! | `genericName` | Utf8, nullable | |
//! | `specificName` | Utf8, nullable | |
//! | `parentID` | Int64, nullable | null for root species |
//! | `template` | Utf8 | genome template as JSON text |
//! | `attributes` | Utf8 | remaining upstream fields as JSON text |

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use dibites_types::{GenomeTemplate, SpeciesId, SpeciesRecord};

use crate::error::StoreError;
use crate::table::{build_batch, column, required};

/// File name of the catalog inside a simulation folder.
pub const SPECIES_FILE: &str = "species_data.parquet";

/// Every species ever recorded for one simulation, distinct by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeciesCatalog {
    records: Vec<SpeciesRecord>,
    ids: BTreeSet<SpeciesId>,
}

impl SpeciesCatalog {
    /// Create an empty catalog.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
            ids: BTreeSet::new(),
        }
    }

    /// Number of species in the catalog.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog has no species.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[SpeciesRecord] {
        &self.records
    }

    /// Look up a species by id.
    pub fn get(&self, species_id: SpeciesId) -> Option<&SpeciesRecord> {
        if !self.ids.contains(&species_id) {
            return None;
        }
        self.records.iter().find(|r| r.species_id == species_id)
    }

    /// Insert a record unless its id is already cataloged.
    ///
    /// Returns whether the record was added. The record already in the
    /// catalog always wins.
    pub fn insert(&mut self, record: SpeciesRecord) -> bool {
        if self.ids.insert(record.species_id) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    /// Union new records into the catalog, first write wins.
    ///
    /// Returns how many records were added.
    pub fn merge<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = SpeciesRecord>,
    {
        let mut added: usize = 0;
        for record in records {
            if self.insert(record) {
                added = added.saturating_add(1);
            }
        }
        added
    }

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("speciesID", DataType::Int64, false),
            Field::new("genericName", DataType::Utf8, true),
            Field::new("specificName", DataType::Utf8, true),
            Field::new("parentID", DataType::Int64, true),
            Field::new("template", DataType::Utf8, false),
            Field::new("attributes", DataType::Utf8, false),
        ]))
    }

    pub(crate) fn to_batch(&self, path: &Path) -> Result<RecordBatch, StoreError> {
        let json_err = |source: serde_json::Error| StoreError::Json {
            path: path.to_path_buf(),
            source,
        };
        let mut templates = Vec::with_capacity(self.records.len());
        let mut attributes = Vec::with_capacity(self.records.len());
        for record in &self.records {
            templates.push(serde_json::to_string(&record.template).map_err(json_err)?);
            attributes.push(serde_json::to_string(&record.attributes).map_err(json_err)?);
        }

        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from_iter_values(
                self.records.iter().map(|r| r.species_id.into_inner()),
            )),
            Arc::new(StringArray::from_iter(
                self.records.iter().map(|r| r.generic_name.as_deref()),
            )),
            Arc::new(StringArray::from_iter(
                self.records.iter().map(|r| r.specific_name.as_deref()),
            )),
            Arc::new(Int64Array::from_iter(
                self.records.iter().map(|r| r.parent_id.map(SpeciesId::into_inner)),
            )),
            Arc::new(StringArray::from_iter_values(templates)),
            Arc::new(StringArray::from_iter_values(attributes)),
        ];
        build_batch(path, Self::schema(), columns)
    }

    pub(crate) fn from_batches(batches: &[RecordBatch], path: &Path) -> Result<Self, StoreError> {
        let json_err = |source: serde_json::Error| StoreError::Json {
            path: path.to_path_buf(),
            source,
        };
        let mut catalog = Self::new();
        for batch in batches {
            let ids = column::<Int64Array>(batch, "speciesID", path)?;
            let generic = column::<StringArray>(batch, "genericName", path)?;
            let specific = column::<StringArray>(batch, "specificName", path)?;
            let parents = column::<Int64Array>(batch, "parentID", path)?;
            let templates = column::<StringArray>(batch, "template", path)?;
            let extras = column::<StringArray>(batch, "attributes", path)?;

            for row in 0..batch.num_rows() {
                let species_id =
                    required(ids.is_valid(row).then(|| ids.value(row)), "speciesID", row, path)?;
                let template = required(
                    templates.is_valid(row).then(|| templates.value(row)),
                    "template",
                    row,
                    path,
                )?;
                let extra = required(
                    extras.is_valid(row).then(|| extras.value(row)),
                    "attributes",
                    row,
                    path,
                )?;

                catalog.insert(SpeciesRecord {
                    species_id: SpeciesId(species_id),
                    generic_name: generic.is_valid(row).then(|| generic.value(row).to_owned()),
                    specific_name: specific.is_valid(row).then(|| specific.value(row).to_owned()),
                    parent_id: parents.is_valid(row).then(|| SpeciesId(parents.value(row))),
                    template: serde_json::from_str::<GenomeTemplate>(template).map_err(json_err)?,
                    attributes: serde_json::from_str(extra).map_err(json_err)?,
                });
            }
        }
        Ok(catalog)
    }
}
