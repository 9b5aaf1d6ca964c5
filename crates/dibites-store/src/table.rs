//! Parquet plumbing shared by the three tables.
//!
//! Tables are always written whole. A write goes to a temporary file in the
//! destination directory which is then renamed over the old table, so a
//! concurrent reader sees either the previous or the new contents.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Read every batch of a table, or `None` if the file does not exist.
pub(crate) fn read_batches(path: &Path) -> Result<Option<Vec<RecordBatch>>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(ParquetRecordBatchReaderBuilder::build)
        .map_err(|source| StoreError::Parquet {
            path: path.to_path_buf(),
            source,
        })?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| StoreError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(batches))
}

/// Assemble a batch from columns matching `schema`.
pub(crate) fn build_batch(
    path: &Path,
    schema: Arc<Schema>,
    columns: Vec<ArrayRef>,
) -> Result<RecordBatch, StoreError> {
    RecordBatch::try_new(schema, columns).map_err(|source| StoreError::Arrow {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace a table file with a single batch.
pub(crate) fn write_batch(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let parquet_err = |source: parquet::errors::ParquetError| StoreError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let mut writer =
        ArrowWriter::try_new(&mut temp, batch.schema(), Some(props)).map_err(parquet_err)?;
    writer.write(batch).map_err(parquet_err)?;
    writer.close().map_err(parquet_err)?;

    temp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

/// Look up a column by name and type.
pub(crate) fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'a T, StoreError> {
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::Schema {
            path: path.to_path_buf(),
            detail: format!("missing column {name}"),
        })?;
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| StoreError::Schema {
            path: path.to_path_buf(),
            detail: format!("column {name} has type {}", array.data_type()),
        })
}

/// Read a non-nullable value, reporting nulls as a schema error.
pub(crate) fn required<T>(
    value: Option<T>,
    name: &str,
    row: usize,
    path: &Path,
) -> Result<T, StoreError> {
    value.ok_or_else(|| StoreError::Schema {
        path: path.to_path_buf(),
        detail: format!("null {name} in row {row}"),
    })
}
