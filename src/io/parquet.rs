//! Parquet storage for metadata shards.
//!
//! Shards are written with one nullable UTF-8 column per table column, in schema
//! order. On read, any Arrow type is cast to UTF-8 so shards produced by other
//! tools (with numeric or dictionary-encoded columns) still load; nulls and empty
//! strings come back as absent cells.

use crate::error::{Error, Result};
use crate::table::{MetadataRow, MetadataTable};
use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::{File, create_dir_all};
use std::path::Path;
use std::sync::Arc;

const READ_BATCH_SIZE: usize = 64 * 1024;

fn parquet_err(path: &Path, source: parquet::errors::ParquetError) -> Error {
    Error::Parquet {
        path: path.to_path_buf(),
        source,
    }
}

fn arrow_err(path: &Path, source: arrow::error::ArrowError) -> Error {
    Error::Arrow {
        path: path.to_path_buf(),
        source,
    }
}

/// Convert a table into a single all-UTF-8 `RecordBatch`.
fn to_record_batch(path: &Path, table: &MetadataTable) -> Result<RecordBatch> {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| Field::new(c, DataType::Utf8, true))
        .collect();
    let arrays: Vec<ArrayRef> = table
        .columns()
        .iter()
        .map(|c| {
            let values: StringArray = table.rows().iter().map(|r| r.get(c)).collect();
            Arc::new(values) as ArrayRef
        })
        .collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(|e| arrow_err(path, e))
}

/// Write a [`MetadataTable`] to a Parquet file, creating parent directories as needed.
///
/// A zero-row table still produces a valid file carrying the schema.
///
/// # Returns
/// Number of rows written.
///
/// # Errors
/// Returns an error if the batch cannot be built, or the file cannot be created or written.
pub fn write_table_parquet(path: impl AsRef<Path>, table: &MetadataTable) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let batch = to_record_batch(path, table)?;

    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let props = WriterProperties::builder().build();
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(|e| parquet_err(path, e))?;
    writer.write(&batch).map_err(|e| parquet_err(path, e))?;
    writer.close().map_err(|e| parquet_err(path, e))?;

    Ok(table.len())
}

/// Read a Parquet file into a [`MetadataTable`], casting every column to text.
///
/// # Errors
/// Returns an error if the file cannot be opened, is not valid Parquet, or holds a
/// column type Arrow cannot cast to UTF-8.
pub fn read_table_parquet(path: impl AsRef<Path>) -> Result<MetadataTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| parquet_err(path, e))?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder
        .with_batch_size(READ_BATCH_SIZE)
        .build()
        .map_err(|e| parquet_err(path, e))?;

    let mut table = MetadataTable::new(columns.iter().cloned());
    for batch in reader {
        let batch = batch.map_err(|e| arrow_err(path, e))?;
        let text_columns = batch
            .columns()
            .iter()
            .map(|c| cast(c, &DataType::Utf8))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| arrow_err(path, e))?;
        let text_columns: Vec<&StringArray> =
            text_columns.iter().map(|c| c.as_string::<i32>()).collect();

        for i in 0..batch.num_rows() {
            let mut row = MetadataRow::new();
            for (name, col) in columns.iter().zip(&text_columns) {
                if col.is_valid(i) && !col.value(i).is_empty() {
                    row.set(name.clone(), col.value(i));
                }
            }
            table.push(row);
        }
    }
    Ok(table)
}
