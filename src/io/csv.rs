//! CSV storage for metadata tables.
//!
//! The first record is always the header. Cells are kept as text; an empty cell
//! reads back as an absent value, and an absent value is written as an empty cell,
//! so CSV and Parquet shards agree on what "missing" means.
//!
//! **Compression**: `.csv.gz` / `.csv.zst` paths are (de)compressed transparently
//! when the matching feature is enabled.

use crate::error::{Error, Result};
use crate::io::compression::{FinishWrite, auto_detect_reader, auto_detect_writer};
use crate::table::{MetadataRow, MetadataTable};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{File, create_dir_all};
use std::path::Path;

/// Read a headed CSV file into a [`MetadataTable`].
///
/// # Errors
/// Returns an error if the file cannot be opened or decompressed, or if a record is
/// malformed (e.g. a different field count than the header).
pub fn read_table_csv(path: impl AsRef<Path>) -> Result<MetadataTable> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    let rdr = auto_detect_reader(f, path).map_err(|e| Error::io(path, e))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(rdr);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| Error::csv(path, e))?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let mut table = MetadataTable::new(headers.iter().cloned());
    for rec in rdr.records() {
        let rec = rec.map_err(|e| Error::csv(path, e))?;
        let row = MetadataRow::from_pairs(
            headers
                .iter()
                .zip(rec.iter())
                .filter(|(_, v)| !v.is_empty())
                .map(|(h, v)| (h.clone(), v)),
        );
        table.push(row);
    }
    Ok(table)
}

/// Write a [`MetadataTable`] as headed CSV, creating parent directories as needed.
///
/// # Returns
/// The number of data rows written.
///
/// # Errors
/// Returns an error if the file or its directories cannot be created, or a record
/// fails to serialize or flush.
pub fn write_table_csv(path: impl AsRef<Path>, table: &MetadataTable) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let f = File::create(path).map_err(|e| Error::io(path, e))?;
    let w = auto_detect_writer(f, path).map_err(|e| Error::io(path, e))?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(w);

    wtr.write_record(table.columns())
        .map_err(|e| Error::csv(path, e))?;
    for rec in table.records() {
        wtr.write_record(rec.into_iter().map(Option::unwrap_or_default))
            .map_err(|e| Error::csv(path, e))?;
    }
    wtr.into_inner()
        .map_err(|e| Error::io(path, e.into_error()))?
        .finish()
        .map_err(|e| Error::io(path, e))?;
    Ok(table.len())
}
