//! Table storage: CSV and Parquet codecs, compression, and shard discovery.

pub mod compression;
pub mod csv;
pub mod glob;

#[cfg_attr(docsrs, doc(cfg(feature = "io-parquet")))]
#[cfg(feature = "io-parquet")]
pub mod parquet;

use crate::error::{Error, Result};
use crate::table::MetadataTable;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// On-disk format of a metadata shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShardFormat {
    Parquet,
    Csv,
}

impl Default for ShardFormat {
    /// Parquet when compiled in, CSV otherwise.
    fn default() -> Self {
        if cfg!(feature = "io-parquet") {
            Self::Parquet
        } else {
            Self::Csv
        }
    }
}

impl ShardFormat {
    /// Extension used for newly written shards, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
        }
    }

    /// Format implied by a file name, accepting compressed CSV (`.csv.gz`, `.csv.zst`).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".parquet") {
            return Some(Self::Parquet);
        }
        let csv_like = std::iter::once(".csv".to_owned()).chain(
            compression::compressed_extensions()
                .into_iter()
                .map(|ext| format!(".csv{ext}")),
        );
        for suffix in csv_like {
            if name.ends_with(&suffix) {
                return Some(Self::Csv);
            }
        }
        None
    }

    /// Every shard file extension this build can read.
    #[must_use]
    pub fn readable_extensions() -> Vec<String> {
        let mut exts = Vec::new();
        if cfg!(feature = "io-parquet") {
            exts.push("parquet".to_owned());
        }
        exts.push("csv".to_owned());
        for ext in compression::compressed_extensions() {
            exts.push(format!("csv{ext}"));
        }
        exts
    }
}

impl fmt::Display for ShardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ShardFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parquet" | "pq" => Ok(Self::Parquet),
            "csv" => Ok(Self::Csv),
            other => Err(Error::Config(format!(
                "unknown shard format {other:?} (expected parquet or csv)"
            ))),
        }
    }
}

/// Read a table, choosing the codec from the file name.
///
/// # Errors
/// [`Error::Config`] for an unrecognized extension (or Parquet without `io-parquet`);
/// otherwise whatever the codec reports.
pub fn read_table(path: impl AsRef<Path>) -> Result<MetadataTable> {
    let path = path.as_ref();
    match ShardFormat::from_path(path) {
        Some(ShardFormat::Csv) => csv::read_table_csv(path),
        Some(ShardFormat::Parquet) => read_parquet(path),
        None => Err(Error::Config(format!(
            "unrecognized metadata table format: {}",
            path.display()
        ))),
    }
}

/// Write a table in `format`.
///
/// # Errors
/// [`Error::Config`] for Parquet without `io-parquet`; otherwise whatever the codec reports.
pub fn write_table(path: impl AsRef<Path>, format: ShardFormat, table: &MetadataTable) -> Result<usize> {
    let path = path.as_ref();
    match format {
        ShardFormat::Csv => csv::write_table_csv(path, table),
        ShardFormat::Parquet => write_parquet(path, table),
    }
}

#[cfg(feature = "io-parquet")]
fn read_parquet(path: &Path) -> Result<MetadataTable> {
    parquet::read_table_parquet(path)
}

#[cfg(not(feature = "io-parquet"))]
fn read_parquet(path: &Path) -> Result<MetadataTable> {
    Err(Error::Config(format!(
        "{} is a parquet shard but parquet support is not compiled in (feature `io-parquet`)",
        path.display()
    )))
}

#[cfg(feature = "io-parquet")]
fn write_parquet(path: &Path, table: &MetadataTable) -> Result<usize> {
    parquet::write_table_parquet(path, table)
}

#[cfg(not(feature = "io-parquet"))]
fn write_parquet(path: &Path, _table: &MetadataTable) -> Result<usize> {
    Err(Error::Config(format!(
        "cannot write {}: parquet support is not compiled in (feature `io-parquet`)",
        path.display()
    )))
}

/// All readable shard files directly under `dir`, sorted by path.
///
/// # Errors
/// Propagates glob failures.
pub fn discover_shards(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut shards = Vec::new();
    for ext in ShardFormat::readable_extensions() {
        shards.extend(glob::files_with_extension(dir, &ext)?);
    }
    shards.sort();
    shards.dedup();
    Ok(shards)
}
