//! Error types for pack and unpack runs.
//!
//! Every fatal condition is raised before the first filesystem mutation of a run:
//! [`Error::Config`], [`Error::Schema`] and [`Error::NoMatch`] are all pre-flight
//! failures. A referenced audio file that is absent is *not* an error; it is
//! recorded as a [`MissingFile`](crate::plan::MissingFile) and reported at the end.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by loading, planning or materializing a dataset.
#[derive(Error, Debug)]
pub enum Error {
    /// A required directory or file is missing, or an option is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Required columns are absent from a metadata table.
    #[error("{table} is missing required columns: {}", missing.join(", "))]
    Schema { table: String, missing: Vec<String> },

    /// The unpack filters selected no rows.
    #[error("no rows match the specified filters ({0})")]
    NoMatch(String),

    /// I/O failure on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[cfg(feature = "io-parquet")]
    #[error("parquet error in {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[cfg(feature = "io-parquet")]
    #[error("arrow error in {}: {source}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("invalid glob pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("error reading glob entry: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// `true` for the pre-flight failures that abort a run before any mutation.
    #[must_use]
    pub const fn is_preflight(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Schema { .. } | Self::NoMatch(_))
    }
}
