//! In-memory metadata table.
//!
//! A [`MetadataTable`] is an ordered list of [`MetadataRow`]s sharing one column
//! schema. Cells are carried as text so passthrough columns round-trip verbatim
//! regardless of the shard format they came from. A row that has no value for a
//! schema column simply lacks the key; it is written back as an empty cell (CSV)
//! or a null (Parquet).

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Column holding the relative audio file reference.
pub const AUDIO_PATH: &str = "audio_path";
/// Column holding the raw speaker name.
pub const SPEAKER: &str = "speaker";
/// Column holding the raw audio source name.
pub const AUDIO_SOURCE: &str = "audio_source";

/// Columns every metadata table must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = [AUDIO_PATH, SPEAKER, AUDIO_SOURCE];

/// One metadata record: column name to cell value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataRow {
    values: BTreeMap<String, String>,
}

impl MetadataRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs.
    ///
    /// ```
    /// use audiopack::table::MetadataRow;
    ///
    /// let row = MetadataRow::from_pairs([("audio_path", "wavs/a.wav"), ("speaker", "Ann")]);
    /// assert_eq!(row.speaker(), "Ann");
    /// assert_eq!(row.get("audio_source"), None);
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.values.insert(column.into(), value.into());
    }

    #[must_use]
    pub fn audio_path(&self) -> &str {
        self.get(AUDIO_PATH).unwrap_or_default()
    }

    #[must_use]
    pub fn speaker(&self) -> &str {
        self.get(SPEAKER).unwrap_or_default()
    }

    #[must_use]
    pub fn audio_source(&self) -> &str {
        self.get(AUDIO_SOURCE).unwrap_or_default()
    }

    /// Same row with `audio_path` replaced.
    #[must_use]
    pub fn with_audio_path(mut self, path: impl Into<String>) -> Self {
        self.set(AUDIO_PATH, path);
        self
    }

    /// Column names this row has a value for.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Ordered rows plus the union of their columns, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataTable {
    columns: Vec<String>,
    rows: Vec<MetadataRow>,
}

impl MetadataTable {
    /// Empty table with a fixed column order.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for c in columns {
            table.add_column(c.into());
        }
        table
    }

    /// Append a row. Columns the schema has not seen yet are appended to it.
    pub fn push(&mut self, row: MetadataRow) {
        let unseen: Vec<String> = row
            .columns()
            .filter(|c| !self.has_column(c))
            .map(str::to_owned)
            .collect();
        for c in unseen {
            self.add_column(c);
        }
        self.rows.push(row);
    }

    fn add_column(&mut self, column: String) {
        if !self.has_column(&column) {
            self.columns.push(column);
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    #[must_use]
    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A table with this table's schema and the given rows.
    #[must_use]
    pub fn with_rows(&self, rows: Vec<MetadataRow>) -> Self {
        let mut out = Self {
            columns: self.columns.clone(),
            rows: Vec::with_capacity(rows.len()),
        };
        for r in rows {
            out.push(r);
        }
        out
    }

    /// Cells of each row aligned to [`columns`](Self::columns); `None` where absent.
    pub fn records(&self) -> impl Iterator<Item = Vec<Option<&str>>> {
        self.rows
            .iter()
            .map(|r| self.columns.iter().map(|c| r.get(c)).collect())
    }

    /// Check that every column in `required` is part of the schema.
    ///
    /// # Errors
    /// [`Error::Schema`] naming `table` and the absent columns.
    pub fn require_columns(&self, table: &str, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| (*c).to_owned())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Schema {
                table: table.to_owned(),
                missing,
            })
        }
    }

    /// Concatenate tables in order. The result's schema is the union of the inputs'
    /// columns; rows from a table lacking a column keep that cell absent.
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut out = Self::default();
        for t in tables {
            for c in t.columns {
                out.add_column(c);
            }
            for r in t.rows {
                out.push(r);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(path: &str, spk: &str, src: &str) -> MetadataRow {
        MetadataRow::from_pairs([(AUDIO_PATH, path), (SPEAKER, spk), (AUDIO_SOURCE, src)])
    }

    #[test]
    fn push_extends_schema_in_first_seen_order() {
        let mut t = MetadataTable::new(REQUIRED_COLUMNS);
        let mut r = row("wavs/a.wav", "ann", "yt");
        r.set("text", "hello");
        t.push(r);
        assert_eq!(t.columns(), ["audio_path", "speaker", "audio_source", "text"]);
    }

    #[test]
    fn concat_unions_columns_and_keeps_absent_cells() {
        let mut a = MetadataTable::new(["audio_path", "speaker", "audio_source", "text"]);
        let mut r = row("a.wav", "ann", "yt");
        r.set("text", "hi");
        a.push(r);

        let mut b = MetadataTable::new(["audio_path", "speaker", "audio_source", "duration"]);
        let mut r = row("b.wav", "bob", "pod");
        r.set("duration", "1.5");
        b.push(r);

        let t = MetadataTable::concat([a, b]);
        assert_eq!(t.len(), 2);
        assert_eq!(
            t.columns(),
            ["audio_path", "speaker", "audio_source", "text", "duration"]
        );
        let records: Vec<_> = t.records().collect();
        assert_eq!(records[0][4], None);
        assert_eq!(records[1][3], None);
        assert_eq!(records[1][4], Some("1.5"));
    }

    #[test]
    fn require_columns_reports_every_missing_column() {
        let t = MetadataTable::new(["audio_path", "text"]);
        let err = t.require_columns("metadata.csv", &REQUIRED_COLUMNS).unwrap_err();
        match err {
            Error::Schema { missing, .. } => assert_eq!(missing, ["speaker", "audio_source"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn with_rows_keeps_schema_even_when_empty() {
        let t = MetadataTable::new(["audio_path", "speaker", "audio_source", "text"]);
        let empty = t.with_rows(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.columns().len(), 4);
    }
}
