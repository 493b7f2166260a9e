//! Row selection for unpack.
//!
//! Predicates combine with AND. Speaker and source compare case-insensitively
//! against the raw column values; the batch predicate matches the label as a whole
//! path segment of `audio_path` (`/batch_0002/`), so `batch_0002` never selects
//! rows from `batch_00020`.

use crate::error::{Error, Result};
use crate::table::{MetadataRow, MetadataTable};

/// Optional unpack filters; `None` matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub speaker: Option<String>,
    pub audio_source: Option<String>,
    pub batch: Option<String>,
}

impl RowFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    #[must_use]
    pub fn audio_source(mut self, audio_source: impl Into<String>) -> Self {
        self.audio_source = Some(audio_source.into());
        self
    }

    #[must_use]
    pub fn batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = Some(batch.into());
        self
    }

    /// `true` when no predicate is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.speaker.is_none() && self.audio_source.is_none() && self.batch.is_none()
    }

    #[must_use]
    pub fn matches(&self, row: &MetadataRow) -> bool {
        let eq_ci = |want: &Option<String>, have: &str| {
            want.as_deref()
                .is_none_or(|w| w.to_lowercase() == have.to_lowercase())
        };
        eq_ci(&self.speaker, row.speaker())
            && eq_ci(&self.audio_source, row.audio_source())
            && self
                .batch
                .as_deref()
                .is_none_or(|b| row.audio_path().contains(&format!("/{b}/")))
    }

    /// Keep the matching rows, preserving order and schema.
    ///
    /// # Errors
    /// [`Error::NoMatch`] when nothing is left.
    pub fn apply(&self, table: &MetadataTable) -> Result<MetadataTable> {
        let kept: Vec<MetadataRow> = table
            .rows()
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        if kept.is_empty() {
            return Err(Error::NoMatch(self.describe()));
        }
        Ok(table.with_rows(kept))
    }

    /// Human-readable summary, e.g. `speaker="ann" audio_source=* batch=*`.
    #[must_use]
    pub fn describe(&self) -> String {
        let show = |v: &Option<String>| v.as_ref().map_or_else(|| "*".to_owned(), |s| format!("{s:?}"));
        format!(
            "speaker={} audio_source={} batch={}",
            show(&self.speaker),
            show(&self.audio_source),
            show(&self.batch)
        )
    }
}
