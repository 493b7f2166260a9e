//! Grouping rows by (source, speaker) and cutting groups into batches.
//!
//! Auto-numbered batches continue from the highest `batch_NNNN` directory already
//! present for the group, so repeated packs into one output root never reuse a
//! number. The directory scan is a separate step ([`existing_batch_labels`]) from
//! the numbering rule ([`next_batch_number`]) so the rule can be exercised without
//! a filesystem.
//!
//! Numbering assumes a single writer per output root; two concurrent packs into
//! the same (source, speaker) partition can pick the same number.

use crate::error::{Error, Result};
use crate::layout::speaker_dir;
use crate::table::{MetadataRow, MetadataTable};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::num::{IntErrorKind, NonZeroUsize};
use std::path::Path;

/// Prefix of auto-generated batch directory names.
pub const BATCH_PREFIX: &str = "batch_";

/// Rows per auto-numbered batch when nothing else is configured.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Label of one batch partition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BatchLabel {
    /// User-supplied label, used verbatim.
    Explicit(String),
    /// Auto-generated `batch_NNNN`.
    Auto(u64),
}

impl fmt::Display for BatchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(s) => f.write_str(s),
            Self::Auto(n) => write!(f, "{BATCH_PREFIX}{n:04}"),
        }
    }
}

/// How a group is cut into batches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchStrategy {
    /// The whole group becomes one batch under this label.
    Explicit(String),
    /// Consecutive chunks of at most this many rows, auto-numbered.
    MaxRows(NonZeroUsize),
}

impl Default for BatchStrategy {
    fn default() -> Self {
        Self::MaxRows(NonZeroUsize::new(DEFAULT_MAX_ROWS).unwrap_or(NonZeroUsize::MIN))
    }
}

impl BatchStrategy {
    /// Strategy from the CLI pair: an explicit label wins over `max_rows`.
    ///
    /// # Errors
    /// [`Error::Config`] when `max_rows` is zero (and no label is given), or the
    /// label is empty or contains a path separator.
    pub fn from_options(label: Option<&str>, max_rows: usize) -> Result<Self> {
        match label {
            Some(l) => {
                let l = l.trim();
                if l.is_empty() || l.contains(['/', '\\']) || l == "." || l == ".." {
                    return Err(Error::Config(format!(
                        "batch label {l:?} is not a valid directory name"
                    )));
                }
                Ok(Self::Explicit(l.to_owned()))
            }
            None => NonZeroUsize::new(max_rows)
                .map(Self::MaxRows)
                .ok_or_else(|| Error::Config("--max-rows must be a positive integer".into())),
        }
    }

    /// `true` when batches are auto-numbered.
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::MaxRows(_))
    }
}

/// Numeric suffix of an auto-style label: `batch_0007` is 7.
///
/// The suffix is whatever follows the last `_`, so a label such as
/// `batch_2026_01` counts as 1. Names without the prefix, or with a non-numeric
/// suffix, yield `Ok(None)`.
///
/// # Errors
/// [`Error::Config`] when the suffix is numeric but does not fit in a `u64`.
pub fn parse_batch_number(label: &str) -> Result<Option<u64>> {
    if !label.starts_with(BATCH_PREFIX) {
        return Ok(None);
    }
    let suffix = label.rsplit('_').next().unwrap_or_default();
    match suffix.parse::<u64>() {
        Ok(n) => Ok(Some(n)),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Err(Error::Config(format!(
            "batch number in {label:?} is too large"
        ))),
        Err(_) => Ok(None),
    }
}

/// First free batch number given the labels already in use for a group.
///
/// ```
/// use audiopack::batching::next_batch_number;
///
/// # fn main() -> audiopack::Result<()> {
/// assert_eq!(next_batch_number(Vec::<String>::new())?, 1);
/// assert_eq!(next_batch_number(["batch_0001", "batch_0003", "notes"])?, 4);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// [`Error::Config`] when a label's number does not fit in a `u64`, or the
/// highest number in use is already `u64::MAX`.
pub fn next_batch_number<I, S>(existing_labels: I) -> Result<u64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut max = 0;
    for label in existing_labels {
        if let Some(n) = parse_batch_number(label.as_ref())? {
            max = max.max(n);
        }
    }
    max.checked_add(1)
        .ok_or_else(|| Error::Config(format!("no batch number left after {BATCH_PREFIX}{max}")))
}

/// Names of the batch directories under `<output>/audio/<source>/<speaker>/`.
///
/// A missing tree is not an error; it simply has no batches yet.
///
/// # Errors
/// Any I/O failure other than the directory not existing.
pub fn existing_batch_labels(
    output_root: &Path,
    source_segment: &str,
    speaker_segment: &str,
) -> Result<Vec<String>> {
    let dir = speaker_dir(output_root, source_segment, speaker_segment);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(dir, e)),
    };
    let mut labels = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&dir, e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| Error::io(entry.path(), e))?
            .is_dir();
        if is_dir {
            labels.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    labels.sort();
    Ok(labels)
}

/// Rows sharing one raw (audio_source, speaker) pair, in table order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowGroup {
    pub audio_source: String,
    pub speaker: String,
    pub rows: Vec<MetadataRow>,
}

/// Group rows by their raw (audio_source, speaker) values.
///
/// Groups come out ordered by key; rows keep their table order inside a group.
#[must_use]
pub fn group_rows(table: &MetadataTable) -> Vec<RowGroup> {
    let mut groups: BTreeMap<(&str, &str), Vec<MetadataRow>> = BTreeMap::new();
    for row in table.rows() {
        groups
            .entry((row.audio_source(), row.speaker()))
            .or_default()
            .push(row.clone());
    }
    groups
        .into_iter()
        .map(|((src, spk), rows)| RowGroup {
            audio_source: src.to_owned(),
            speaker: spk.to_owned(),
            rows,
        })
        .collect()
}

/// Cut a group's rows into labelled batches.
///
/// `start` is the first auto number for this group and is ignored for an
/// explicit label. An empty row slice yields no batches.
///
/// # Errors
/// [`Error::Config`] when the group needs numbers past `u64::MAX`.
pub fn split_rows<'a>(
    rows: &'a [MetadataRow],
    strategy: &BatchStrategy,
    start: u64,
) -> Result<Vec<(BatchLabel, &'a [MetadataRow])>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    match strategy {
        BatchStrategy::Explicit(label) => Ok(vec![(BatchLabel::Explicit(label.clone()), rows)]),
        BatchStrategy::MaxRows(max) => {
            let mut out = Vec::new();
            let mut next = Some(start);
            for chunk in rows.chunks(max.get()) {
                let n = next.ok_or_else(|| {
                    Error::Config(format!("batch numbers past {BATCH_PREFIX}{} overflow", u64::MAX))
                })?;
                out.push((BatchLabel::Auto(n), chunk));
                next = n.checked_add(1);
            }
            Ok(out)
        }
    }
}
