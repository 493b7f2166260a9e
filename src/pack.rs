//! Flat to partitioned conversion.
//!
//! Rows are grouped by raw (audio_source, speaker), cut into batches, and each
//! batch becomes one directory of audio files plus one metadata shard:
//!
//! ```text
//! <output>/audio/<source>/<speaker>/<batch>/<file>
//! <output>/metadata/<source>_<speaker>_<batch>.<ext>
//! ```
//!
//! Rows whose audio file is missing from `<source>/wavs/` are still written to
//! their batch's shard with the original `audio_path`, and counted as skipped.

use crate::batching::{
    BatchStrategy, DEFAULT_MAX_ROWS, existing_batch_labels, group_rows, next_batch_number,
    split_rows,
};
use crate::error::{Error, Result};
use crate::executor::{DryRunExecutor, FsExecutor, execute};
use crate::io::ShardFormat;
use crate::layout::{BatchKey, WAVS_DIR, sanitize_segment};
use crate::loader::{load_flat, same_location};
use crate::plan::{CopyPlan, Direction, FileProbe, FsProbe, ShardWrite, map_pack_row};
use crate::report::RunReport;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Settings for one pack run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackOptions {
    /// Flat dataset root holding `metadata.csv` and `wavs/`.
    pub source: PathBuf,
    /// Partitioned dataset root.
    pub output: PathBuf,
    /// Explicit batch label; disables auto-numbering and `max_rows`.
    pub batch_label: Option<String>,
    /// Rows per auto-numbered batch.
    pub max_rows: usize,
    pub shard_format: ShardFormat,
    pub dry_run: bool,
}

impl PackOptions {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            batch_label: None,
            max_rows: DEFAULT_MAX_ROWS,
            shard_format: ShardFormat::default(),
            dry_run: false,
        }
    }

    #[must_use]
    pub fn batch_label(mut self, label: impl Into<String>) -> Self {
        self.batch_label = Some(label.into());
        self
    }

    #[must_use]
    pub const fn max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    #[must_use]
    pub const fn shard_format(mut self, format: ShardFormat) -> Self {
        self.shard_format = format;
        self
    }

    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Batch strategy implied by `batch_label` and `max_rows`.
    ///
    /// # Errors
    /// See [`BatchStrategy::from_options`].
    pub fn strategy(&self) -> Result<BatchStrategy> {
        BatchStrategy::from_options(self.batch_label.as_deref(), self.max_rows)
    }
}

/// Compute everything a pack run would do, without writing anything.
///
/// Auto batch numbers continue from the batch directories already under the
/// output root, and from batches assigned earlier in this plan to the same
/// sanitized (source, speaker) partition.
///
/// # Errors
/// [`Error::Config`] for a missing `metadata.csv` or `wavs/`, an unusable batch
/// option, an output root equal to the source, or batch numbers that would
/// overflow; [`Error::Schema`] for missing required columns; I/O errors from
/// scanning the output tree.
pub fn plan_pack(opts: &PackOptions, probe: &impl FileProbe) -> Result<CopyPlan> {
    let strategy = opts.strategy()?;
    if same_location(&opts.source, &opts.output) {
        return Err(Error::Config(format!(
            "output {} must differ from the source root",
            opts.output.display()
        )));
    }
    let table = load_flat(&opts.source)?;
    let wavs_dir = opts.source.join(WAVS_DIR);
    if !wavs_dir.is_dir() {
        return Err(Error::Config(format!(
            "{WAVS_DIR}/ directory not found inside {}",
            opts.source.display()
        )));
    }

    let mut plan = CopyPlan::new(Direction::Pack);
    // Labels in use per sanitized (source, speaker): on disk plus assigned by this plan.
    let mut used_labels: HashMap<(String, String), Vec<String>> = HashMap::new();
    let mut raw_names: HashMap<(String, String), (String, String)> = HashMap::new();

    for group in group_rows(&table) {
        let segments = (
            sanitize_segment(&group.audio_source),
            sanitize_segment(&group.speaker),
        );
        let raw = (group.audio_source.clone(), group.speaker.clone());
        match raw_names.get(&segments) {
            Some(first) if *first != raw => warn!(
                "audio_source/speaker {:?}/{:?} and {:?}/{:?} share partition audio/{}/{}",
                first.0, first.1, raw.0, raw.1, segments.0, segments.1
            ),
            Some(_) => {}
            None => {
                raw_names.insert(segments.clone(), raw);
            }
        }

        let start = if strategy.is_auto() {
            if !used_labels.contains_key(&segments) {
                let on_disk = existing_batch_labels(&opts.output, &segments.0, &segments.1)?;
                used_labels.insert(segments.clone(), on_disk);
            }
            next_batch_number(used_labels.get(&segments).into_iter().flatten())?
        } else {
            0
        };

        for (label, rows) in split_rows(&group.rows, &strategy, start)? {
            let label = label.to_string();
            let key = BatchKey::new(&group.audio_source, &group.speaker, label.clone());

            let mut mapped = Vec::with_capacity(rows.len());
            for row in rows {
                let (new_row, action) = map_pack_row(row, &key, &wavs_dir, &opts.output, probe);
                plan.record(action);
                mapped.push(new_row);
            }

            if strategy.is_auto() {
                used_labels.entry(segments.clone()).or_default().push(label);
            }
            plan.push_shard(ShardWrite {
                path: key.shard_path(&opts.output, opts.shard_format),
                format: opts.shard_format,
                table: table.with_rows(mapped),
            });
        }
    }
    Ok(plan)
}

/// Pack a flat dataset into the partitioned layout.
///
/// With `dry_run` set, the same plan is computed and logged but nothing is written.
///
/// # Errors
/// Any pre-flight error from [`plan_pack`] (raised before the first write), or the
/// first I/O or storage error while materializing.
pub fn pack(opts: &PackOptions) -> Result<RunReport> {
    info!("Source      : {}", opts.source.display());
    info!("Output      : {}", opts.output.display());
    match &opts.batch_label {
        Some(label) => info!("Batch mode  : EXPLICIT ({label})"),
        None => info!(
            "Batch mode  : AUTO-INCREMENTAL (max {} rows per batch)",
            opts.max_rows
        ),
    }
    info!("Shard format: {}", opts.shard_format);
    info!("Dry-run     : {}", opts.dry_run);

    let plan = plan_pack(opts, &FsProbe)?;
    let report = if opts.dry_run {
        execute(&plan, &mut DryRunExecutor::new())?
    } else {
        execute(&plan, &mut FsExecutor)?
    };
    report.log_summary();
    Ok(report)
}
