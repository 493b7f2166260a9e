//! Partitioned to flat conversion.
//!
//! All shards under `<dataset>/metadata/` are merged, filtered, and written back as
//! a single `<output>/metadata.csv` with audio copied to `<output>/wavs/`.

use crate::error::{Error, Result};
use crate::executor::{DryRunExecutor, FsExecutor, execute};
use crate::filter::RowFilter;
use crate::io::ShardFormat;
use crate::layout::FLAT_METADATA;
use crate::loader::{load_partitioned, same_location};
use crate::plan::{CopyPlan, Direction, FileProbe, FsProbe, RowAction, ShardWrite, map_unpack_row};
use crate::report::RunReport;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Settings for one unpack run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnpackOptions {
    /// Partitioned dataset root holding `metadata/` and `audio/`.
    pub dataset: PathBuf,
    /// Flat output root.
    pub output: PathBuf,
    pub filter: RowFilter,
    pub dry_run: bool,
}

impl UnpackOptions {
    pub fn new(dataset: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            output: output.into(),
            filter: RowFilter::default(),
            dry_run: false,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: RowFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Compute everything an unpack run would do, without writing anything.
///
/// # Errors
/// [`Error::Config`] for a missing `metadata/` directory, no shards, or an output
/// root equal to the dataset; [`Error::Schema`] for missing required columns;
/// [`Error::NoMatch`] when the filters leave no rows.
pub fn plan_unpack(opts: &UnpackOptions, probe: &impl FileProbe) -> Result<CopyPlan> {
    if same_location(&opts.dataset, &opts.output) {
        return Err(Error::Config(format!(
            "output {} must differ from the dataset root",
            opts.output.display()
        )));
    }
    let loaded = load_partitioned(&opts.dataset)?;
    let selected = opts.filter.apply(&loaded.table)?;
    info!(
        "After filters: {} rows  (was {})",
        selected.len(),
        loaded.table.len()
    );

    let mut plan = CopyPlan::new(Direction::Unpack);
    let mut destinations: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut mapped = Vec::with_capacity(selected.len());
    for row in selected.rows() {
        let (new_row, action) = map_unpack_row(row, &opts.dataset, &opts.output, probe);
        if let RowAction::Copy(copy) = &action
            && let Some(earlier) = destinations.insert(copy.destination.clone(), copy.source.clone())
        {
            warn!(
                "{} and {} both flatten to {}; the later copy wins",
                earlier.display(),
                copy.source.display(),
                copy.destination.display()
            );
        }
        plan.record(action);
        mapped.push(new_row);
    }

    plan.push_shard(ShardWrite {
        path: opts.output.join(FLAT_METADATA),
        format: ShardFormat::Csv,
        table: selected.with_rows(mapped),
    });
    Ok(plan)
}

/// Unpack a partitioned dataset into the flat layout.
///
/// With `dry_run` set, the same plan is computed and logged but nothing is written.
///
/// # Errors
/// Any pre-flight error from [`plan_unpack`] (raised before the first write), or the
/// first I/O or storage error while materializing.
pub fn unpack(opts: &UnpackOptions) -> Result<RunReport> {
    info!("Dataset dir : {}", opts.dataset.display());
    info!("Output dir  : {}", opts.output.display());
    info!("Filters     : {}", opts.filter.describe());
    info!("Dry-run     : {}", opts.dry_run);

    let plan = plan_unpack(opts, &FsProbe)?;
    let report = if opts.dry_run {
        execute(&plan, &mut DryRunExecutor::new())?
    } else {
        execute(&plan, &mut FsExecutor)?
    };
    report.log_summary();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{AUDIO_PATH, AUDIO_SOURCE, MetadataRow, MetadataTable, SPEAKER};
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;

    fn write_shards(root: &Path) -> anyhow::Result<()> {
        let mut t = MetadataTable::new([AUDIO_PATH, SPEAKER, AUDIO_SOURCE]);
        for (p, spk, src) in [
            ("audio/yt/ann/batch_0001/a.wav", "Ann", "YT"),
            ("audio/yt/ann/batch_0002/b.wav", "Ann", "YT"),
            ("audio/pod/bob/batch_0001/c.wav", "Bob", "Pod"),
        ] {
            t.push(MetadataRow::from_pairs([(AUDIO_PATH, p), (SPEAKER, spk), (AUDIO_SOURCE, src)]));
        }
        crate::io::csv::write_table_csv(root.join("metadata/all.csv"), &t)?;
        Ok(())
    }

    #[test]
    fn plan_flattens_selected_rows() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let ds = tmp.path().join("ds");
        write_shards(&ds)?;
        let probe: HashSet<PathBuf> = [
            ds.join("audio/yt/ann/batch_0001/a.wav"),
            ds.join("audio/yt/ann/batch_0002/b.wav"),
        ]
        .into();

        let opts = UnpackOptions::new(&ds, tmp.path().join("flat"))
            .filter(RowFilter::new().speaker("ann"));
        let plan = plan_unpack(&opts, &probe)?;
        assert_eq!(plan.copies.len(), 2);
        assert_eq!(plan.shards.len(), 1);
        assert_eq!(plan.shards[0].path, tmp.path().join("flat/metadata.csv"));
        let paths: Vec<&str> = plan.shards[0].table.rows().iter().map(|r| r.audio_path()).collect();
        assert_eq!(paths, ["wavs/a.wav", "wavs/b.wav"]);
        Ok(())
    }

    #[test]
    fn missing_audio_keeps_partitioned_reference() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let ds = tmp.path().join("ds");
        write_shards(&ds)?;
        let opts = UnpackOptions::new(&ds, tmp.path().join("flat"))
            .filter(RowFilter::new().audio_source("pod"));
        let plan = plan_unpack(&opts, &HashSet::<PathBuf>::new())?;
        assert!(plan.copies.is_empty());
        assert_eq!(plan.missing.len(), 1);
        assert_eq!(
            plan.shards[0].table.rows()[0].audio_path(),
            "audio/pod/bob/batch_0001/c.wav"
        );
        Ok(())
    }

    #[test]
    fn empty_selection_fails_before_any_write() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let ds = tmp.path().join("ds");
        write_shards(&ds)?;
        let flat = tmp.path().join("flat");
        let opts = UnpackOptions::new(&ds, &flat).filter(RowFilter::new().batch("batch_0009"));
        assert!(matches!(unpack(&opts), Err(Error::NoMatch(_))));
        assert!(!flat.exists());
        Ok(())
    }

    #[test]
    fn missing_metadata_dir_is_a_config_error() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::create_dir_all(tmp.path().join("ds/audio"))?;
        let opts = UnpackOptions::new(tmp.path().join("ds"), tmp.path().join("flat"));
        assert!(matches!(plan_unpack(&opts, &FsProbe), Err(Error::Config(_))));
        Ok(())
    }
}
