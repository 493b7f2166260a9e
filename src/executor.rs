//! Carrying out a [`CopyPlan`].
//!
//! [`execute`] walks the plan in a fixed order (missing-file warnings, audio copies,
//! then metadata shards) and hands each step to an [`Executor`]. [`FsExecutor`]
//! touches the filesystem; [`DryRunExecutor`] only logs and records. Both see the
//! exact same plan.
//!
//! A failure part-way leaves already copied files and written shards in place.

use crate::error::{Error, Result};
use crate::io::write_table;
use crate::plan::{CopyInstruction, CopyPlan, MissingFile, ShardWrite};
use crate::report::RunReport;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of one planned copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Copied, or would have been in a dry run.
    Copied,
    /// The source disappeared between planning and copying.
    Missing,
}

/// Performs (or simulates) the side effects of a plan.
pub trait Executor {
    /// `true` if this executor never mutates the filesystem.
    fn is_dry_run(&self) -> bool;

    /// Copy one audio file, creating the destination directory as needed.
    ///
    /// # Errors
    /// I/O failures other than a missing source.
    fn copy_file(&mut self, copy: &CopyInstruction) -> Result<CopyOutcome>;

    /// Write one metadata table; returns the row count.
    ///
    /// # Errors
    /// Storage failures from the table codec.
    fn write_shard(&mut self, shard: &ShardWrite) -> Result<usize>;
}

/// Executor that copies files and writes tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsExecutor;

impl Executor for FsExecutor {
    fn is_dry_run(&self) -> bool {
        false
    }

    fn copy_file(&mut self, copy: &CopyInstruction) -> Result<CopyOutcome> {
        if !copy.source.is_file() {
            return Ok(CopyOutcome::Missing);
        }
        if let Some(parent) = copy.destination.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        copy_preserving_metadata(&copy.source, &copy.destination)
            .map_err(|e| Error::io(&copy.destination, e))?;
        debug!(src = %copy.source.display(), dest = %copy.destination.display(), "copied");
        Ok(CopyOutcome::Copied)
    }

    fn write_shard(&mut self, shard: &ShardWrite) -> Result<usize> {
        let rows = write_table(&shard.path, shard.format, &shard.table)?;
        info!("Saved metadata: {}  ({rows} rows)", shard.path.display());
        Ok(rows)
    }
}

/// Copy bytes, then access/modification times, then permission bits.
///
/// Permissions go last so a read-only source does not block setting the times.
fn copy_preserving_metadata(src: &Path, dst: &Path) -> io::Result<()> {
    let mut reader = File::open(src)?;
    let meta = reader.metadata()?;
    let mut writer = File::create(dst)?;
    io::copy(&mut reader, &mut writer)?;

    let mut times = FileTimes::new();
    if let Ok(t) = meta.modified() {
        times = times.set_modified(t);
    }
    if let Ok(t) = meta.accessed() {
        times = times.set_accessed(t);
    }
    writer.set_times(times)?;
    drop(writer);

    fs::set_permissions(dst, meta.permissions())
}

/// One step a dry run would have taken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DryRunAction {
    Copy(CopyInstruction),
    WriteShard { path: PathBuf, rows: usize },
}

/// Executor that logs each step and records it, without touching the filesystem.
#[derive(Clone, Debug, Default)]
pub struct DryRunExecutor {
    actions: Vec<DryRunAction>,
}

impl DryRunExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps recorded so far, in execution order.
    #[must_use]
    pub fn actions(&self) -> &[DryRunAction] {
        &self.actions
    }
}

impl Executor for DryRunExecutor {
    fn is_dry_run(&self) -> bool {
        true
    }

    fn copy_file(&mut self, copy: &CopyInstruction) -> Result<CopyOutcome> {
        info!("  [DRY] {}  ->  {}", copy.source.display(), copy.destination.display());
        self.actions.push(DryRunAction::Copy(copy.clone()));
        Ok(CopyOutcome::Copied)
    }

    fn write_shard(&mut self, shard: &ShardWrite) -> Result<usize> {
        let rows = shard.table.len();
        info!("  [DRY] metadata -> {}  ({rows} rows)", shard.path.display());
        self.actions.push(DryRunAction::WriteShard {
            path: shard.path.clone(),
            rows,
        });
        Ok(rows)
    }
}

/// Run `plan` through `executor` and tally the outcome.
///
/// # Errors
/// The first fatal error from the executor; earlier steps are not rolled back.
pub fn execute(plan: &CopyPlan, executor: &mut dyn Executor) -> Result<RunReport> {
    let mut report = RunReport::new(plan.direction, executor.is_dry_run());

    for m in &plan.missing {
        warn!("Missing audio file, keeping reference {:?}: {}", m.audio_path, m.expected.display());
        report.missing.push(m.clone());
    }

    for copy in &plan.copies {
        match executor.copy_file(copy)? {
            CopyOutcome::Copied => report.files_copied += 1,
            CopyOutcome::Missing => {
                warn!("Audio file vanished before copy: {}", copy.source.display());
                report.missing.push(MissingFile {
                    audio_path: copy.source.display().to_string(),
                    expected: copy.source.clone(),
                });
            }
        }
    }

    for shard in &plan.shards {
        report.rows += executor.write_shard(shard)?;
        report.shards_written += 1;
    }

    report.files_missing = report.missing.len();
    Ok(report)
}
