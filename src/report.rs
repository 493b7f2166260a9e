//! End-of-run summary.
//!
//! A [`RunReport`] tallies what a run did (or, for a dry run, would have done).
//! It is logged through `tracing` and can be saved as JSON so operators can script
//! a follow-up fetch of the files listed in [`RunReport::missing`].

use crate::error::{Error, Result};
use crate::plan::{Direction, MissingFile};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Counts and missing-file list for one pack or unpack run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub direction: Direction,
    pub dry_run: bool,
    /// Metadata rows written across all tables.
    pub rows: usize,
    pub files_copied: usize,
    pub files_missing: usize,
    pub shards_written: usize,
    pub missing: Vec<MissingFile>,
}

impl RunReport {
    #[must_use]
    pub const fn new(direction: Direction, dry_run: bool) -> Self {
        Self {
            direction,
            dry_run,
            rows: 0,
            files_copied: 0,
            files_missing: 0,
            shards_written: 0,
            missing: Vec::new(),
        }
    }

    /// Emit the closing summary lines.
    pub fn log_summary(&self) {
        let verb = match self.direction {
            Direction::Pack => "Moved",
            Direction::Unpack => "Copied",
        };
        let noun = match self.direction {
            Direction::Pack => "Skipped",
            Direction::Unpack => "Missing",
        };
        if self.dry_run {
            info!(
                "[DRY] Would write {} metadata table(s) ({} rows); {verb} {} wav files  |  {noun} {}",
                self.shards_written, self.rows, self.files_copied, self.files_missing
            );
            info!("[DONE] Dry-run complete - no files were changed.");
            return;
        }
        info!(
            "[DONE] {verb} {} wav files  |  {noun} {}  |  {} metadata table(s), {} rows",
            self.files_copied, self.files_missing, self.shards_written, self.rows
        );
        if self.direction == Direction::Unpack && self.files_missing > 0 {
            warn!("[HINT] Fetch the missing files (e.g. `dvc pull`) and re-run unpack.");
        }
    }

    /// Save the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.write_all(b"\n").map_err(|e| Error::io(path, e))?;
        w.flush().map_err(|e| Error::io(path, e))?;
        Ok(())
    }
}
