//! Loading metadata tables from either layout.

use crate::error::{Error, Result};
use crate::io::{discover_shards, read_table};
use crate::layout::{FLAT_METADATA, METADATA_DIR};
use crate::table::{MetadataTable, REQUIRED_COLUMNS};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read `<root>/metadata.csv` and check its required columns.
///
/// # Errors
/// [`Error::Config`] if the file does not exist, [`Error::Schema`] if a required
/// column is absent, or the CSV reader's error.
pub fn load_flat(root: &Path) -> Result<MetadataTable> {
    let path = root.join(FLAT_METADATA);
    if !path.is_file() {
        return Err(Error::Config(format!(
            "{FLAT_METADATA} not found in {}",
            root.display()
        )));
    }
    let table = read_table(&path)?;
    table.require_columns(&path.display().to_string(), &REQUIRED_COLUMNS)?;
    info!("Loaded {} metadata rows from {}", table.len(), path.display());
    Ok(table)
}

/// A partitioned dataset's merged metadata.
#[derive(Clone, Debug)]
pub struct LoadedShards {
    pub table: MetadataTable,
    pub shards: Vec<PathBuf>,
}

/// Read and concatenate every shard under `<root>/metadata/`.
///
/// Shards are read in sorted path order; the merged schema is the union of the
/// shards' columns.
///
/// # Errors
/// [`Error::Config`] if the directory is missing or holds no shards,
/// [`Error::Schema`] if the merged table lacks a required column, or a reader error.
pub fn load_partitioned(root: &Path) -> Result<LoadedShards> {
    let meta_dir = root.join(METADATA_DIR);
    if !meta_dir.is_dir() {
        return Err(Error::Config(format!(
            "{METADATA_DIR}/ directory not found in {}",
            root.display()
        )));
    }
    let shards = discover_shards(&meta_dir)?;
    if shards.is_empty() {
        return Err(Error::Config(format!(
            "no metadata shards found in {}",
            meta_dir.display()
        )));
    }

    let mut tables = Vec::with_capacity(shards.len());
    for shard in &shards {
        let t = read_table(shard)?;
        debug!(shard = %shard.display(), rows = t.len(), "loaded shard");
        tables.push(t);
    }
    let table = MetadataTable::concat(tables);
    table.require_columns(&meta_dir.display().to_string(), &REQUIRED_COLUMNS)?;
    info!(
        "Loaded {} total metadata rows from {} shard file(s).",
        table.len(),
        shards.len()
    );
    Ok(LoadedShards { table, shards })
}

/// `true` if `a` and `b` name the same existing directory.
pub(crate) fn same_location(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn flat_requires_metadata_csv() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        assert!(matches!(load_flat(tmp.path()), Err(Error::Config(_))));
        Ok(())
    }

    #[test]
    fn flat_checks_required_columns() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::write(tmp.path().join("metadata.csv"), "audio_path,speaker\nwavs/a.wav,ann\n")?;
        let err = load_flat(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Schema { ref missing, .. } if missing == &["audio_source"]));
        Ok(())
    }

    #[test]
    fn partitioned_requires_shards() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        assert!(matches!(load_partitioned(tmp.path()), Err(Error::Config(_))));
        fs::create_dir_all(tmp.path().join("metadata"))?;
        assert!(matches!(load_partitioned(tmp.path()), Err(Error::Config(_))));
        Ok(())
    }

    #[test]
    fn partitioned_checks_required_columns() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let meta = tmp.path().join("metadata");
        fs::create_dir_all(&meta)?;
        fs::write(
            meta.join("yt_ann_batch_0001.csv"),
            "audio_path,speaker\naudio/yt/ann/batch_0001/a.wav,ann\n",
        )?;
        let err = load_partitioned(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Schema { ref missing, .. } if missing == &["audio_source"]));
        Ok(())
    }

    #[test]
    fn partitioned_merges_shards_with_different_columns() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let meta = tmp.path().join("metadata");
        fs::create_dir_all(&meta)?;
        fs::write(
            meta.join("yt_ann_batch_0001.csv"),
            "audio_path,speaker,audio_source,text\naudio/yt/ann/batch_0001/a.wav,ann,yt,hi\n",
        )?;
        fs::write(
            meta.join("yt_bob_batch_0001.csv"),
            "audio_path,speaker,audio_source,duration\naudio/yt/bob/batch_0001/b.wav,bob,yt,2.5\n",
        )?;

        let loaded = load_partitioned(tmp.path())?;
        assert_eq!(loaded.shards.len(), 2);
        assert_eq!(loaded.table.len(), 2);
        assert!(loaded.table.has_column("text") && loaded.table.has_column("duration"));
        Ok(())
    }
}
