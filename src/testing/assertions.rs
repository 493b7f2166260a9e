//! Assertion helpers for comparing datasets across runs.

use crate::error::{Error, Result};
use crate::layout::file_name_of;
use crate::table::MetadataTable;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// `(file name, speaker, audio_source)` of every row, sorted.
#[must_use]
pub fn row_identities(table: &MetadataTable) -> Vec<(String, String, String)> {
    let mut ids: Vec<_> = table
        .rows()
        .iter()
        .map(|r| {
            (
                file_name_of(r.audio_path()).to_owned(),
                r.speaker().to_owned(),
                r.audio_source().to_owned(),
            )
        })
        .collect();
    ids.sort();
    ids
}

/// Assert two tables hold the same rows up to the `audio_path` prefix.
///
/// # Panics
///
/// Panics if the row counts or any (file name, speaker, audio_source) differ.
pub fn assert_same_rows_modulo_prefix(expected: &MetadataTable, actual: &MetadataTable) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "row count mismatch:\n  Expected: {}\n  Actual: {}",
        expected.len(),
        actual.len()
    );
    assert_eq!(row_identities(actual), row_identities(expected));
}

/// Every file and directory below `root`, relative to it.
///
/// Symlinks are recorded but not followed.
///
/// # Errors
/// Returns an error if a directory cannot be listed.
pub fn snapshot_tree(root: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut out = BTreeSet::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            Error::io(path, e.into())
        })?;
        if let Ok(rel) = entry.path().strip_prefix(root) {
            out.insert(rel.to_path_buf());
        }
    }
    Ok(out)
}
