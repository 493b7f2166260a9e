//! File globbing for shard discovery.
//!
//! Shard names embed raw path segments (sanitized source and speaker names), so
//! directory components are escaped with [`glob::Pattern::escape`] before the
//! wildcard part is appended.

use crate::error::{Error, Result};
use glob::{Pattern, glob};
use std::path::{Path, PathBuf};

/// Expand a glob pattern into a sorted vector of matching file paths.
///
/// Directories that match are skipped. An empty result is not an error.
///
/// # Errors
/// Returns an error if the pattern is invalid or a matched entry cannot be read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).map_err(|source| Error::Pattern {
        pattern: pattern.to_owned(),
        source,
    })?;

    let mut result = Vec::new();
    for entry in paths {
        let path = entry?;
        if path.is_file() {
            result.push(path);
        }
    }

    // Sort for deterministic order
    result.sort();
    Ok(result)
}

/// Files directly under `dir` whose name ends with `.{ext}`, sorted.
///
/// # Errors
/// See [`expand_glob`].
pub fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(ext)
    );
    expand_glob(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn matches_only_files_with_the_extension() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let dir = tmp.path().join("meta [v1]");
        fs::create_dir_all(dir.join("sub.parquet"))?;
        fs::write(dir.join("b.parquet"), b"")?;
        fs::write(dir.join("a.parquet"), b"")?;
        fs::write(dir.join("c.csv"), b"")?;

        let found = files_with_extension(&dir, "parquet")?;
        assert_eq!(found, vec![dir.join("a.parquet"), dir.join("b.parquet")]);
        Ok(())
    }

    #[test]
    fn missing_directory_yields_nothing() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        assert!(files_with_extension(&tmp.path().join("nope"), "csv")?.is_empty());
        Ok(())
    }
}
