//! The copy plan shared by real and dry runs.
//!
//! Both pipelines first compute a [`CopyPlan`]: the rewritten metadata shards to
//! write, the audio files to copy, and the referenced files that are missing. An
//! [`Executor`](crate::executor::Executor) then either performs or only logs the
//! plan, so a dry run selects exactly what a real run would.
//!
//! Row mapping is a pure function per row ([`map_pack_row`], [`map_unpack_row`]);
//! the only outside input is a [`FileProbe`] answering "does this source file exist".

use crate::io::ShardFormat;
use crate::layout::{BatchKey, WAVS_DIR, file_name_of, flat_audio_path};
use crate::table::{MetadataRow, MetadataTable};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which way a run converts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Flat to partitioned.
    Pack,
    /// Partitioned to flat.
    Unpack,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pack => "pack",
            Self::Unpack => "unpack",
        })
    }
}

/// Copy one audio file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CopyInstruction {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// A referenced audio file that was not found. The row is kept with its
/// reference unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MissingFile {
    /// The row's `audio_path` as stored.
    pub audio_path: String,
    /// Where the file was looked for.
    pub expected: PathBuf,
}

/// What happens to a row's audio file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowAction {
    Copy(CopyInstruction),
    Missing(MissingFile),
}

/// One metadata table to write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardWrite {
    pub path: PathBuf,
    pub format: ShardFormat,
    pub table: MetadataTable,
}

/// Everything a run will do, computed before anything is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyPlan {
    pub direction: Direction,
    pub copies: Vec<CopyInstruction>,
    pub shards: Vec<ShardWrite>,
    pub missing: Vec<MissingFile>,
}

impl CopyPlan {
    #[must_use]
    pub const fn new(direction: Direction) -> Self {
        Self {
            direction,
            copies: Vec::new(),
            shards: Vec::new(),
            missing: Vec::new(),
        }
    }

    /// Record the action for one mapped row.
    pub fn record(&mut self, action: RowAction) {
        match action {
            RowAction::Copy(c) => self.copies.push(c),
            RowAction::Missing(m) => self.missing.push(m),
        }
    }

    /// Add a shard, merging rows into an existing shard with the same path.
    ///
    /// Distinct raw names that sanitize to the same segments produce the same shard
    /// path; merging keeps every row instead of letting the later write win.
    pub fn push_shard(&mut self, shard: ShardWrite) {
        if let Some(existing) = self.shards.iter_mut().find(|s| s.path == shard.path) {
            existing.table = MetadataTable::concat([existing.table.clone(), shard.table]);
        } else {
            self.shards.push(shard);
        }
    }

    /// Total rows across all shards.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.shards.iter().map(|s| s.table.len()).sum()
    }
}

/// Existence check for planned copy sources.
pub trait FileProbe {
    fn is_file(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// A fixed set of paths that "exist".
impl FileProbe for HashSet<PathBuf> {
    fn is_file(&self, path: &Path) -> bool {
        self.contains(path)
    }
}

/// Map a flat row into `batch`.
///
/// The file is looked up by name under `wavs_dir`. When present, the row's
/// `audio_path` becomes the partitioned reference and a copy into the batch's
/// partition directory is planned. When absent the row is returned unchanged.
pub fn map_pack_row(
    row: &MetadataRow,
    batch: &BatchKey,
    wavs_dir: &Path,
    output_root: &Path,
    probe: &impl FileProbe,
) -> (MetadataRow, RowAction) {
    let file_name = file_name_of(row.audio_path());
    let source = wavs_dir.join(file_name);
    if !probe.is_file(&source) {
        let missing = MissingFile {
            audio_path: row.audio_path().to_owned(),
            expected: source,
        };
        return (row.clone(), RowAction::Missing(missing));
    }
    let copy = CopyInstruction {
        destination: batch.partition_dir(output_root).join(file_name),
        source,
    };
    let mapped = row.clone().with_audio_path(batch.audio_rel_path(file_name));
    (mapped, RowAction::Copy(copy))
}

/// Map a partitioned row into the flat layout.
///
/// The source is `<dataset_root>/<audio_path>`. When present the row's
/// `audio_path` becomes `wavs/<file>` and a copy to `<output>/wavs/<file>` is
/// planned. When absent the partitioned reference is kept.
pub fn map_unpack_row(
    row: &MetadataRow,
    dataset_root: &Path,
    output_root: &Path,
    probe: &impl FileProbe,
) -> (MetadataRow, RowAction) {
    let source = dataset_root.join(row.audio_path());
    if !probe.is_file(&source) {
        let missing = MissingFile {
            audio_path: row.audio_path().to_owned(),
            expected: source,
        };
        return (row.clone(), RowAction::Missing(missing));
    }
    let file_name = file_name_of(row.audio_path());
    let copy = CopyInstruction {
        destination: output_root.join(WAVS_DIR).join(file_name),
        source,
    };
    let mapped = row.clone().with_audio_path(flat_audio_path(file_name));
    (mapped, RowAction::Copy(copy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{AUDIO_PATH, AUDIO_SOURCE, SPEAKER};

    fn row(path: &str) -> MetadataRow {
        MetadataRow::from_pairs([(AUDIO_PATH, path), (SPEAKER, "Ann Lee"), (AUDIO_SOURCE, "YouTube")])
    }

    #[test]
    fn pack_row_rewrites_present_files() {
        let key = BatchKey::new("YouTube", "Ann Lee", "batch_0001");
        let probe: HashSet<PathBuf> = [PathBuf::from("/src/wavs/a.wav")].into();
        let (mapped, action) = map_pack_row(
            &row("some/old/prefix/a.wav"),
            &key,
            Path::new("/src/wavs"),
            Path::new("/out"),
            &probe,
        );
        assert_eq!(mapped.audio_path(), "audio/youtube/ann_lee/batch_0001/a.wav");
        assert_eq!(mapped.speaker(), "Ann Lee");
        assert_eq!(
            action,
            RowAction::Copy(CopyInstruction {
                source: "/src/wavs/a.wav".into(),
                destination: "/out/audio/youtube/ann_lee/batch_0001/a.wav".into(),
            })
        );
    }

    #[test]
    fn pack_row_keeps_reference_when_missing() {
        let key = BatchKey::new("YouTube", "Ann Lee", "batch_0001");
        let probe: HashSet<PathBuf> = HashSet::new();
        let (mapped, action) =
            map_pack_row(&row("wavs/gone.wav"), &key, Path::new("/src/wavs"), Path::new("/out"), &probe);
        assert_eq!(mapped.audio_path(), "wavs/gone.wav");
        assert!(matches!(action, RowAction::Missing(m) if m.expected == Path::new("/src/wavs/gone.wav")));
    }

    #[test]
    fn unpack_row_flattens_present_files() {
        let probe: HashSet<PathBuf> = [PathBuf::from("/ds/audio/yt/ann/batch_0002/a.wav")].into();
        let (mapped, action) = map_unpack_row(
            &row("audio/yt/ann/batch_0002/a.wav"),
            Path::new("/ds"),
            Path::new("/flat"),
            &probe,
        );
        assert_eq!(mapped.audio_path(), "wavs/a.wav");
        assert_eq!(
            action,
            RowAction::Copy(CopyInstruction {
                source: "/ds/audio/yt/ann/batch_0002/a.wav".into(),
                destination: "/flat/wavs/a.wav".into(),
            })
        );
    }

    #[test]
    fn unpack_row_keeps_partitioned_reference_when_missing() {
        let (mapped, action) = map_unpack_row(
            &row("audio/yt/ann/batch_0002/a.wav"),
            Path::new("/ds"),
            Path::new("/flat"),
            &HashSet::<PathBuf>::new(),
        );
        assert_eq!(mapped.audio_path(), "audio/yt/ann/batch_0002/a.wav");
        assert!(matches!(action, RowAction::Missing(_)));
    }

    #[test]
    fn shards_with_the_same_path_are_merged() {
        let mut plan = CopyPlan::new(Direction::Pack);
        let mut t1 = MetadataTable::new([AUDIO_PATH, SPEAKER, AUDIO_SOURCE]);
        t1.push(row("a.wav"));
        let mut t2 = t1.with_rows(Vec::new());
        t2.push(row("b.wav"));
        for table in [t1, t2] {
            plan.push_shard(ShardWrite {
                path: "/out/metadata/x.csv".into(),
                format: ShardFormat::Csv,
                table,
            });
        }
        assert_eq!(plan.shards.len(), 1);
        assert_eq!(plan.rows(), 2);
    }
}
