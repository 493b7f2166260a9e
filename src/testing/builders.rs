//! Builders that lay out datasets on disk.

use crate::error::{Error, Result};
use crate::io::csv::write_table_csv;
use crate::layout::{FLAT_METADATA, WAVS_DIR, flat_audio_path, sanitize_segment};
use crate::table::{AUDIO_PATH, AUDIO_SOURCE, MetadataRow, MetadataTable, SPEAKER};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Clone, Debug)]
struct Entry {
    audio_source: String,
    speaker: String,
    file_name: String,
    with_audio: bool,
}

/// A fluent builder for flat datasets.
///
/// Every row gets a unique file name `<source>_<speaker>_<NNNN>.wav` (sanitized
/// names, running index across the whole dataset) and a `text` passthrough column.
///
/// # Example
///
/// ```
/// use audiopack::testing::FlatDatasetBuilder;
///
/// # fn main() -> anyhow::Result<()> {
/// let (_tmp, flat) = FlatDatasetBuilder::new()
///     .rows("YouTube", "Ann", 2)
///     .rows_without_audio("Podcast", "Bob", 1)
///     .build_temp()?;
///
/// assert!(flat.join("metadata.csv").is_file());
/// assert!(flat.join("wavs/youtube_ann_0000.wav").is_file());
/// assert!(!flat.join("wavs/podcast_bob_0002.wav").exists());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct FlatDatasetBuilder {
    entries: Vec<Entry>,
}

impl FlatDatasetBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add `n` rows for one (source, speaker) pair, each with an audio file.
    #[must_use]
    pub fn rows(self, audio_source: &str, speaker: &str, n: usize) -> Self {
        self.add(audio_source, speaker, n, true)
    }

    /// Add `n` rows whose audio file is never written.
    #[must_use]
    pub fn rows_without_audio(self, audio_source: &str, speaker: &str, n: usize) -> Self {
        self.add(audio_source, speaker, n, false)
    }

    fn add(mut self, audio_source: &str, speaker: &str, n: usize, with_audio: bool) -> Self {
        for _ in 0..n {
            let idx = self.entries.len();
            self.entries.push(Entry {
                audio_source: audio_source.to_owned(),
                speaker: speaker.to_owned(),
                file_name: format!(
                    "{}_{}_{idx:04}.wav",
                    sanitize_segment(audio_source),
                    sanitize_segment(speaker)
                ),
                with_audio,
            });
        }
        self
    }

    /// The metadata table this builder writes.
    #[must_use]
    pub fn table(&self) -> MetadataTable {
        let mut t = MetadataTable::new([AUDIO_PATH, SPEAKER, AUDIO_SOURCE, "text"]);
        for (i, e) in self.entries.iter().enumerate() {
            t.push(MetadataRow::from_pairs([
                (AUDIO_PATH, flat_audio_path(&e.file_name)),
                (SPEAKER, e.speaker.clone()),
                (AUDIO_SOURCE, e.audio_source.clone()),
                ("text", format!("utterance {i}")),
            ]));
        }
        t
    }

    /// Write `metadata.csv` and `wavs/` under `root`, returning `root`.
    ///
    /// # Errors
    /// Returns an error if any file or directory cannot be written.
    pub fn build_in(&self, root: impl Into<PathBuf>) -> Result<PathBuf> {
        let root = root.into();
        let wavs = root.join(WAVS_DIR);
        fs::create_dir_all(&wavs).map_err(|e| Error::io(&wavs, e))?;
        for (i, e) in self.entries.iter().enumerate().filter(|(_, e)| e.with_audio) {
            let path = wavs.join(&e.file_name);
            fs::write(&path, format!("RIFF{i:08}WAVE")).map_err(|err| Error::io(&path, err))?;
        }
        write_table_csv(root.join(FLAT_METADATA), &self.table())?;
        Ok(root)
    }

    /// Build under a fresh temporary directory (`<tmp>/flat`).
    ///
    /// The `TempDir` must be kept alive for as long as the dataset is used.
    ///
    /// # Errors
    /// Returns an error if the temporary directory or any file cannot be created.
    pub fn build_temp(&self) -> Result<(TempDir, PathBuf)> {
        let tmp = TempDir::new().map_err(|e| Error::io(std::env::temp_dir(), e))?;
        let root = self.build_in(tmp.path().join("flat"))?;
        Ok((tmp, root))
    }
}
