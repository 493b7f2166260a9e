//! Names and paths of the flat and partitioned dataset layouts.
//!
//! ```text
//! flat/                         partitioned/
//!   metadata.csv                  metadata/<source>_<speaker>_<batch>.<ext>
//!   wavs/<file>                   audio/<source>/<speaker>/<batch>/<file>
//! ```
//!
//! `<source>` and `<speaker>` are [sanitized](sanitize_segment) path segments.

use crate::io::ShardFormat;
use std::path::{Path, PathBuf};

/// Flat metadata table, relative to the flat root.
pub const FLAT_METADATA: &str = "metadata.csv";
/// Flat audio directory.
pub const WAVS_DIR: &str = "wavs";
/// Partitioned audio tree.
pub const AUDIO_DIR: &str = "audio";
/// Partitioned metadata shard directory.
pub const METADATA_DIR: &str = "metadata";

/// Make a raw label safe to use as a single directory name.
///
/// Trims, lowercases, then maps spaces to `_` and `/` to `-`. Distinct raw values
/// may sanitize to the same segment and then share one partition.
///
/// ```
/// use audiopack::layout::sanitize_segment;
///
/// assert_eq!(sanitize_segment(" Radio Show/Ep 1 "), "radio_show-ep_1");
/// ```
#[must_use]
pub fn sanitize_segment(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_").replace('/', "-")
}

/// Last path component of a stored `audio_path`, accepting `/` and `\` separators.
#[must_use]
pub fn file_name_of(audio_path: &str) -> &str {
    audio_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(audio_path)
}

/// Flat-form reference for a file name: `wavs/<file>`.
#[must_use]
pub fn flat_audio_path(file_name: &str) -> String {
    format!("{WAVS_DIR}/{file_name}")
}

/// Identifies one partition: a batch of one (source, speaker) group.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BatchKey {
    source_segment: String,
    speaker_segment: String,
    label: String,
}

impl BatchKey {
    /// Key for raw source/speaker values; both are sanitized here.
    pub fn new(raw_source: &str, raw_speaker: &str, label: impl Into<String>) -> Self {
        Self {
            source_segment: sanitize_segment(raw_source),
            speaker_segment: sanitize_segment(raw_speaker),
            label: label.into(),
        }
    }

    #[must_use]
    pub fn source_segment(&self) -> &str {
        &self.source_segment
    }

    #[must_use]
    pub fn speaker_segment(&self) -> &str {
        &self.speaker_segment
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Partitioned-form reference: `audio/<source>/<speaker>/<batch>/<file>`.
    #[must_use]
    pub fn audio_rel_path(&self, file_name: &str) -> String {
        format!(
            "{AUDIO_DIR}/{}/{}/{}/{file_name}",
            self.source_segment, self.speaker_segment, self.label
        )
    }

    /// `<root>/audio/<source>/<speaker>/<batch>`.
    #[must_use]
    pub fn partition_dir(&self, root: &Path) -> PathBuf {
        speaker_dir(root, &self.source_segment, &self.speaker_segment).join(&self.label)
    }

    /// `<source>_<speaker>_<batch>.<ext>`.
    #[must_use]
    pub fn shard_file_name(&self, format: ShardFormat) -> String {
        format!(
            "{}_{}_{}.{}",
            self.source_segment,
            self.speaker_segment,
            self.label,
            format.extension()
        )
    }

    /// `<root>/metadata/<source>_<speaker>_<batch>.<ext>`.
    #[must_use]
    pub fn shard_path(&self, root: &Path, format: ShardFormat) -> PathBuf {
        root.join(METADATA_DIR).join(self.shard_file_name(format))
    }
}

/// `<root>/audio/<source>/<speaker>`, the directory holding a group's batches.
#[must_use]
pub fn speaker_dir(root: &Path, source_segment: &str, speaker_segment: &str) -> PathBuf {
    root.join(AUDIO_DIR).join(source_segment).join(speaker_segment)
}
