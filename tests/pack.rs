//! Tests for packing flat datasets into batches.

use audiopack::io::read_table;
use audiopack::testing::FlatDatasetBuilder;
use audiopack::{Error, PackOptions, ShardFormat, pack};
use std::fs;
use std::path::Path;

fn shard_rows(out: &Path, name: &str) -> anyhow::Result<usize> {
    Ok(read_table(out.join("metadata").join(name))?.len())
}

#[test]
fn auto_batches_are_bounded_and_continue_across_runs() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let out = tmp.path().join("packed");

    let first = FlatDatasetBuilder::new()
        .rows("yt", "ann", 25)
        .build_in(tmp.path().join("first"))?;
    let report = pack(
        &PackOptions::new(&first, &out)
            .max_rows(10)
            .shard_format(ShardFormat::Csv),
    )?;
    assert_eq!(report.files_copied, 25);
    assert_eq!(report.shards_written, 3);
    assert_eq!(shard_rows(&out, "yt_ann_batch_0001.csv")?, 10);
    assert_eq!(shard_rows(&out, "yt_ann_batch_0002.csv")?, 10);
    assert_eq!(shard_rows(&out, "yt_ann_batch_0003.csv")?, 5);
    assert!(out.join("audio/yt/ann/batch_0003/yt_ann_0024.wav").is_file());

    let second = FlatDatasetBuilder::new()
        .rows("yt", "ann", 5)
        .build_in(tmp.path().join("second"))?;
    pack(
        &PackOptions::new(&second, &out)
            .max_rows(10)
            .shard_format(ShardFormat::Csv),
    )?;
    assert_eq!(shard_rows(&out, "yt_ann_batch_0004.csv")?, 5);
    // Earlier batches untouched.
    assert_eq!(shard_rows(&out, "yt_ann_batch_0003.csv")?, 5);
    Ok(())
}

#[test]
fn explicit_label_takes_whole_group() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let flat = FlatDatasetBuilder::new()
        .rows("YouTube", "Ann Lee", 12)
        .rows("Podcast", "Bob", 2)
        .build_in(tmp.path().join("flat"))?;
    let out = tmp.path().join("packed");

    let report = pack(
        &PackOptions::new(&flat, &out)
            .batch_label("batch_2026_01")
            .max_rows(5)
            .shard_format(ShardFormat::Csv),
    )?;
    assert_eq!(report.shards_written, 2);
    assert_eq!(shard_rows(&out, "youtube_ann_lee_batch_2026_01.csv")?, 12);
    assert_eq!(shard_rows(&out, "podcast_bob_batch_2026_01.csv")?, 2);

    let shard = read_table(out.join("metadata/podcast_bob_batch_2026_01.csv"))?;
    let row = &shard.rows()[0];
    assert_eq!(row.audio_path(), "audio/podcast/bob/batch_2026_01/podcast_bob_0012.wav");
    // Raw values and passthrough columns survive.
    assert_eq!(row.speaker(), "Bob");
    assert_eq!(row.audio_source(), "Podcast");
    assert_eq!(row.get("text"), Some("utterance 12"));
    Ok(())
}

#[test]
fn missing_audio_is_skipped_but_row_kept() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let flat = FlatDatasetBuilder::new()
        .rows("yt", "ann", 2)
        .rows_without_audio("yt", "ann", 1)
        .build_in(tmp.path().join("flat"))?;
    let out = tmp.path().join("packed");

    let report = pack(&PackOptions::new(&flat, &out).shard_format(ShardFormat::Csv))?;
    assert_eq!(report.files_copied, 2);
    assert_eq!(report.files_missing, 1);
    assert_eq!(report.missing[0].audio_path, "wavs/yt_ann_0002.wav");

    let shard = read_table(out.join("metadata/yt_ann_batch_0001.csv"))?;
    let paths: Vec<&str> = shard.rows().iter().map(|r| r.audio_path()).collect();
    assert_eq!(
        paths,
        [
            "audio/yt/ann/batch_0001/yt_ann_0000.wav",
            "audio/yt/ann/batch_0001/yt_ann_0001.wav",
            "wavs/yt_ann_0002.wav",
        ]
    );
    Ok(())
}

#[test]
fn missing_column_fails_before_writing() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let flat = tmp.path().join("flat");
    fs::create_dir_all(flat.join("wavs"))?;
    fs::write(flat.join("metadata.csv"), "audio_path,speaker\nwavs/a.wav,ann\n")?;
    let out = tmp.path().join("packed");

    let err = pack(&PackOptions::new(&flat, &out)).unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
    assert!(err.is_preflight());
    assert!(!out.exists());
    Ok(())
}

#[test]
fn source_files_are_left_in_place() -> anyhow::Result<()> {
    let (tmp, flat) = FlatDatasetBuilder::new().rows("yt", "ann", 3).build_temp()?;
    pack(&PackOptions::new(&flat, tmp.path().join("packed")).shard_format(ShardFormat::Csv))?;
    assert!(flat.join("wavs/yt_ann_0000.wav").is_file());
    assert!(flat.join("metadata.csv").is_file());
    Ok(())
}
