//! Tests for unpacking partitioned datasets, with and without filters.

use audiopack::io::csv::read_table_csv;
use audiopack::testing::{FlatDatasetBuilder, assert_same_rows_modulo_prefix};
use audiopack::{Error, PackOptions, RowFilter, ShardFormat, UnpackOptions, pack, unpack};
use std::fs;
use std::path::{Path, PathBuf};

/// Pack `builder` into `<tmp>/packed` with CSV shards and `max_rows`.
fn packed(tmp: &Path, builder: &FlatDatasetBuilder, max_rows: usize) -> anyhow::Result<PathBuf> {
    let flat = builder.build_in(tmp.join("flat"))?;
    let out = tmp.join("packed");
    pack(
        &PackOptions::new(flat, &out)
            .max_rows(max_rows)
            .shard_format(ShardFormat::Csv),
    )?;
    Ok(out)
}

#[test]
fn pack_then_unpack_round_trips() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let builder = FlatDatasetBuilder::new()
        .rows("YouTube", "Ann", 3)
        .rows("Podcast", "Bob", 2);
    let ds = packed(tmp.path(), &builder, 2)?;
    let back = tmp.path().join("back");

    let report = unpack(&UnpackOptions::new(&ds, &back))?;
    assert_eq!(report.files_copied, 5);
    assert_eq!(report.files_missing, 0);

    let table = read_table_csv(back.join("metadata.csv"))?;
    assert_same_rows_modulo_prefix(&builder.table(), &table);
    assert!(table.rows().iter().all(|r| r.audio_path().starts_with("wavs/")));
    assert!(table.has_column("text"));
    assert_eq!(
        fs::read(back.join("wavs/youtube_ann_0001.wav"))?,
        fs::read(tmp.path().join("flat/wavs/youtube_ann_0001.wav"))?
    );
    Ok(())
}

#[test]
fn filters_combine_with_and() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let builder = FlatDatasetBuilder::new()
        .rows("YouTube", "Somrat", 3)
        .rows("Podcast", "Somrat", 2)
        .rows("YouTube", "Rina", 4);
    let ds = packed(tmp.path(), &builder, 100)?;
    let back = tmp.path().join("back");

    let filter = RowFilter::new().speaker("SOMRAT").audio_source("youtube");
    let report = unpack(&UnpackOptions::new(&ds, &back).filter(filter))?;
    assert_eq!(report.files_copied, 3);

    let table = read_table_csv(back.join("metadata.csv"))?;
    assert_eq!(table.len(), 3);
    assert!(table.rows().iter().all(|r| r.speaker() == "Somrat" && r.audio_source() == "YouTube"));
    assert_eq!(fs::read_dir(back.join("wavs"))?.count(), 3);
    Ok(())
}

#[test]
fn batch_filter_matches_whole_segment() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    // One row per batch: batch_0001 ..= batch_0020.
    let ds = packed(tmp.path(), &FlatDatasetBuilder::new().rows("yt", "ann", 20), 1)?;
    assert!(ds.join("audio/yt/ann/batch_0020").is_dir());
    let back = tmp.path().join("back");

    unpack(&UnpackOptions::new(&ds, &back).filter(RowFilter::new().batch("batch_0002")))?;
    let table = read_table_csv(back.join("metadata.csv"))?;
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].audio_path(), "wavs/yt_ann_0001.wav");
    Ok(())
}

#[test]
fn missing_audio_keeps_partitioned_reference() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let ds = packed(tmp.path(), &FlatDatasetBuilder::new().rows("yt", "ann", 2), 10)?;
    fs::remove_file(ds.join("audio/yt/ann/batch_0001/yt_ann_0001.wav"))?;
    let back = tmp.path().join("back");

    let report = unpack(&UnpackOptions::new(&ds, &back))?;
    assert_eq!(report.files_copied, 1);
    assert_eq!(report.files_missing, 1);

    let table = read_table_csv(back.join("metadata.csv"))?;
    let paths: Vec<&str> = table.rows().iter().map(|r| r.audio_path()).collect();
    assert_eq!(paths, ["wavs/yt_ann_0000.wav", "audio/yt/ann/batch_0001/yt_ann_0001.wav"]);
    Ok(())
}

#[test]
fn no_match_is_an_error_and_writes_nothing() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let ds = packed(tmp.path(), &FlatDatasetBuilder::new().rows("yt", "ann", 2), 10)?;
    let back = tmp.path().join("back");

    let err = unpack(&UnpackOptions::new(&ds, &back).filter(RowFilter::new().speaker("nobody")))
        .unwrap_err();
    assert!(matches!(err, Error::NoMatch(_)));
    assert!(!back.exists());
    Ok(())
}

#[test]
fn shards_without_required_columns_fail_before_writing() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let ds = tmp.path().join("packed");
    fs::create_dir_all(ds.join("metadata"))?;
    fs::write(
        ds.join("metadata/yt_ann_batch_0001.csv"),
        "audio_path,speaker\naudio/yt/ann/batch_0001/a.wav,ann\n",
    )?;
    let back = tmp.path().join("back");

    let err = unpack(&UnpackOptions::new(&ds, &back)).unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
    assert!(err.is_preflight());
    assert!(!back.exists());
    Ok(())
}
