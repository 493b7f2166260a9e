//! audiopack-unpack - partitioned dataset back to the flat layout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use audiopack::{RowFilter, UnpackOptions, logging, unpack};
use clap::Parser;
use tracing::info;

/// Command-line arguments for audiopack-unpack
#[derive(Parser, Debug)]
#[command(name = "audiopack-unpack")]
#[command(about = "Unpack a partitioned dataset into metadata.csv + wavs/")]
#[command(version)]
struct Args {
    /// Partitioned dataset root holding metadata/ and audio/
    #[arg(long, env = "AUDIOPACK_DATASET")]
    dataset: PathBuf,

    /// Flat output root (metadata.csv and wavs/ go here)
    #[arg(long, env = "AUDIOPACK_OUTPUT")]
    output: PathBuf,

    /// Keep only this speaker (case-insensitive)
    #[arg(long, env = "AUDIOPACK_SPEAKER")]
    speaker: Option<String>,

    /// Keep only this audio source (case-insensitive)
    #[arg(long, env = "AUDIOPACK_AUDIO_SOURCE")]
    audio_source: Option<String>,

    /// Keep only rows stored in this batch directory
    #[arg(long, env = "AUDIOPACK_BATCH")]
    batch: Option<String>,

    /// Log every step without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON run report to this path
    #[arg(long, env = "AUDIOPACK_REPORT")]
    report: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.verbose);

    let mut filter = RowFilter::new();
    if let Some(s) = args.speaker {
        filter = filter.speaker(s);
    }
    if let Some(s) = args.audio_source {
        filter = filter.audio_source(s);
    }
    if let Some(b) = args.batch {
        filter = filter.batch(b);
    }

    let opts = UnpackOptions::new(&args.dataset, &args.output)
        .filter(filter)
        .dry_run(args.dry_run);
    let report =
        unpack(&opts).with_context(|| format!("unpack of {} failed", args.dataset.display()))?;

    if let Some(path) = args.report {
        report
            .save_to_file(&path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}
