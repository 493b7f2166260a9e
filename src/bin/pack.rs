//! audiopack-pack - flat dataset to partitioned layout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use audiopack::{DEFAULT_MAX_ROWS, PackOptions, ShardFormat, logging, pack};
use clap::Parser;
use tracing::info;

/// Command-line arguments for audiopack-pack
#[derive(Parser, Debug)]
#[command(name = "audiopack-pack")]
#[command(about = "Pack metadata.csv + wavs/ into per-speaker batches")]
#[command(version)]
struct Args {
    /// Flat dataset root holding metadata.csv and wavs/
    #[arg(long, env = "AUDIOPACK_SOURCE")]
    source: PathBuf,

    /// Root of the partitioned dataset (audio/ and metadata/ go here)
    #[arg(long, env = "AUDIOPACK_OUTPUT")]
    output: PathBuf,

    /// Explicit batch label (e.g. batch_2026_01); disables auto-numbering
    #[arg(long, env = "AUDIOPACK_BATCH")]
    batch: Option<String>,

    /// Rows per auto-numbered batch
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS, env = "AUDIOPACK_MAX_ROWS")]
    max_rows: usize,

    /// Metadata shard format (parquet or csv)
    #[arg(long, default_value_t = ShardFormat::default(), env = "AUDIOPACK_SHARD_FORMAT")]
    shard_format: ShardFormat,

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

    let mut opts = PackOptions::new(&args.source, &args.output)
        .max_rows(args.max_rows)
        .shard_format(args.shard_format)
        .dry_run(args.dry_run);
    if let Some(label) = args.batch {
        opts = opts.batch_label(label);
    }

    let report = pack(&opts).with_context(|| format!("pack of {} failed", args.source.display()))?;

    if let Some(path) = args.report {
        report
            .save_to_file(&path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}
