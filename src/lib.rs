//! # audiopack
//!
//! Converts a speech/audio dataset between two on-disk layouts.
//!
//! - **Flat**: one `metadata.csv` plus every audio file in `wavs/`
//! - **Partitioned**: audio under `audio/<source>/<speaker>/<batch>/` and one
//!   metadata shard per batch under `metadata/`
//!
//! Going flat to partitioned is a [`pack`]; the reverse, optionally filtered by
//! speaker, source or batch, is an [`unpack`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use audiopack::{PackOptions, RowFilter, UnpackOptions, pack, unpack};
//!
//! # fn main() -> anyhow::Result<()> {
//! // Auto-numbered batches of at most 10 000 rows per (source, speaker).
//! let report = pack(&PackOptions::new("data/flat", "data/packed"))?;
//! println!("{} files moved", report.files_copied);
//!
//! // Everything Ann said on YouTube, back in the flat layout.
//! let filter = RowFilter::new().speaker("ann").audio_source("youtube");
//! unpack(&UnpackOptions::new("data/packed", "data/ann").filter(filter))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## How a run works
//!
//! 1. The [`loader`] reads the metadata and checks its required columns
//! 2. Rows are grouped and batched ([`batching`]) or filtered ([`filter`])
//! 3. Each row is mapped to its new `audio_path` plus an optional file copy,
//!    collected into a [`CopyPlan`](plan::CopyPlan)
//! 4. An [`Executor`](executor::Executor) carries out the plan, or only logs it
//!    for a dry run, and returns a [`RunReport`]
//!
//! Configuration problems, missing columns and empty filter results are all
//! reported before anything is written.
//!
//! ## Module Overview
//!
//! - [`table`] - Dynamic-schema metadata rows
//! - [`io`] - CSV and Parquet codecs, compression, shard discovery
//! - [`layout`] - Path conventions of both layouts
//! - [`batching`] - Grouping, batch numbering, size-bounded chunks
//! - [`plan`] / [`executor`] - Planned side effects and their execution
//! - [`testing`] - Dataset builders and assertions for tests

pub mod batching;
pub mod error;
pub mod executor;
pub mod filter;
pub mod io;
pub mod layout;
pub mod loader;
pub mod logging;
pub mod pack;
pub mod plan;
pub mod report;
pub mod table;
pub mod testing;
pub mod unpack;

pub use batching::{BatchLabel, BatchStrategy, DEFAULT_MAX_ROWS, next_batch_number};
pub use error::{Error, Result};
pub use filter::RowFilter;
pub use io::ShardFormat;
pub use layout::sanitize_segment;
pub use pack::{PackOptions, pack, plan_pack};
pub use report::RunReport;
pub use table::{MetadataRow, MetadataTable};
pub use unpack::{UnpackOptions, plan_unpack, unpack};

#[cfg(feature = "io-parquet")]
pub use io::parquet::{read_table_parquet, write_table_parquet};
