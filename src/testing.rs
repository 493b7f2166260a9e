//! Test helpers for pack/unpack round trips.
//!
//! - **Builders**: [`FlatDatasetBuilder`] lays out a flat dataset (`metadata.csv`
//!   plus `wavs/`) on disk
//! - **Assertions**: compare tables across a round trip and snapshot directory
//!   trees to prove a dry run wrote nothing
//!
//! # Quick Start
//!
//! ```no_run
//! use audiopack::testing::*;
//! use audiopack::{PackOptions, pack};
//!
//! # fn main() -> anyhow::Result<()> {
//! let (tmp, flat) = FlatDatasetBuilder::new().rows("YouTube", "Ann", 3).build_temp()?;
//! let before = snapshot_tree(tmp.path())?;
//! pack(&PackOptions::new(&flat, tmp.path().join("out")).dry_run(true))?;
//! assert_eq!(snapshot_tree(tmp.path())?, before);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod builders;

pub use assertions::*;
pub use builders::*;
