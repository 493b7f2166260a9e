//! Log setup shared by the command-line tools.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "audiopack=info";

/// Install a stdout `fmt` subscriber filtered by `RUST_LOG`.
///
/// `verbose` raises the default filter to `debug`. Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "audiopack=debug" } else { DEFAULT_FILTER };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stdout),
        )
        .try_init();
}
