//! Logging setup for assetdav binaries.
//!
//! Everything in the kernel logs through `tracing`; this crate only decides
//! where those events go. Output is plain `fmt` on stderr so stdout stays
//! free for command output.
//!
//! # Filtering
//!
//! `RUST_LOG` wins when set. Otherwise the caller's default filter is used,
//! which normally comes from the config file's `log_filter`:
//!
//! ```bash
//! RUST_LOG=assetdav_kernel=debug assetdav ls /
//! ```

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter: `RUST_LOG` if present and valid, else `fallback`.
///
/// An unparseable fallback degrades to [`DEFAULT_FILTER`] rather than
/// failing startup.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(fallback: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(fallback))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
}
