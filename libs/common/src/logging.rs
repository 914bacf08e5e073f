//! Tracing initialisation shared by the service binaries

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global fmt subscriber
///
/// The filter comes from `RUST_LOG` and falls back to `info`.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("setting default subscriber failed: {}", e))
}
