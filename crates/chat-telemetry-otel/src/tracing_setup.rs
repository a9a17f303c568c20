//! Process-wide `tracing` subscriber setup for binaries.

use crate::error::MirrorError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a fmt subscriber filtered by `RUST_LOG`, else `default_filter`.
///
/// Fails instead of panicking when a global subscriber is already set.
pub fn init_tracing(default_filter: &str) -> Result<(), MirrorError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;
    Ok(())
}
