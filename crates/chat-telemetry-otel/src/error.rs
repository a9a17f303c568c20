use opentelemetry::trace::TraceError;
use thiserror::Error;

/// Failures while bringing up the mirror.
///
/// These never leave the mirror's public send or init paths; they end up as
/// the reason of an unavailable [`MirrorStatus`](crate::MirrorStatus).
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("span exporter setup failed: {0}")]
    Exporter(#[from] TraceError),
    #[error("no tokio runtime available for batched export")]
    NoRuntime,
    #[error("tracing backend failed: {0}")]
    Backend(String),
    #[error("tracing backend panicked during initialization")]
    BackendPanicked,
    #[error("failed to install tracing subscriber: {0}")]
    TracingSetup(#[from] tracing_subscriber::util::TryInitError),
}
