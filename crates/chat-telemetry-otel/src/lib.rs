//! OpenTelemetry mirroring for chat telemetry.
//!
//! A primary [`TelemetrySender`](chat_telemetry_core::TelemetrySender) can be
//! wrapped so that every event it receives is also emitted as a span. Mirroring
//! is best-effort: a mirror that fails to start simply stays silent.

pub mod activation;
pub mod backend;
pub mod config;
pub mod error;
pub mod mirror_sender;
pub mod tracing_setup;
pub mod wrapped_sender;

pub use activation::{activate_mirror, maybe_wrap_with_mirror, maybe_wrap_with_mirror_using};
pub use backend::{MirrorRuntime, OtlpBackend, TracingBackend};
pub use config::{MirrorConfig, SettingsKeys};
pub use error::MirrorError;
pub use mirror_sender::{MirrorStatus, OtelMirrorSender};
pub use wrapped_sender::WrappedSender;
