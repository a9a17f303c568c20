//! Error types for chat telemetry delivery
//!
//! Mirroring never produces these on its send paths; they belong to
//! primary senders and to settings loading.

use thiserror::Error;

/// Main error type for telemetry delivery and settings loading
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A sender failed to hand the event to its backend
    #[error("telemetry delivery failed in {sender}: {reason}")]
    Delivery { sender: String, reason: String },

    /// The sender has already been disposed
    #[error("telemetry sender {sender} is disposed")]
    Disposed { sender: String },

    /// Settings source is structurally invalid
    #[error("invalid settings: {0}")]
    Settings(String),

    /// I/O error (reading a settings file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TelemetryError {
    pub fn delivery(sender: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Delivery {
            sender: sender.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TelemetryError>;
