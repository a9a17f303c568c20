//! Shared fixtures for chat telemetry tests.

pub mod common {
    pub mod recording_senders;
}

pub mod support {
    pub mod backends;
}

pub use common::recording_senders::{CallLog, FailingSender, RecordedCall, RecordingSender};
pub use support::backends::{
    attribute, enabled_settings, FailingBackend, InMemoryBackend, PanickingBackend,
};
