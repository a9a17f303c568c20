//! Chat telemetry core types and shared capabilities.
//!
//! This crate defines the sender capability shared by primary senders,
//! the OpenTelemetry mirror and the host service, along with the settings
//! reader used to build mirroring configuration.

pub mod error;
pub mod event;
pub mod sender;
pub mod settings;

pub use error::{Result, TelemetryError};
pub use event::{TelemetryEvent, TelemetryMeasurements, TelemetryProperties};
pub use sender::{SharedSender, TelemetrySender};
pub use settings::{JsonSettings, NoSettings, SettingsReader};
