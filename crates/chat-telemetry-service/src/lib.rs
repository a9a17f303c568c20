//! Host telemetry service.
//!
//! Owns the product's primary senders and upgrades the enhanced one to an
//! OpenTelemetry-mirrored sender in the background once activation resolves.

pub mod service;
pub mod slot;

pub use service::TelemetryService;
pub use slot::SenderSlot;
