//! Sender capability shared by every telemetry delivery path
//!
//! Primary senders, the OpenTelemetry mirror and the dual-dispatch wrapper
//! all implement [`TelemetrySender`], so a host can hold any of them behind
//! the same reference.

use crate::error::Result;
use crate::event::{TelemetryMeasurements, TelemetryProperties};
use std::sync::Arc;

/// Trait for delivering telemetry events to a backend
pub trait TelemetrySender: Send + Sync {
    /// Send a named event with optional properties and measurements
    fn send_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()>;

    /// Send the same shape of event, flagged as an error
    fn send_error_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()>;

    /// Release resources held by the sender
    fn dispose(&self);
}

/// Reference-counted sender handle, as held by hosts and wrappers.
pub type SharedSender = Arc<dyn TelemetrySender>;

impl<T: TelemetrySender + ?Sized> TelemetrySender for Arc<T> {
    fn send_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        (**self).send_event(event_name, properties, measurements)
    }

    fn send_error_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        (**self).send_error_event(event_name, properties, measurements)
    }

    fn dispose(&self) {
        (**self).dispose()
    }
}
