//! Dual-dispatch sender: primary first, then the mirror.

use crate::mirror_sender::OtelMirrorSender;
use chat_telemetry_core::{
    Result, SharedSender, TelemetryMeasurements, TelemetryProperties, TelemetrySender,
};
use std::sync::Arc;
use tracing::debug;

/// Forwards every call to a primary sender and then to a mirror.
///
/// A primary failure is returned as-is and the mirror is skipped for that
/// call. Mirror failures are logged and dropped.
pub struct WrappedSender<M: ?Sized = OtelMirrorSender> {
    base: SharedSender,
    mirror: Arc<M>,
}

impl<M: TelemetrySender + ?Sized> WrappedSender<M> {
    pub fn new(base: SharedSender, mirror: Arc<M>) -> Self {
        Self { base, mirror }
    }

    pub fn base(&self) -> &SharedSender {
        &self.base
    }

    pub fn mirror(&self) -> &Arc<M> {
        &self.mirror
    }

    fn mirrored(&self, operation: &'static str, event_name: &str, outcome: Result<()>) {
        if let Err(error) = outcome {
            debug!(operation, event_name, %error, "Mirror sender failed; ignoring");
        }
    }
}

impl<M: TelemetrySender + ?Sized> TelemetrySender for WrappedSender<M> {
    fn send_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.base.send_event(event_name, properties, measurements)?;
        self.mirrored(
            "send_event",
            event_name,
            self.mirror.send_event(event_name, properties, measurements),
        );
        Ok(())
    }

    fn send_error_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.base.send_error_event(event_name, properties, measurements)?;
        self.mirrored(
            "send_error_event",
            event_name,
            self.mirror.send_error_event(event_name, properties, measurements),
        );
        Ok(())
    }

    fn dispose(&self) {
        self.base.dispose();
        self.mirror.dispose();
    }
}
