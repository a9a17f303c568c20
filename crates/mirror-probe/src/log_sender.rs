//! Primary sender that writes events to the process log.

use chat_telemetry_core::{
    Result, TelemetryError, TelemetryEvent, TelemetryMeasurements, TelemetryProperties,
    TelemetrySender,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

pub struct LogSender {
    channel: &'static str,
    disposed: AtomicBool,
}

impl LogSender {
    pub fn new(channel: &'static str) -> Self {
        Self {
            channel,
            disposed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(TelemetryError::Disposed {
                sender: self.channel.to_string(),
            });
        }
        Ok(())
    }
}

impl TelemetrySender for LogSender {
    fn send_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.ensure_open()?;
        let event = TelemetryEvent::new(event_name, properties, measurements);
        info!(
            channel = self.channel,
            event = event.name,
            properties = ?event.properties().collect::<Vec<_>>(),
            measurements = ?event.measurements().collect::<Vec<_>>(),
            "Telemetry event"
        );
        Ok(())
    }

    fn send_error_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.ensure_open()?;
        let event = TelemetryEvent::new(event_name, properties, measurements);
        warn!(
            channel = self.channel,
            event = event.name,
            properties = ?event.properties().collect::<Vec<_>>(),
            measurements = ?event.measurements().collect::<Vec<_>>(),
            "Telemetry error event"
        );
        Ok(())
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            info!(channel = self.channel, "Log sender disposed");
        }
    }
}
