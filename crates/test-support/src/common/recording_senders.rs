//! Telemetry senders that record what they were asked to do.

use chat_telemetry_core::{
    Result, TelemetryError, TelemetryMeasurements, TelemetryProperties, TelemetrySender,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub sender: String,
    pub operation: &'static str,
    pub event_name: Option<String>,
    pub properties: Option<TelemetryProperties>,
    pub measurements: Option<TelemetryMeasurements>,
}

/// Call log shared between senders so ordering across them is visible.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    /// `sender:operation` labels in call order.
    pub fn labels(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| format!("{}:{}", call.sender, call.operation))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().expect("call log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, call: RecordedCall) {
        self.calls.lock().expect("call log poisoned").push(call);
    }
}

pub struct RecordingSender {
    name: String,
    log: CallLog,
}

impl RecordingSender {
    pub fn new(name: impl Into<String>, log: CallLog) -> Self {
        Self {
            name: name.into(),
            log,
        }
    }

    fn record(
        &self,
        operation: &'static str,
        event_name: Option<&str>,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) {
        self.log.push(RecordedCall {
            sender: self.name.clone(),
            operation,
            event_name: event_name.map(str::to_string),
            properties: properties.cloned(),
            measurements: measurements.cloned(),
        });
    }
}

impl TelemetrySender for RecordingSender {
    fn send_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.record("send_event", Some(event_name), properties, measurements);
        Ok(())
    }

    fn send_error_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.record("send_error_event", Some(event_name), properties, measurements);
        Ok(())
    }

    fn dispose(&self) {
        self.record("dispose", None, None, None);
    }
}

/// Sender whose sends always fail after being recorded.
pub struct FailingSender {
    inner: RecordingSender,
}

impl FailingSender {
    pub fn new(name: impl Into<String>, log: CallLog) -> Self {
        Self {
            inner: RecordingSender::new(name, log),
        }
    }

    fn failure(&self) -> TelemetryError {
        TelemetryError::delivery(self.inner.name.clone(), "backend rejected event")
    }
}

impl TelemetrySender for FailingSender {
    fn send_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.inner.send_event(event_name, properties, measurements)?;
        Err(self.failure())
    }

    fn send_error_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.inner.send_error_event(event_name, properties, measurements)?;
        Err(self.failure())
    }

    fn dispose(&self) {
        self.inner.dispose();
    }
}
