//! Telemetry sender that re-emits events as OpenTelemetry spans.
//!
//! The sender moves through `Uninitialized -> Ready | Unavailable -> Disposed`.
//! Only `init` can fail, and it reports failure as [`MirrorStatus::Unavailable`]
//! instead of an error: every send on a sender that is not ready is a no-op.

use crate::backend::{MirrorRuntime, TracingBackend};
use crate::config::MirrorConfig;
use crate::error::MirrorError;
use chat_telemetry_core::{
    Result, TelemetryEvent, TelemetryMeasurements, TelemetryProperties, TelemetrySender,
};
use futures_util::FutureExt;
use opentelemetry::trace::{Span, Status, Tracer};
use opentelemetry::KeyValue;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Property values longer than this many characters are cut.
pub const MAX_ATTRIBUTE_CHARS: usize = 8000;
pub const TRUNCATION_MARKER: &str = "…(truncated)";

pub const PROPERTY_PREFIX: &str = "prop.";
pub const MEASUREMENT_PREFIX: &str = "measure.";
pub const EVENT_NAME_ATTRIBUTE: &str = "telemetry.event_name";
pub const ERROR_ATTRIBUTE: &str = "error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    Uninitialized,
    Ready,
    Unavailable { reason: String },
    Disposed,
}

impl MirrorStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, MirrorStatus::Ready)
    }
}

#[derive(Debug)]
enum Installation {
    Ready(MirrorRuntime),
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Event,
    Error,
}

/// Exception recorded on mirrored error spans.
#[derive(Debug)]
struct MirroredTelemetryError<'a> {
    event_name: &'a str,
}

impl fmt::Display for MirroredTelemetryError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "telemetryError:{}", self.event_name)
    }
}

impl std::error::Error for MirroredTelemetryError<'_> {}

pub struct OtelMirrorSender {
    config: MirrorConfig,
    backend: Arc<dyn TracingBackend>,
    installation: OnceCell<Installation>,
    disposed: AtomicBool,
}

impl OtelMirrorSender {
    pub fn new(config: MirrorConfig, backend: Arc<dyn TracingBackend>) -> Self {
        Self {
            config,
            backend,
            installation: OnceCell::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Bring up the tracing pipeline once.
    ///
    /// Later calls, concurrent or not, observe the first outcome. A disabled
    /// config or a failing backend leaves the sender unavailable for good.
    pub async fn init(&self) -> MirrorStatus {
        if self.is_disposed() {
            return MirrorStatus::Disposed;
        }
        self.installation.get_or_init(|| self.install()).await;
        self.status()
    }

    pub fn status(&self) -> MirrorStatus {
        if self.is_disposed() {
            return MirrorStatus::Disposed;
        }
        match self.installation.get() {
            None => MirrorStatus::Uninitialized,
            Some(Installation::Ready(_)) => MirrorStatus::Ready,
            Some(Installation::Unavailable(reason)) => MirrorStatus::Unavailable {
                reason: reason.clone(),
            },
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    async fn install(&self) -> Installation {
        if !self.config.enabled {
            debug!("OpenTelemetry mirroring disabled; skipping initialization");
            return Installation::Unavailable("mirroring disabled".to_string());
        }

        let outcome = AssertUnwindSafe(self.backend.install(&self.config))
            .catch_unwind()
            .await
            .unwrap_or(Err(MirrorError::BackendPanicked));

        match outcome {
            Ok(runtime) => {
                info!(
                    service_name = %self.config.service_name(),
                    endpoint = self.config.endpoint.as_deref().unwrap_or("<none>"),
                    sample_ratio = self.config.span_sample_ratio,
                    "OpenTelemetry mirror ready"
                );
                Installation::Ready(runtime)
            }
            Err(error) => {
                warn!(%error, "OpenTelemetry mirror unavailable; primary telemetry unaffected");
                Installation::Unavailable(error.to_string())
            }
        }
    }

    fn runtime(&self) -> Option<&MirrorRuntime> {
        if self.is_disposed() {
            return None;
        }
        match self.installation.get() {
            Some(Installation::Ready(runtime)) => Some(runtime),
            _ => None,
        }
    }

    fn emit(&self, event: TelemetryEvent<'_>, kind: EventKind) {
        let Some(runtime) = self.runtime() else {
            return;
        };

        let mut span = runtime.tracer().start(event.name.to_string());
        if kind == EventKind::Error {
            span.set_attribute(KeyValue::new(ERROR_ATTRIBUTE, true));
        }
        for (key, value) in event.properties() {
            span.set_attribute(KeyValue::new(
                format!("{PROPERTY_PREFIX}{key}"),
                truncate_attribute(value),
            ));
        }
        for (key, value) in event.measurements() {
            span.set_attribute(KeyValue::new(format!("{MEASUREMENT_PREFIX}{key}"), *value));
        }
        span.set_attribute(KeyValue::new(EVENT_NAME_ATTRIBUTE, event.name.to_string()));
        if kind == EventKind::Error {
            let error = MirroredTelemetryError {
                event_name: event.name,
            };
            span.record_error(&error);
            span.set_status(Status::error(error.to_string()));
        }
        span.end();
    }
}

impl fmt::Debug for OtelMirrorSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtelMirrorSender")
            .field("config", &self.config)
            .field("status", &self.status())
            .finish()
    }
}

impl TelemetrySender for OtelMirrorSender {
    fn send_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.emit(
            TelemetryEvent::new(event_name, properties, measurements),
            EventKind::Event,
        );
        Ok(())
    }

    fn send_error_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.emit(
            TelemetryEvent::new(event_name, properties, measurements),
            EventKind::Error,
        );
        Ok(())
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(Installation::Ready(runtime)) = self.installation.get() {
            runtime.shutdown(self.config.flush_timeout());
        }
    }
}

/// Cut `value` to [`MAX_ATTRIBUTE_CHARS`] characters, marking the cut.
pub fn truncate_attribute(value: &str) -> String {
    match value.char_indices().nth(MAX_ATTRIBUTE_CHARS) {
        Some((cut, _)) => format!("{}{}", &value[..cut], TRUNCATION_MARKER),
        None => value.to_string(),
    }
}
