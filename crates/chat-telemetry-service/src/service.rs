//! Telemetry service composing the product's primary senders.

use crate::slot::SenderSlot;
use chat_telemetry_core::{
    Result, SettingsReader, SharedSender, TelemetryMeasurements, TelemetryProperties,
    TelemetrySender,
};
use chat_telemetry_otel::{
    activate_mirror, OtlpBackend, SettingsKeys, TracingBackend, WrappedSender,
};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Routes events to a standard sender and an enhanced sender.
///
/// Only the enhanced sender is eligible for mirroring. Construction starts
/// the activation in the background; until it resolves, enhanced events go
/// to the primary enhanced sender alone.
pub struct TelemetryService {
    standard: SharedSender,
    enhanced: Arc<SenderSlot>,
    activation: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryService {
    /// Build the service and start mirroring activation with the OTLP backend.
    pub fn new(
        standard: SharedSender,
        enhanced: SharedSender,
        settings: Arc<dyn SettingsReader>,
    ) -> Self {
        Self::with_activation(
            standard,
            enhanced,
            settings,
            SettingsKeys::default(),
            OtlpBackend::new,
        )
    }

    pub fn with_activation<F, B>(
        standard: SharedSender,
        enhanced: SharedSender,
        settings: Arc<dyn SettingsReader>,
        keys: SettingsKeys,
        backend: F,
    ) -> Self
    where
        F: FnOnce() -> B + Send + 'static,
        B: TracingBackend + 'static,
    {
        let slot = Arc::new(SenderSlot::new(enhanced));
        let activation = spawn_activation(slot.clone(), settings, keys, backend);
        Self {
            standard,
            enhanced: slot,
            activation: Mutex::new(activation),
        }
    }

    pub fn send_standard_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.standard.send_event(event_name, properties, measurements)
    }

    pub fn send_standard_error_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.standard.send_error_event(event_name, properties, measurements)
    }

    pub fn send_enhanced_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.enhanced
            .current()
            .send_event(event_name, properties, measurements)
    }

    pub fn send_enhanced_error_event(
        &self,
        event_name: &str,
        properties: Option<&TelemetryProperties>,
        measurements: Option<&TelemetryMeasurements>,
    ) -> Result<()> {
        self.enhanced
            .current()
            .send_error_event(event_name, properties, measurements)
    }

    /// Whether enhanced events are currently mirrored.
    pub fn is_mirroring(&self) -> bool {
        self.enhanced.is_adopted()
    }

    /// Wait for the background activation, if one is still pending.
    pub async fn wait_for_activation(&self) {
        let pending = match self.activation.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = pending {
            let _ = handle.await;
        }
    }

    pub fn dispose(&self) {
        self.standard.dispose();
        self.enhanced.close().dispose();
    }
}

fn spawn_activation<F, B>(
    slot: Arc<SenderSlot>,
    settings: Arc<dyn SettingsReader>,
    keys: SettingsKeys,
    backend: F,
) -> Option<JoinHandle<()>>
where
    F: FnOnce() -> B + Send + 'static,
    B: TracingBackend + 'static,
{
    let Ok(handle) = Handle::try_current() else {
        warn!("No tokio runtime; telemetry mirroring will not be activated");
        return None;
    };

    let activation =
        handle.spawn(async move { activate_mirror(settings.as_ref(), &keys, backend).await });

    Some(handle.spawn(async move {
        let mirror = match activation.await {
            Ok(Some(mirror)) => mirror,
            Ok(None) => return,
            Err(error) => {
                debug!(%error, "Telemetry mirroring activation failed; continuing without it");
                return;
            }
        };
        let wrapped: SharedSender =
            Arc::new(WrappedSender::new(slot.initial().clone(), mirror.clone()));
        if slot.adopt(wrapped) {
            info!("Enhanced telemetry is now mirrored to OpenTelemetry");
        } else {
            debug!("Telemetry service closed before mirroring activated; disposing mirror");
            mirror.dispose();
        }
    }))
}
