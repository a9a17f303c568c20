//! Tracing backends for tests: in-memory capture and forced failures.

use async_trait::async_trait;
use chat_telemetry_core::JsonSettings;
use chat_telemetry_otel::backend::mirror_trace_config;
use chat_telemetry_otel::{MirrorConfig, MirrorError, MirrorRuntime, TracingBackend};
use futures_util::future::BoxFuture;
use opentelemetry::{Key, Value};
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory exporter that keeps its spans when the provider shuts down.
#[derive(Debug, Clone, Default)]
struct RetainingExporter {
    inner: InMemorySpanExporter,
    shutdowns: Arc<AtomicUsize>,
}

impl SpanExporter for RetainingExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        self.inner.export(batch)
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.inner.set_resource(resource);
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Backend exporting synchronously into memory; clones share storage.
///
/// Installed providers stay referenced by the backend, as a globally
/// registered provider would, so only an explicit shutdown stops them.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    exporter: RetainingExporter,
    installs: Arc<AtomicUsize>,
    providers: Arc<Mutex<Vec<TracerProvider>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.exporter
            .inner
            .get_finished_spans()
            .expect("in-memory exporter readable")
    }

    /// How many times `install` ran across all clones.
    pub fn install_count(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// How many times an installed provider shut its exporter down.
    pub fn shutdown_count(&self) -> usize {
        self.exporter.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TracingBackend for InMemoryBackend {
    async fn install(&self, config: &MirrorConfig) -> Result<MirrorRuntime, MirrorError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        let provider = TracerProvider::builder()
            .with_config(mirror_trace_config(config))
            .with_simple_exporter(self.exporter.clone())
            .build();
        self.providers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(provider.clone());
        Ok(MirrorRuntime::new(provider))
    }
}

/// Backend whose capability loading always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingBackend;

#[async_trait]
impl TracingBackend for FailingBackend {
    async fn install(&self, _config: &MirrorConfig) -> Result<MirrorRuntime, MirrorError> {
        Err(MirrorError::Backend("tracing capability unreachable".to_string()))
    }
}

/// Backend that panics mid-initialization.
#[derive(Debug, Clone, Default)]
pub struct PanickingBackend;

#[async_trait]
impl TracingBackend for PanickingBackend {
    async fn install(&self, _config: &MirrorConfig) -> Result<MirrorRuntime, MirrorError> {
        panic!("exporter constructor exploded");
    }
}

/// Settings with mirroring enabled under the default namespace.
pub fn enabled_settings(service_name: &str) -> JsonSettings {
    JsonSettings::from_value(json!({
        "chat.experimentalOtel.enabled": true,
        "chat.experimentalOtel.serviceName": service_name
    }))
    .expect("settings object")
}

/// Value of `key` on a finished span.
pub fn attribute(span: &SpanData, key: &str) -> Option<Value> {
    let key = Key::from(key.to_string());
    span.attributes
        .iter()
        .find(|kv| kv.key == key)
        .map(|kv| kv.value.clone())
}
