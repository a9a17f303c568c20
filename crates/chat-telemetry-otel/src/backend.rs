//! Tracing backends that produce the mirror's runtime.
//!
//! The OpenTelemetry pipeline is only built through a [`TracingBackend`], and
//! a backend is only constructed once mirroring is enabled, so hosts with
//! mirroring off never touch the SDK.

use crate::config::MirrorConfig;
use crate::error::MirrorError;
use async_trait::async_trait;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{
    self as sdktrace, BatchConfigBuilder, BatchSpanProcessor, Sampler, Tracer, TracerProvider,
};
use opentelemetry_sdk::{runtime, Resource};
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};

/// Instrumentation scope name of the mirror's tracer.
pub const TRACER_NAME: &str = "chat-telemetry-otel";
/// Resource attribute marking spans that came through the mirror.
pub const CHANNEL_ATTRIBUTE: &str = "telemetry.channel";
pub const CHANNEL_VALUE: &str = "otel-mirror";

/// Factory for the tracing pipeline behind a mirror.
#[async_trait]
pub trait TracingBackend: Send + Sync {
    /// Build the provider and tracer for `config`.
    async fn install(&self, config: &MirrorConfig) -> Result<MirrorRuntime, MirrorError>;
}

/// A live tracer provider and the tracer obtained from it.
#[derive(Debug)]
pub struct MirrorRuntime {
    provider: TracerProvider,
    tracer: Tracer,
}

impl MirrorRuntime {
    pub fn new(provider: TracerProvider) -> Self {
        let tracer = provider.tracer(TRACER_NAME);
        Self { provider, tracer }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Shut the provider down, waiting at most `timeout` for pending spans.
    ///
    /// Shutdown runs on a helper thread. On a current-thread runtime the batch
    /// processor can only drain once the caller yields, so the call returns
    /// right away there and the flush completes in the background.
    pub fn shutdown(&self, timeout: Duration) {
        let provider = self.provider.clone();
        let (done_tx, done_rx) = mpsc::channel();
        let spawned = std::thread::Builder::new()
            .name("otel-mirror-shutdown".to_string())
            .spawn(move || {
                let _ = done_tx.send(provider.shutdown());
            });
        if let Err(error) = spawned {
            warn!(%error, "Could not start OpenTelemetry mirror shutdown");
            return;
        }

        let outcome = match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::CurrentThread) => {
                debug!("OpenTelemetry mirror shutdown started; flushing after dispose returns");
                return;
            }
            Ok(_) => tokio::task::block_in_place(|| done_rx.recv_timeout(timeout)),
            Err(_) => done_rx.recv_timeout(timeout),
        };
        match outcome {
            Ok(Ok(())) => debug!("OpenTelemetry mirror flushed and shut down"),
            Ok(Err(error)) => debug!(%error, "OpenTelemetry mirror shutdown reported an error"),
            Err(_) => warn!(
                timeout_ms = timeout.as_millis() as u64,
                "OpenTelemetry mirror shutdown did not finish before the flush timeout"
            ),
        }
    }
}

/// Resource describing the mirror: service name plus the channel marker.
pub fn mirror_resource(config: &MirrorConfig) -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", config.service_name()),
        KeyValue::new(CHANNEL_ATTRIBUTE, CHANNEL_VALUE),
    ])
}

/// Per-span sampler for the configured ratio.
pub fn mirror_sampler(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(ratio)
    }
}

/// SDK trace config shared by every backend: resource and sampler.
pub fn mirror_trace_config(config: &MirrorConfig) -> sdktrace::Config {
    sdktrace::Config::default()
        .with_sampler(mirror_sampler(config.span_sample_ratio))
        .with_resource(mirror_resource(config))
}

/// Backend exporting over OTLP/HTTP and registering the provider globally.
///
/// Without an endpoint the provider has no span processor, so spans are
/// created and ended but never leave the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtlpBackend;

impl OtlpBackend {
    pub fn new() -> Self {
        Self
    }

    fn span_processor(
        config: &MirrorConfig,
        endpoint: &str,
    ) -> Result<BatchSpanProcessor<runtime::Tokio>, MirrorError> {
        let mut exporter = opentelemetry_otlp::new_exporter()
            .http()
            .with_endpoint(endpoint)
            .with_timeout(config.flush_timeout());
        if let Some(headers) = &config.headers {
            let headers: HashMap<String, String> = headers.clone().into_iter().collect();
            exporter = exporter.with_headers(headers);
        }
        let exporter = exporter.build_span_exporter()?;

        let batch_config = BatchConfigBuilder::default()
            .with_max_export_timeout(config.flush_timeout())
            .build();
        Ok(BatchSpanProcessor::builder(exporter, runtime::Tokio)
            .with_batch_config(batch_config)
            .build())
    }
}

#[async_trait]
impl TracingBackend for OtlpBackend {
    async fn install(&self, config: &MirrorConfig) -> Result<MirrorRuntime, MirrorError> {
        let mut builder = TracerProvider::builder().with_config(mirror_trace_config(config));

        if let Some(endpoint) = config.endpoint.as_deref() {
            Handle::try_current().map_err(|_| MirrorError::NoRuntime)?;
            builder = builder.with_span_processor(Self::span_processor(config, endpoint)?);
            debug!(endpoint, "Attached OTLP batch exporter");
        } else {
            debug!("No OTLP endpoint configured; mirrored spans stay in-process");
        }

        let provider = builder.build();
        global::set_tracer_provider(provider.clone());
        Ok(MirrorRuntime::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::Value;

    #[test]
    fn test_sampler_edges() {
        assert!(matches!(mirror_sampler(1.0), Sampler::AlwaysOn));
        assert!(matches!(mirror_sampler(0.0), Sampler::AlwaysOff));
        assert!(matches!(mirror_sampler(0.5), Sampler::TraceIdRatioBased(r) if r == 0.5));
    }

    #[test]
    fn test_resource_tags_service_and_channel() {
        let config = MirrorConfig {
            service_name: Some("x".to_string()),
            ..MirrorConfig::default()
        };
        let resource = mirror_resource(&config);
        assert_eq!(
            resource.get("service.name".into()),
            Some(Value::from("x"))
        );
        assert_eq!(
            resource.get(CHANNEL_ATTRIBUTE.into()),
            Some(Value::from(CHANNEL_VALUE))
        );
    }

    #[tokio::test]
    async fn test_install_without_endpoint_is_ready() {
        let config = MirrorConfig {
            enabled: true,
            service_name: Some("x".to_string()),
            ..MirrorConfig::default()
        };
        let runtime = OtlpBackend::new().install(&config).await.expect("install");
        runtime.shutdown(Duration::from_millis(500));
    }
}
