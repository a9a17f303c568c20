//! Decide whether a primary sender gets an OpenTelemetry mirror.

use crate::backend::{OtlpBackend, TracingBackend};
use crate::config::{MirrorConfig, SettingsKeys};
use crate::mirror_sender::OtelMirrorSender;
use crate::wrapped_sender::WrappedSender;
use chat_telemetry_core::{SettingsReader, SharedSender};
use std::sync::Arc;
use tracing::{debug, Instrument};

/// Wrap `base` with an OTLP mirror if settings enable it.
///
/// Returns `base` itself when mirroring is disabled. Callers that cannot wait
/// may keep using `base` and adopt the result once it resolves.
pub async fn maybe_wrap_with_mirror<R>(base: SharedSender, settings: &R) -> SharedSender
where
    R: SettingsReader + ?Sized,
{
    maybe_wrap_with_mirror_using(base, settings, &SettingsKeys::default(), OtlpBackend::new)
        .await
}

/// Like [`maybe_wrap_with_mirror`], with custom keys and backend.
///
/// `backend` is only invoked when mirroring is enabled. When disabled, the
/// returned handle is the same allocation as `base` and nothing is awaited.
pub async fn maybe_wrap_with_mirror_using<R, F, B>(
    base: SharedSender,
    settings: &R,
    keys: &SettingsKeys,
    backend: F,
) -> SharedSender
where
    R: SettingsReader + ?Sized,
    F: FnOnce() -> B,
    B: TracingBackend + 'static,
{
    match activate_mirror(settings, keys, backend).await {
        Some(mirror) => Arc::new(WrappedSender::new(base, mirror)),
        None => base,
    }
}

/// Build and initialize a mirror sender, or `None` when mirroring is disabled.
///
/// The returned mirror may be unavailable if its backend failed; it is still
/// safe to send through. Hosts that compose the wrapper themselves use this to
/// keep a handle on the mirror alone.
pub async fn activate_mirror<R, F, B>(
    settings: &R,
    keys: &SettingsKeys,
    backend: F,
) -> Option<Arc<OtelMirrorSender>>
where
    R: SettingsReader + ?Sized,
    F: FnOnce() -> B,
    B: TracingBackend + 'static,
{
    let config = MirrorConfig::from_settings_with_keys(settings, keys);
    if !config.enabled {
        debug!("OpenTelemetry mirroring disabled; using primary sender only");
        return None;
    }

    let span = tracing::info_span!(
        "otel_mirror.activate",
        service_name = %config.service_name(),
        has_endpoint = config.endpoint.is_some()
    );
    let mirror = Arc::new(OtelMirrorSender::new(config, Arc::new(backend())));
    let status = mirror.init().instrument(span).await;
    debug!(?status, "OpenTelemetry mirror activation finished");
    Some(mirror)
}
