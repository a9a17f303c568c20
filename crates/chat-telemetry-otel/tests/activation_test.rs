//! Tests for the mirroring activation decision

use chat_telemetry_core::{JsonSettings, NoSettings, SharedSender, TelemetrySender};
use chat_telemetry_otel::{
    activate_mirror, maybe_wrap_with_mirror, maybe_wrap_with_mirror_using, MirrorStatus,
    OtlpBackend, SettingsKeys,
};
use futures_util::FutureExt;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use test_support::{enabled_settings, CallLog, FailingBackend, InMemoryBackend, RecordingSender};

fn primary(log: &CallLog) -> SharedSender {
    Arc::new(RecordingSender::new("primary", log.clone()))
}

#[test]
fn test_disabled_returns_same_sender_without_suspending() {
    let log = CallLog::new();
    let base = primary(&log);
    let factory_calls = AtomicUsize::new(0);

    let result = maybe_wrap_with_mirror_using(
        base.clone(),
        &NoSettings,
        &SettingsKeys::default(),
        || {
            factory_calls.fetch_add(1, Ordering::SeqCst);
            InMemoryBackend::new()
        },
    )
    .now_or_never()
    .expect("disabled activation completes without suspending");

    assert!(Arc::ptr_eq(&result, &base));
    assert_eq!(factory_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_explicitly_disabled_settings_return_same_sender() {
    let base = primary(&CallLog::new());
    let settings = JsonSettings::from_value(json!({
        "chat.experimentalOtel.enabled": false,
        "chat.experimentalOtel.endpoint": "http://collector:4318/v1/traces"
    }))
    .unwrap();

    let result = tokio_test::block_on(maybe_wrap_with_mirror(base.clone(), &settings));
    assert!(Arc::ptr_eq(&result, &base));
}

#[tokio::test]
async fn test_enabled_wraps_and_mirrors_every_event() {
    let log = CallLog::new();
    let base = primary(&log);
    let backend = InMemoryBackend::new();

    let wrapped = maybe_wrap_with_mirror_using(
        base.clone(),
        &enabled_settings("x"),
        &SettingsKeys::default(),
        {
            let backend = backend.clone();
            move || backend
        },
    )
    .await;

    assert!(!Arc::ptr_eq(&wrapped, &base));
    wrapped.send_event("a", None, None).unwrap();
    wrapped.send_error_event("b", None, None).unwrap();

    assert_eq!(log.labels(), vec!["primary:send_event", "primary:send_error_event"]);
    let names: Vec<_> = backend
        .finished_spans()
        .iter()
        .map(|span| span.name.to_string())
        .collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(backend.install_count(), 1);
}

#[tokio::test]
async fn test_failed_mirror_still_delivers_primary() {
    let log = CallLog::new();
    let base = primary(&log);

    let wrapped = maybe_wrap_with_mirror_using(
        base.clone(),
        &enabled_settings("x"),
        &SettingsKeys::default(),
        || FailingBackend,
    )
    .await;

    assert!(!Arc::ptr_eq(&wrapped, &base));
    wrapped.send_event("a", None, None).unwrap();
    wrapped.send_error_event("b", None, None).unwrap();
    assert_eq!(log.labels(), vec!["primary:send_event", "primary:send_error_event"]);
}

#[tokio::test]
async fn test_custom_keys_select_namespace() {
    let backend = InMemoryBackend::new();
    let base = primary(&CallLog::new());
    let settings = JsonSettings::from_value(json!({
        "acmeChat.experimentalOtel.enabled": true
    }))
    .unwrap();

    let default_keys = maybe_wrap_with_mirror_using(
        base.clone(),
        &settings,
        &SettingsKeys::default(),
        || backend.clone(),
    )
    .await;
    assert!(Arc::ptr_eq(&default_keys, &base));

    let acme_keys = maybe_wrap_with_mirror_using(
        base.clone(),
        &settings,
        &SettingsKeys::new("acmeChat", "acme"),
        || backend.clone(),
    )
    .await;
    assert!(!Arc::ptr_eq(&acme_keys, &base));
}

#[tokio::test]
async fn test_otlp_backend_without_endpoint_runs_spans_in_process() {
    let log = CallLog::new();
    let base = primary(&log);
    let settings = enabled_settings("x");

    let wrapped = maybe_wrap_with_mirror_using(
        base,
        &settings,
        &SettingsKeys::default(),
        OtlpBackend::new,
    )
    .await;

    assert!(wrapped.send_event("local.only", None, None).is_ok());
    assert!(wrapped.send_error_event("local.only", None, None).is_ok());
    wrapped.dispose();
    assert_eq!(
        log.labels(),
        vec!["primary:send_event", "primary:send_error_event", "primary:dispose"]
    );
}

#[test]
fn test_activate_mirror_disabled_yields_none() {
    let mirror = activate_mirror(&NoSettings, &SettingsKeys::default(), InMemoryBackend::new)
        .now_or_never()
        .expect("disabled activation completes without suspending");
    assert!(mirror.is_none());
}

#[tokio::test]
async fn test_activate_mirror_returns_unavailable_mirror_on_failure() {
    let mirror = activate_mirror(&enabled_settings("x"), &SettingsKeys::default(), || {
        FailingBackend
    })
    .await
    .expect("enabled settings build a mirror");

    assert!(matches!(mirror.status(), MirrorStatus::Unavailable { .. }));
    assert_eq!(mirror.config().service_name.as_deref(), Some("x"));
    assert!(mirror.send_event("dropped", None, None).is_ok());
}
