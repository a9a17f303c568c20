//! Tests for primary-then-mirror dispatch

use chat_telemetry_core::{SharedSender, TelemetryError, TelemetryProperties, TelemetrySender};
use chat_telemetry_otel::{MirrorConfig, MirrorStatus, OtelMirrorSender, WrappedSender};
use std::sync::Arc;
use test_support::{CallLog, FailingSender, InMemoryBackend, RecordingSender};
use tracing_test::traced_test;

fn recording_pair(log: &CallLog) -> WrappedSender<RecordingSender> {
    let primary: SharedSender = Arc::new(RecordingSender::new("primary", log.clone()));
    let mirror = Arc::new(RecordingSender::new("mirror", log.clone()));
    WrappedSender::new(primary, mirror)
}

#[test]
fn test_primary_records_before_mirror() {
    let log = CallLog::new();
    let wrapped = recording_pair(&log);

    let mut properties = TelemetryProperties::new();
    properties.insert("k".to_string(), "v".to_string());
    wrapped.send_event("chat.opened", Some(&properties), None).unwrap();

    assert_eq!(log.labels(), vec!["primary:send_event", "mirror:send_event"]);
    let calls = log.calls();
    assert_eq!(calls[0].properties, calls[1].properties);
    assert_eq!(calls[1].event_name.as_deref(), Some("chat.opened"));
}

#[test]
fn test_error_events_and_dispose_keep_order() {
    let log = CallLog::new();
    let wrapped = recording_pair(&log);

    wrapped.send_error_event("chat.failed", None, None).unwrap();
    wrapped.dispose();

    assert_eq!(
        log.labels(),
        vec![
            "primary:send_error_event",
            "mirror:send_error_event",
            "primary:dispose",
            "mirror:dispose",
        ]
    );
}

#[test]
fn test_primary_failure_propagates_and_skips_mirror() {
    let log = CallLog::new();
    let primary: SharedSender = Arc::new(FailingSender::new("primary", log.clone()));
    let mirror = Arc::new(RecordingSender::new("mirror", log.clone()));
    let wrapped = WrappedSender::new(primary, mirror);

    let err = wrapped.send_event("chat.opened", None, None).unwrap_err();
    assert!(matches!(err, TelemetryError::Delivery { .. }));
    assert_eq!(log.labels(), vec!["primary:send_event"]);
}

#[traced_test]
#[test]
fn test_mirror_failure_is_logged_and_dropped() {
    let log = CallLog::new();
    let primary: SharedSender = Arc::new(RecordingSender::new("primary", log.clone()));
    let mirror = Arc::new(FailingSender::new("mirror", log.clone()));
    let wrapped = WrappedSender::new(primary, mirror);

    assert!(wrapped.send_error_event("chat.failed", None, None).is_ok());
    assert_eq!(
        log.labels(),
        vec!["primary:send_error_event", "mirror:send_error_event"]
    );
    assert!(logs_contain("Mirror sender failed; ignoring"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wrapper_over_real_mirror_emits_spans() {
    let log = CallLog::new();
    let backend = InMemoryBackend::new();
    let config = MirrorConfig {
        enabled: true,
        ..MirrorConfig::default()
    };
    let mirror = Arc::new(OtelMirrorSender::new(config, Arc::new(backend.clone())));
    assert_eq!(mirror.init().await, MirrorStatus::Ready);

    let primary: SharedSender = Arc::new(RecordingSender::new("primary", log.clone()));
    let wrapped = WrappedSender::new(primary.clone(), mirror);
    assert!(Arc::ptr_eq(wrapped.base(), &primary));
    assert!(wrapped.mirror().status().is_ready());

    wrapped.send_event("one", None, None).unwrap();
    wrapped.send_error_event("two", None, None).unwrap();

    assert_eq!(log.len(), 2);
    assert_eq!(backend.finished_spans().len(), 2);

    wrapped.dispose();
    assert_eq!(wrapped.mirror().status(), MirrorStatus::Disposed);
    assert_eq!(backend.shutdown_count(), 1);
}
