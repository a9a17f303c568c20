//! Mirroring configuration built from settings.
//!
//! Every field has a default, and a missing or mistyped setting falls back to
//! it, so whether mirroring runs is purely a matter of configuration.

use chat_telemetry_core::SettingsReader;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_NAMESPACE: &str = "chat";
pub const DEFAULT_PRODUCT: &str = "assistant";
pub const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_SPAN_SAMPLE_RATIO: f64 = 1.0;

const SETTINGS_SECTION: &str = "experimentalOtel";

/// Names the settings a [`MirrorConfig`] is read from.
///
/// Keys take the form `<namespace>.experimentalOtel.<field>`; the product
/// name only feeds the default service name, `<product>-chat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsKeys {
    namespace: String,
    product: String,
}

impl SettingsKeys {
    pub fn new(namespace: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            product: product.into(),
        }
    }

    pub fn key(&self, field: &str) -> String {
        format!("{}.{}.{}", self.namespace, SETTINGS_SECTION, field)
    }

    pub fn default_service_name(&self) -> String {
        format!("{}-chat", self.product)
    }
}

impl Default for SettingsKeys {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, DEFAULT_PRODUCT)
    }
}

/// Resolved mirroring settings.
///
/// Serializes with the settings' camelCase field names. Header values are
/// credentials in practice and are never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub service_name: Option<String>,
    #[serde(skip)]
    pub headers: Option<BTreeMap<String, String>>,
    pub flush_timeout_ms: u64,
    pub span_sample_ratio: f64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            service_name: Some(SettingsKeys::default().default_service_name()),
            headers: None,
            flush_timeout_ms: DEFAULT_FLUSH_TIMEOUT_MS,
            span_sample_ratio: DEFAULT_SPAN_SAMPLE_RATIO,
        }
    }
}

impl MirrorConfig {
    /// Read the configuration under the default namespace.
    pub fn from_settings<R: SettingsReader + ?Sized>(reader: &R) -> Self {
        Self::from_settings_with_keys(reader, &SettingsKeys::default())
    }

    pub fn from_settings_with_keys<R: SettingsReader + ?Sized>(
        reader: &R,
        keys: &SettingsKeys,
    ) -> Self {
        let read = |field: &str| reader.get_value(&keys.key(field));

        Self {
            enabled: read("enabled").and_then(|v| v.as_bool()).unwrap_or(false),
            endpoint: read("endpoint").and_then(non_empty_string),
            service_name: Some(
                read("serviceName")
                    .and_then(non_empty_string)
                    .unwrap_or_else(|| keys.default_service_name()),
            ),
            headers: read("headers").and_then(string_map),
            flush_timeout_ms: read("flushTimeoutMs")
                .and_then(|v| v.as_u64().or_else(|| whole_millis(&v)))
                .unwrap_or(DEFAULT_FLUSH_TIMEOUT_MS),
            span_sample_ratio: read("spanSampleRatio")
                .and_then(|v| v.as_f64())
                .map(clamp_ratio)
                .unwrap_or(DEFAULT_SPAN_SAMPLE_RATIO),
        }
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    /// Service name reported on the span resource.
    pub fn service_name(&self) -> String {
        self.service_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| SettingsKeys::default().default_service_name())
    }
}

fn non_empty_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn string_map(value: Value) -> Option<BTreeMap<String, String>> {
    let Value::Object(entries) = value else {
        return None;
    };
    let headers = entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            _ => None,
        })
        .collect();
    Some(headers)
}

// Accepts 2500.0 but not -1 or 12.5.
fn whole_millis(value: &Value) -> Option<u64> {
    let millis = value.as_f64()?;
    (millis >= 0.0 && millis.fract() == 0.0 && millis <= u64::MAX as f64).then(|| millis as u64)
}

fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        DEFAULT_SPAN_SAMPLE_RATIO
    } else {
        ratio.clamp(0.0, 1.0)
    }
}
