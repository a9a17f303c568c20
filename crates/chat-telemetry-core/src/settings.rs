//! Settings reader capability and JSON-backed sources.
//!
//! Readers only report what is stored under a key. Applying defaults and
//! rejecting mistyped values is the job of whoever builds configuration from
//! them, so a reader never has a failure mode of its own.

use crate::error::{Result, TelemetryError};
use serde_json::{Map, Value};
use std::path::Path;

/// Trait for looking up a single setting by its dotted key
pub trait SettingsReader: Send + Sync {
    /// Raw value stored under `key`, if any
    fn get_value(&self, key: &str) -> Option<Value>;
}

/// Reader with nothing configured; every lookup yields `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSettings;

impl SettingsReader for NoSettings {
    fn get_value(&self, _key: &str) -> Option<Value> {
        None
    }
}

/// Settings held in a JSON object.
///
/// Keys are looked up flat first (`"chat.experimentalOtel.enabled": true`,
/// as editor settings files store them), then as a nested path split on `.`.
#[derive(Debug, Clone, Default)]
pub struct JsonSettings {
    root: Map<String, Value>,
}

impl JsonSettings {
    pub fn new(root: Map<String, Value>) -> Self {
        Self { root }
    }

    /// Build from an arbitrary JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self::new(root)),
            other => Err(TelemetryError::Settings(format!(
                "settings root must be a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(value)
    }

    /// Load a settings file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), keys = settings.root.len(), "Loaded settings file");
        Ok(settings)
    }

    /// Store a value under a flat key, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.root.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    fn nested(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl SettingsReader for JsonSettings {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.root
            .get(key)
            .or_else(|| self.nested(key))
            .filter(|value| !value.is_null())
            .cloned()
    }
}

impl<F> SettingsReader for F
where
    F: Fn(&str) -> Option<Value> + Send + Sync,
{
    fn get_value(&self, key: &str) -> Option<Value> {
        self(key)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
