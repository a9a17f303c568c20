//! Telemetry event payload types.

use std::collections::BTreeMap;

/// String-valued event properties, keyed by property name.
pub type TelemetryProperties = BTreeMap<String, String>;

/// Numeric event measurements, keyed by measurement name.
pub type TelemetryMeasurements = BTreeMap<String, f64>;

/// A single telemetry call, borrowed for the duration of one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryEvent<'a> {
    pub name: &'a str,
    pub properties: Option<&'a TelemetryProperties>,
    pub measurements: Option<&'a TelemetryMeasurements>,
}

impl<'a> TelemetryEvent<'a> {
    pub fn new(
        name: &'a str,
        properties: Option<&'a TelemetryProperties>,
        measurements: Option<&'a TelemetryMeasurements>,
    ) -> Self {
        Self {
            name,
            properties,
            measurements,
        }
    }

    /// Iterate over properties, empty when none were supplied.
    pub fn properties(&self) -> impl Iterator<Item = (&'a String, &'a String)> {
        self.properties.into_iter().flat_map(|props| props.iter())
    }

    /// Iterate over measurements, empty when none were supplied.
    pub fn measurements(&self) -> impl Iterator<Item = (&'a String, &'a f64)> {
        self.measurements.into_iter().flat_map(|measures| measures.iter())
    }
}
