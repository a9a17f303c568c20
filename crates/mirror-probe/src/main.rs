//! mirror-probe - emit probe events through the chat telemetry service
//!
//! Loads a JSON settings file, starts the telemetry service with log-backed
//! primary senders and sends a batch of enhanced events. When the settings
//! enable `<namespace>.experimentalOtel`, those events are mirrored as spans.

mod log_sender;

use anyhow::{Context, Result};
use chat_telemetry_core::{JsonSettings, SettingsReader, TelemetryMeasurements, TelemetryProperties};
use chat_telemetry_otel::config::{DEFAULT_NAMESPACE, DEFAULT_PRODUCT};
use chat_telemetry_otel::tracing_setup::{self, DEFAULT_LOG_FILTER};
use chat_telemetry_otel::{MirrorConfig, OtlpBackend, SettingsKeys};
use chat_telemetry_service::TelemetryService;
use clap::Parser;
use log_sender::LogSender;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mirror-probe", version, about = "Send probe events through chat telemetry")]
struct Cli {
    /// JSON settings file (flat dotted keys or nested objects).
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Settings namespace holding the `experimentalOtel` block.
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Product name used to derive the default service name.
    #[arg(long, default_value = DEFAULT_PRODUCT)]
    product: String,

    /// Event name to send.
    #[arg(long, default_value = "mirror.probe")]
    event: String,

    /// Number of events to send.
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Send error events instead of regular ones.
    #[arg(long)]
    error: bool,

    /// Print the resolved mirror configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,

    /// Extra event property, repeatable: key=value
    #[arg(long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, String)>,
}

fn parse_property(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty property key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn load_settings(path: Option<&PathBuf>) -> Result<JsonSettings> {
    match path {
        Some(path) => JsonSettings::from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(JsonSettings::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_setup::init_tracing(DEFAULT_LOG_FILTER).context("Failed to initialize logging")?;

    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_ref())?;
    let keys = SettingsKeys::new(cli.namespace.clone(), cli.product.clone());

    let config = MirrorConfig::from_settings_with_keys(&settings, &keys);
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    info!(
        enabled = config.enabled,
        endpoint = config.endpoint.as_deref().unwrap_or("<none>"),
        service_name = %config.service_name(),
        "Mirror configuration"
    );

    let settings: Arc<dyn SettingsReader> = Arc::new(settings);
    let service = TelemetryService::with_activation(
        Arc::new(LogSender::new("standard")),
        Arc::new(LogSender::new("enhanced")),
        settings,
        keys,
        OtlpBackend::new,
    );
    service.wait_for_activation().await;

    if service.is_mirroring() {
        info!("Enhanced events will be mirrored");
    } else if config.enabled {
        warn!("Mirroring was enabled but did not activate");
    }

    let properties: TelemetryProperties = cli.properties.into_iter().collect();
    for index in 0..cli.count {
        let mut measurements = TelemetryMeasurements::new();
        measurements.insert("probe.index".to_string(), f64::from(index));

        let sent = if cli.error {
            service.send_enhanced_error_event(&cli.event, Some(&properties), Some(&measurements))
        } else {
            service.send_enhanced_event(&cli.event, Some(&properties), Some(&measurements))
        };
        sent.with_context(|| format!("Failed to send probe event {index}"))?;
    }

    info!(count = cli.count, event = %cli.event, "Probe events sent");
    service.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_property() {
        assert_eq!(
            parse_property("surface=panel").unwrap(),
            ("surface".to_string(), "panel".to_string())
        );
        assert_eq!(
            parse_property("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
        assert!(parse_property("novalue").is_err());
        assert!(parse_property("=x").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["mirror-probe"]).unwrap();
        assert_eq!(cli.namespace, DEFAULT_NAMESPACE);
        assert_eq!(cli.product, DEFAULT_PRODUCT);
        assert_eq!(cli.count, 1);
        assert!(!cli.error);
        assert!(!cli.print_config);
        assert!(cli.settings.is_none());
    }
}
