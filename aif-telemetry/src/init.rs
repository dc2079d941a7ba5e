//! Telemetry initialization and configuration

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Initialize console logging on stderr.
///
/// The level comes from `RUST_LOG` and falls back to `info`. Stdout is left
/// to the flows' own console output.
///
/// # Arguments
/// * `service_name` - Name recorded on the startup event
///
/// # Example
/// ```
/// use aif_telemetry::init_telemetry;
/// init_telemetry("aif-cli").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    init_with_format(service_name, LogFormat::Text)
}

/// Initialize logging with an explicit [`LogFormat`].
///
/// Only the first call in a process installs a subscriber; later calls are no-ops.
pub fn init_with_format(
    service_name: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut outcome = Ok(());
    INIT.call_once(|| {
        outcome = install(service_name, format);
    });
    outcome
}

fn install(service_name: &str, format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?,
        LogFormat::Json => {
            tracing_subscriber::registry().with(filter).with(fmt_layer.json()).try_init()?
        }
    }

    tracing::info!(service.name = service_name, ?format, "Telemetry initialized");
    Ok(())
}
