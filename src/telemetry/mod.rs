//! Telemetry module
//!
//! Logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{
    increment, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::Path;

/// Log file name inside the data directory
pub const LOG_FILE_NAME: &str = "tickerwatch.log";

/// Guard held for the life of the program
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize all telemetry subsystems
///
/// Must run inside a tokio runtime when a metrics port is configured.
pub fn init_telemetry(config: &TelemetryConfig, data_dir: &Path) -> anyhow::Result<TelemetryGuard> {
    let log_file = config.log_file.then(|| data_dir.join(LOG_FILE_NAME));
    init_logging(&config.log_level, config.log_format, log_file.as_deref())?;

    if let Some(port) = config.metrics_port {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
        tracing::info!(port, "Metrics exporter listening");
    }

    Ok(TelemetryGuard { _priv: () })
}
