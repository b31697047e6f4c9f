//! Configuration types for tickerwatch
//!
//! Every section and field has a default, so an empty file (or none at all)
//! yields a working configuration.

use crate::feed::{COINBASE_WS_URL, FINNHUB_WS_URL};
use crate::markets::LoopTiming;
use crate::rest::{FinnhubRestConfig, FINNHUB_API_URL};
use crate::telemetry::LogFormat;
use crate::ws::WsConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub finnhub: FinnhubConfig,
    pub coinbase: CoinbaseConfig,
    pub stream: StreamConfig,
    pub markets: MarketsConfig,
    pub paths: PathsConfig,
    pub telemetry: TelemetryConfig,
}

/// Finnhub endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FinnhubConfig {
    pub rest_url: String,
    pub ws_url: String,
    /// REST request timeout
    pub timeout_secs: u64,
}

impl Default for FinnhubConfig {
    fn default() -> Self {
        Self {
            rest_url: FINNHUB_API_URL.to_string(),
            ws_url: FINNHUB_WS_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Coinbase endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoinbaseConfig {
    pub ws_url: String,
}

impl Default for CoinbaseConfig {
    fn default() -> Self {
        Self {
            ws_url: COINBASE_WS_URL.to_string(),
        }
    }
}

/// Streaming connection behaviour shared by both exchanges
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Treat a read silent for this long as a dead connection
    pub read_timeout_secs: Option<u64>,
    /// 0 retries forever
    pub max_reconnect_attempts: u32,
    pub initial_reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: None,
            max_reconnect_attempts: 10,
            initial_reconnect_delay_ms: 1_000,
            max_reconnect_delay_ms: 60_000,
        }
    }
}

/// Worker loop pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketsConfig {
    pub market_idle_ms: u64,
    pub worker_idle_ms: u64,
    /// How often the watch command refreshes opening prices
    pub stats_refresh_secs: u64,
}

impl Default for MarketsConfig {
    fn default() -> Self {
        Self {
            market_idle_ms: 100,
            worker_idle_ms: 300,
            stats_refresh_secs: 300,
        }
    }
}

/// Local file locations
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Defaults to `$HOME/.tickerwatch`
    pub data_dir: Option<PathBuf>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Write logs to `<data_dir>/tickerwatch.log` instead of stderr
    pub log_file: bool,
    /// Prometheus exporter port; no exporter when unset
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_file: true,
            metrics_port: None,
        }
    }
}

impl StreamConfig {
    /// Connection settings for one stream URL
    pub fn ws_config(&self, url: impl Into<String>) -> WsConfig {
        WsConfig::new(url)
            .max_reconnects(self.max_reconnect_attempts)
            .initial_delay(Duration::from_millis(self.initial_reconnect_delay_ms))
            .max_delay(Duration::from_millis(self.max_reconnect_delay_ms))
            .read_timeout(self.read_timeout_secs.map(Duration::from_secs))
    }
}

impl FinnhubConfig {
    pub fn rest_config(&self) -> FinnhubRestConfig {
        FinnhubRestConfig {
            base_url: self.rest_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl MarketsConfig {
    pub fn timing(&self) -> LoopTiming {
        LoopTiming {
            market_idle: Duration::from_millis(self.market_idle_ms),
            worker_idle: Duration::from_millis(self.worker_idle_ms),
        }
    }

    pub fn stats_refresh(&self) -> Duration {
        Duration::from_secs(self.stats_refresh_secs.max(1))
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
