//! Finnhub WebSocket trade feed
//!
//! Finnhub batches several trades into one message and may deliver them out
//! of order, so every read is collapsed to the newest price per asset before
//! it leaves this module.

use super::session::StreamSession;
use super::ExchangeClient;
use crate::asset::{Asset, Price};
use crate::error::{MarketError, Result};
use crate::symbols::SymbolIdCache;
use crate::telemetry::{increment, CounterMetric};
use crate::ws::WsConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Finnhub WebSocket base URL
pub const FINNHUB_WS_URL: &str = "wss://ws.finnhub.io";

const NAME: &str = "Finnhub";

#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Trade {
    /// Symbol id
    #[serde(rename = "s")]
    symbol: String,
    /// Price; `arbitrary_precision` keeps the number text Finnhub sent
    #[serde(rename = "p")]
    price: serde_json::Number,
}

/// Live trades for stocks and non-Coinbase crypto
pub struct FinnhubFeed {
    session: StreamSession,
    ids: Arc<SymbolIdCache>,
}

impl FinnhubFeed {
    /// Create a feed against the public Finnhub endpoint
    pub fn new(api_key: &str, ids: Arc<SymbolIdCache>) -> Self {
        Self::with_config(WsConfig::new(Self::build_ws_url(FINNHUB_WS_URL, api_key)), ids)
    }

    pub fn with_config(config: WsConfig, ids: Arc<SymbolIdCache>) -> Self {
        Self {
            session: StreamSession::new(NAME, config, subscribe_message),
            ids,
        }
    }

    /// Build the WebSocket URL carrying the API token
    pub fn build_ws_url(base_url: &str, api_key: &str) -> String {
        format!("{}/?token={}", base_url.trim_end_matches('/'), api_key)
    }

    /// Parse one stream message into its trades, in arrival order
    pub fn parse_trades(text: &str, ids: &SymbolIdCache) -> Result<Vec<Price>> {
        let msg: StreamMessage = serde_json::from_str(text)?;

        match msg.kind.as_str() {
            "trade" => {
                let trades: Vec<Trade> = serde_json::from_value(msg.data)?;
                Ok(trades
                    .into_iter()
                    .map(|t| Price::new(t.price.to_string(), ids.find_asset(&t.symbol)))
                    .collect())
            }
            "error" => Err(MarketError::Protocol {
                exchange: NAME.to_string(),
                message: msg.msg.unwrap_or_default(),
            }),
            _ => Ok(Vec::new()),
        }
    }
}

/// Keep only the newest price per asset
///
/// Stable sort by asset, then keep the last entry of each run. The result is
/// ordered by asset.
pub fn keep_latest_per_asset(mut prices: Vec<Price>) -> Vec<Price> {
    prices.sort_by(|a, b| a.asset.cmp(&b.asset));

    let mut latest: Vec<Price> = Vec::with_capacity(prices.len());
    for price in prices {
        match latest.last_mut() {
            Some(last) if last.asset == price.asset => *last = price,
            _ => latest.push(price),
        }
    }
    latest
}

fn control_message(kind: &str, symbol_id: &str) -> String {
    serde_json::json!({ "type": kind, "symbol": symbol_id }).to_string()
}

fn subscribe_message(symbol_id: &str) -> String {
    control_message("subscribe", symbol_id)
}

#[async_trait]
impl ExchangeClient for FinnhubFeed {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn connect_ws(&mut self) {
        self.session.connect().await;
    }

    async fn disconnect_ws(&mut self) {
        self.session.disconnect().await;
    }

    async fn subscribe(&mut self, asset: &Asset) {
        let id = self.ids.find_symbol_id(asset);
        self.session.subscribe(id).await;
    }

    async fn unsubscribe(&mut self, asset: &Asset) {
        let id = self.ids.find_symbol_id(asset);
        let message = control_message("unsubscribe", &id);
        self.session.unsubscribe(&id, message).await;
    }

    async fn stream_read(&mut self) -> Result<Vec<Price>> {
        let Some(text) = self.session.read().await? else {
            return Ok(Vec::new());
        };

        match Self::parse_trades(&text, &self.ids) {
            Ok(prices) => {
                let prices = keep_latest_per_asset(prices);
                if !prices.is_empty() {
                    increment(CounterMetric::PricesReceived, NAME, prices.len() as u64);
                }
                Ok(prices)
            }
            Err(e) => {
                tracing::error!(exchange = NAME, error = %e, "Dropping stream message");
                Ok(Vec::new())
            }
        }
    }

    fn subscription_count(&self) -> usize {
        self.session.subscription_count()
    }
}
