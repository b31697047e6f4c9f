//! Coinbase WebSocket ticker feed

use super::session::StreamSession;
use super::ExchangeClient;
use crate::asset::{Asset, CurrencyPair, Price, COINBASE_EXCHANGE};
use crate::error::{MarketError, Result};
use crate::telemetry::{increment, CounterMetric};
use crate::ws::WsConfig;
use async_trait::async_trait;
use serde::Deserialize;

/// Coinbase WebSocket feed URL
pub const COINBASE_WS_URL: &str = "wss://ws-feed.exchange.coinbase.com";

const NAME: &str = "Coinbase";

/// Coinbase feed message; only the fields we read
#[derive(Debug, Deserialize)]
struct FeedMessage {
    #[serde(rename = "type")]
    kind: String,
    product_id: Option<String>,
    price: Option<String>,
    message: Option<String>,
    reason: Option<String>,
}

/// Live prices from the Coinbase `ticker` channel
pub struct CoinbaseFeed {
    session: StreamSession,
}

impl CoinbaseFeed {
    /// Create a feed against the public Coinbase endpoint
    pub fn new() -> Self {
        Self::with_config(WsConfig::new(COINBASE_WS_URL))
    }

    pub fn with_config(config: WsConfig) -> Self {
        Self {
            session: StreamSession::new(NAME, config, subscribe_message),
        }
    }

    /// Parse one feed message; `None` for anything that is not a ticker
    pub fn parse_message(text: &str) -> Result<Option<Price>> {
        let msg: FeedMessage = serde_json::from_str(text)?;

        match msg.kind.as_str() {
            "ticker" => {
                let (Some(product_id), Some(price)) = (msg.product_id, msg.price) else {
                    tracing::debug!(exchange = NAME, "Ticker without product_id or price");
                    return Ok(None);
                };
                match parse_product_id(&product_id) {
                    Some(currency) => Ok(Some(Price::new(
                        price,
                        Asset::new(COINBASE_EXCHANGE, currency),
                    ))),
                    None => {
                        tracing::debug!(exchange = NAME, product_id = %product_id, "Can't parse product id");
                        Ok(None)
                    }
                }
            }
            "error" => Err(MarketError::Protocol {
                exchange: NAME.to_string(),
                message: format!(
                    "{}: {}",
                    msg.message.unwrap_or_default(),
                    msg.reason.unwrap_or_default()
                ),
            }),
            _ => Ok(None),
        }
    }
}

impl Default for CoinbaseFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Coinbase product id: `BASE-QUOTE`
pub(crate) fn product_id(currency: &CurrencyPair) -> String {
    format!("{}-{}", currency.base, currency.quote)
}

/// Split a product id on the first '-': "XTZ-BTC" -> XTZ, BTC
pub(crate) fn parse_product_id(product_id: &str) -> Option<CurrencyPair> {
    let (base, quote) = product_id.split_once('-')?;
    if base.is_empty() || quote.is_empty() {
        return None;
    }
    Some(CurrencyPair::new(base, quote))
}

fn control_message(kind: &str, product_id: &str) -> String {
    serde_json::json!({
        "type": kind,
        "product_ids": [product_id],
        "channels": ["ticker"],
    })
    .to_string()
}

fn subscribe_message(product_id: &str) -> String {
    control_message("subscribe", product_id)
}

#[async_trait]
impl ExchangeClient for CoinbaseFeed {
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
        self.session.subscribe(product_id(&asset.currency)).await;
    }

    async fn unsubscribe(&mut self, asset: &Asset) {
        let id = product_id(&asset.currency);
        let message = control_message("unsubscribe", &id);
        self.session.unsubscribe(&id, message).await;
    }

    async fn stream_read(&mut self) -> Result<Vec<Price>> {
        let Some(text) = self.session.read().await? else {
            return Ok(Vec::new());
        };

        match Self::parse_message(&text) {
            Ok(Some(price)) => {
                increment(CounterMetric::PricesReceived, NAME, 1);
                Ok(vec![price])
            }
            Ok(None) => Ok(Vec::new()),
            Err(e) => {
                tracing::error!(exchange = NAME, error = %e, "Dropping feed message");
                Ok(Vec::new())
            }
        }
    }

    fn subscription_count(&self) -> usize {
        self.session.subscription_count()
    }
}
