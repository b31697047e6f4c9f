//! Finnhub REST client
//!
//! Quotes, symbol search and the crypto symbol crawl used to build the
//! symbol-id cache. The API token is sent as a query parameter and never
//! logged.

use super::QuoteSource;
use crate::asset::{Asset, SearchResult, Stats};
use crate::error::{MarketError, Result};
use crate::symbols::SymbolIdCache;
use crate::telemetry::{increment, record_latency, CounterMetric, LatencyMetric};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Finnhub REST API base URL
pub const FINNHUB_API_URL: &str = "https://finnhub.io/api/v1";

const NAME: &str = "Finnhub";

/// Configuration for the Finnhub REST client
#[derive(Debug, Clone)]
pub struct FinnhubRestConfig {
    /// Base URL including the API version prefix
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for FinnhubRestConfig {
    fn default() -> Self {
        Self {
            base_url: FINNHUB_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// One entry of `/crypto/symbol`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoSymbol {
    /// Finnhub symbol id, e.g. "BINANCE:BTCUSDT"
    pub symbol: String,
    /// Human form, e.g. "BTC/USDT"
    pub display_symbol: String,
}

/// `/quote` response
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Previous close
    pc: Option<f64>,
}

/// `/search` response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    description: String,
    symbol: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Client for Finnhub's REST API
pub struct FinnhubRest {
    config: FinnhubRestConfig,
    api_key: String,
    client: Option<Client>,
    ids: Arc<SymbolIdCache>,
}

impl FinnhubRest {
    /// Create a client against the public Finnhub API
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(FinnhubRestConfig::default(), api_key)
    }

    /// Create a client with custom configuration; connects immediately
    pub fn with_config(config: FinnhubRestConfig, api_key: impl Into<String>) -> Self {
        let mut rest = Self {
            config,
            api_key: api_key.into(),
            client: None,
            ids: Arc::new(SymbolIdCache::default()),
        };
        rest.connect_http();
        rest
    }

    /// Use the given symbol-id table for quotes and search
    pub fn with_ids(mut self, ids: Arc<SymbolIdCache>) -> Self {
        self.ids = ids;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch the quote for one asset
    pub async fn quote(&self, asset: &Asset) -> Result<Stats> {
        let symbol_id = self.ids.find_symbol_id(asset);
        let quote: QuoteResponse = self
            .get_json("quote", &[("symbol", symbol_id.as_str())], "Finnhub - Failed to get stats")
            .await?;

        let current = quote
            .c
            .ok_or_else(|| MarketError::Parse(format!("quote for {} has no current price", symbol_id)))?;
        Ok(Stats::new(current, quote.pc.unwrap_or(0.0)))
    }

    /// Run a symbol search and keep the supported hits
    pub async fn lookup(&self, query: &str) -> Result<Vec<SearchResult>> {
        let context = format!("Finnhub - Failed to search for: {}", query);
        let response: SearchResponse = self.get_json("search", &[("q", query)], &context).await?;
        Ok(filter_search_hits(response.result, &self.ids))
    }

    /// List the crypto exchanges Finnhub knows about
    pub async fn crypto_exchanges(&self) -> Result<Vec<String>> {
        self.get_json("crypto/exchange", &[], "Finnhub - Failed to read crypto exchanges")
            .await
    }

    /// List the crypto symbols of one exchange
    pub async fn crypto_symbols(&self, exchange: &str) -> Result<Vec<CryptoSymbol>> {
        let context = format!("Finnhub - Failed to read crypto symbols for {}", exchange);
        self.get_json("crypto/symbol", &[("exchange", exchange)], &context)
            .await
    }

    /// GET `{base_url}/{resource}` with the token appended and decode the body
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<T> {
        let client = self.client.as_ref().ok_or(MarketError::NotConnected)?;
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), resource);

        tracing::debug!(url = %url, query = ?query, "Accessing Finnhub");

        let response = client
            .get(&url)
            .query(query)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::Http {
                status,
                context: context.to_string(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Turn raw search hits into assets
///
/// Crypto hits must resolve through the symbol-id table; anything else is a
/// stock quoted in USD, except symbols with a '.' which are listed on foreign
/// exchanges and unsupported.
fn filter_search_hits(hits: Vec<SearchHit>, ids: &SymbolIdCache) -> Vec<SearchResult> {
    hits.into_iter()
        .filter_map(|hit| {
            let asset = if hit.kind == "Crypto" {
                if !ids.is_cached(&hit.symbol) {
                    return None;
                }
                ids.find_asset(&hit.symbol)
            } else {
                if hit.symbol.contains('.') {
                    return None;
                }
                Asset::stock(hit.symbol)
            };
            Some(SearchResult {
                kind: hit.kind,
                description: hit.description,
                asset,
            })
        })
        .collect()
}

#[async_trait]
impl QuoteSource for FinnhubRest {
    fn connect_http(&mut self) {
        if self.client.is_some() {
            return;
        }
        tracing::info!(url = %self.config.base_url, "HTTPS connect");
        match Client::builder().timeout(self.config.timeout).build() {
            Ok(client) => self.client = Some(client),
            Err(e) => tracing::error!(error = %e, "Finnhub failed to connect over HTTPS"),
        }
    }

    fn disconnect_http(&mut self) {
        self.client = None;
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn stats(&mut self, asset: &Asset) -> Stats {
        self.connect_http();
        increment(CounterMetric::StatsRequests, NAME, 1);

        let started = Instant::now();
        let result = self.quote(asset).await;
        record_latency(LatencyMetric::StatsRequest, started.elapsed());

        match result {
            Ok(stats) => stats,
            Err(e) => {
                increment(CounterMetric::StatsFailures, NAME, 1);
                tracing::error!(asset = %asset, error = %e, "Finnhub failed to retrieve stats");
                Stats::UNAVAILABLE
            }
        }
    }

    async fn search(&mut self, query: &str) -> Vec<SearchResult> {
        self.connect_http();
        increment(CounterMetric::Searches, NAME, 1);

        let started = Instant::now();
        let result = self.lookup(query).await;
        record_latency(LatencyMetric::SearchRequest, started.elapsed());

        result.unwrap_or_else(|e| {
            tracing::error!(query = %query, error = %e, "Finnhub failed to search");
            Vec::new()
        })
    }
}
