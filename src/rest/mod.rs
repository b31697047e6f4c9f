//! REST quote and search providers

mod finnhub;

pub use finnhub::{CryptoSymbol, FinnhubRest, FinnhubRestConfig, FINNHUB_API_URL};

use crate::asset::{Asset, SearchResult, Stats};
use async_trait::async_trait;

/// Request/response half of an exchange client
///
/// One instance is shared by the stats and search workers behind a mutex.
/// Both calls always return a value: failures become [`Stats::UNAVAILABLE`]
/// or an empty list so one bad asset never sinks a batch.
#[async_trait]
pub trait QuoteSource: Send {
    /// Open the HTTP client
    fn connect_http(&mut self);

    /// Drop the HTTP client
    fn disconnect_http(&mut self);

    fn is_connected(&self) -> bool;

    /// Current and opening price of one asset
    async fn stats(&mut self, asset: &Asset) -> Stats;

    /// Free-text asset search
    async fn search(&mut self, query: &str) -> Vec<SearchResult>;
}
