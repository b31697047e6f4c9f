//! Live price feeds
//!
//! One streaming client per provider: Coinbase for `COINBASE` crypto pairs,
//! Finnhub for stocks and every other crypto exchange.

mod coinbase;
mod finnhub;
mod session;

pub use coinbase::{CoinbaseFeed, COINBASE_WS_URL};
pub use finnhub::{keep_latest_per_asset, FinnhubFeed, FINNHUB_WS_URL};

use crate::asset::{Asset, Price};
use crate::error::Result;
use async_trait::async_trait;

/// Streaming half of an exchange client
///
/// Driven by exactly one poll loop, which owns the client. Subscribe and
/// unsubscribe are best-effort: failures are logged, never returned.
#[async_trait]
pub trait ExchangeClient: Send {
    /// Provider name used in logs and metric labels
    fn name(&self) -> &'static str;

    /// Open the streaming connection
    async fn connect_ws(&mut self);

    /// Close the streaming connection
    async fn disconnect_ws(&mut self);

    /// Start receiving prices for the asset, connecting first if needed
    async fn subscribe(&mut self, asset: &Asset);

    /// Stop receiving prices for the asset
    async fn unsubscribe(&mut self, asset: &Asset);

    /// Perform one read and parse it into zero or more prices
    ///
    /// An `Err` means the stream is gone for good and the caller should stop
    /// reading.
    async fn stream_read(&mut self) -> Result<Vec<Price>>;

    /// Number of currently active subscriptions
    fn subscription_count(&self) -> usize;
}
