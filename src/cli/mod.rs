//! CLI interface for tickerwatch
//!
//! Provides subcommands for:
//! - `watch`: Stream live prices for a set of assets
//! - `search`: Look up assets by name or symbol
//! - `stats`: Fetch current and opening price of one asset
//! - `symbols`: Build or inspect the symbol-id cache
//! - `config`: Show the effective configuration

mod search;
mod stats;
mod symbols;
mod watch;

pub use search::SearchArgs;
pub use stats::StatsArgs;
pub use symbols::SymbolsArgs;
pub use watch::WatchArgs;

use crate::config::Config;
use crate::feed::{CoinbaseFeed, FinnhubFeed};
use crate::markets::{EventQueue, MarketEvent, Markets};
use crate::paths::DataPaths;
use crate::rest::FinnhubRest;
use crate::symbols::{load_or_generate, SymbolIdCache};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "tickerwatch")]
#[command(about = "Live stock and crypto prices from Coinbase and Finnhub")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    /// Store this Finnhub API key before running the command
    #[arg(long, global = true)]
    pub key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream live prices until interrupted
    Watch(WatchArgs),
    /// Search for assets
    Search(SearchArgs),
    /// Fetch current and opening price
    Stats(StatsArgs),
    /// Build or inspect the symbol-id cache
    Symbols(SymbolsArgs),
    /// Show configuration
    Config,
}

/// Configuration and file locations shared by every command
pub struct Context {
    pub config: Config,
    pub paths: DataPaths,
}

impl Context {
    pub fn new(config: Config, paths: DataPaths) -> Self {
        Self { config, paths }
    }

    pub fn api_key(&self) -> anyhow::Result<String> {
        self.paths
            .read_api_key()
            .context("A Finnhub API key is required, pass one with --key")
    }

    /// REST client without a symbol table
    pub fn rest_client(&self, api_key: &str) -> FinnhubRest {
        FinnhubRest::with_config(self.config.finnhub.rest_config(), api_key)
    }

    /// Load the symbol-id cache, crawling Finnhub when it is absent
    pub async fn symbol_ids(&self, rest: &FinnhubRest, regenerate: bool) -> Arc<SymbolIdCache> {
        Arc::new(load_or_generate(self.paths.symbol_ids_file(), rest, regenerate).await)
    }

    /// Build both feeds, the REST client and the facade over them
    pub async fn connect(&self) -> anyhow::Result<(Markets, EventQueue)> {
        let api_key = self.api_key()?;
        let rest = self.rest_client(&api_key);
        let ids = self.symbol_ids(&rest, false).await;
        let rest = rest.with_ids(Arc::clone(&ids));

        let stream = &self.config.stream;
        let coinbase = CoinbaseFeed::with_config(stream.ws_config(&self.config.coinbase.ws_url));
        let finnhub = FinnhubFeed::with_config(
            stream.ws_config(FinnhubFeed::build_ws_url(&self.config.finnhub.ws_url, &api_key)),
            ids,
        );

        Ok(Markets::new(
            Box::new(coinbase),
            Box::new(finnhub),
            Box::new(rest),
            self.config.markets.timing(),
        ))
    }
}

/// Wait until `pick` accepts an event or `limit` passes
pub(crate) async fn wait_for<T>(
    events: &mut EventQueue,
    limit: Duration,
    mut pick: impl FnMut(MarketEvent) -> Option<T>,
) -> anyhow::Result<T> {
    let wait = async {
        while let Some(event) = events.next().await {
            if let Some(found) = pick(event) {
                return Some(found);
            }
        }
        None
    };

    match tokio::time::timeout(limit, wait).await {
        Ok(Some(found)) => Ok(found),
        Ok(None) => anyhow::bail!("Event queue closed"),
        Err(_) => anyhow::bail!("No answer within {:?}", limit),
    }
}
