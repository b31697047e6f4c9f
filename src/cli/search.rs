//! Search command implementation

use super::{wait_for, Context};
use crate::markets::{MarketEvent, MarketRequests};
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Name or symbol to look for
    pub query: String,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,
}

impl SearchArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let (markets, mut events) = ctx.connect().await?;
        markets.request_search(&self.query);

        let results = wait_for(&mut events, Duration::from_secs(self.timeout_secs), |e| match e {
            MarketEvent::SearchResults(results) => Some(results),
            _ => None,
        })
        .await;
        markets.shutdown().await;

        let results = results?;
        if results.is_empty() {
            println!("No results for {}", self.query);
        }
        for result in results {
            println!("{}\t{}\t{}", result.asset, result.kind, result.description);
        }
        Ok(())
    }
}
