//! Stats command implementation

use super::{wait_for, Context};
use crate::asset::Asset;
use crate::markets::{MarketEvent, MarketRequests};
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Asset as EXCHANGE:BASE-QUOTE, or a bare stock symbol
    pub asset: String,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,
}

impl StatsArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let asset: Asset = self.asset.parse()?;
        let (markets, mut events) = ctx.connect().await?;
        markets.request_stats(&asset);

        let stats = wait_for(&mut events, Duration::from_secs(self.timeout_secs), |e| match e {
            MarketEvent::StatsReceived(received, stats) if received == asset => Some(stats),
            _ => None,
        })
        .await;
        markets.shutdown().await;

        let stats = stats?;
        if !stats.is_available() {
            anyhow::bail!("Stats unavailable for {}", asset);
        }
        println!("{}", asset);
        println!("  Current: {}", stats.current_price);
        println!("  Opening: {}", stats.opening_price);
        Ok(())
    }
}
