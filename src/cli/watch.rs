//! Watch command implementation

use super::Context;
use crate::asset::Asset;
use crate::markets::{MarketEvent, MarketRequests};
use crate::ticker::{Direction, Ticker, TickerList};
use clap::Args;
use rust_decimal::Decimal;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Assets as EXCHANGE:BASE-QUOTE, or a bare stock symbol
    #[arg(required = true)]
    pub assets: Vec<String>,

    /// Quantity held of each asset
    #[arg(short, long, default_value = "0")]
    pub quantity: Decimal,

    /// Price paid per unit
    #[arg(long, default_value = "0")]
    pub cost_basis: Decimal,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

impl WatchArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let assets = self
            .assets
            .iter()
            .map(|a| a.parse::<Asset>())
            .collect::<Result<Vec<_>, _>>()?;

        let (markets, mut events) = ctx.connect().await?;
        let mut list = TickerList::new(&markets);
        list.enable();
        for asset in assets {
            list.add_ticker(asset, self.quantity, self.cost_basis);
        }
        tracing::info!(count = list.len(), "Watching");

        let mut refresh = tokio::time::interval(ctx.config.markets.stats_refresh());
        refresh.tick().await;

        let deadline = async {
            match self.duration_secs {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else { break };
                    if list.handle_event(&event) > 0 {
                        print_updated(&list, &event);
                    }
                }
                _ = refresh.tick() => list.refresh_stats(),
                _ = &mut ctrl_c => {
                    tracing::info!("Interrupted");
                    break;
                }
                _ = &mut deadline => break,
            }
        }

        for (quote, totals) in list.totals() {
            println!(
                "TOTAL {} value={:.2} open_pl={:.2} daily_pl={:.2}",
                quote, totals.value, totals.open_pl, totals.daily_pl
            );
        }

        markets.shutdown().await;
        Ok(())
    }
}

fn print_updated<M: MarketRequests>(list: &TickerList<M>, event: &MarketEvent) {
    let asset = match event {
        MarketEvent::PriceUpdate(price) => &price.asset,
        MarketEvent::StatsReceived(asset, _) => asset,
        MarketEvent::SearchResults(_) => return,
    };
    for ticker in list.rows().iter().filter(|t| &t.asset == asset) {
        println!("{}", row_line(ticker));
    }
}

/// One line per row: asset, price, move marker, percent change, value
fn row_line(ticker: &Ticker) -> String {
    let marker = match ticker.direction {
        Direction::Up => "+",
        Direction::Down => "-",
        Direction::Unchanged => "=",
    };
    let change = ticker
        .percent_change()
        .map(|p| format!("{:.2}%", p))
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "{} {} {} {} value={:.2}",
        ticker.asset,
        ticker.last_price,
        marker,
        change,
        ticker.value()
    )
}
