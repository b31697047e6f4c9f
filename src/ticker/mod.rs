//! Watched assets and their subscription bookkeeping
//!
//! Several rows may watch the same asset. The market layer sees one
//! subscription per distinct asset: the first row subscribes, the last row
//! to go unsubscribes.

mod row;

pub use row::{Direction, Ticker, TickerId, Totals};

use crate::asset::{Asset, Price, Stats};
use crate::markets::{MarketEvent, MarketRequests};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Rows in insertion order plus the market handle they subscribe through
pub struct TickerList<M: MarketRequests> {
    markets: M,
    rows: Vec<Ticker>,
    next_id: TickerId,
    enabled: bool,
}

impl<M: MarketRequests> TickerList<M> {
    pub fn new(markets: M) -> Self {
        Self {
            markets,
            rows: Vec::new(),
            next_id: 1,
            enabled: false,
        }
    }

    pub fn markets(&self) -> &M {
        &self.markets
    }

    /// Start the market streams once the consumer is ready for events
    pub fn enable(&mut self) {
        if !self.enabled {
            self.markets.launch_streams();
            self.enabled = true;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Add a row for `asset`
    ///
    /// A new asset is subscribed and its stats requested. A duplicate only
    /// adds a row, seeded from the existing row's prices.
    pub fn add_ticker(&mut self, asset: Asset, quantity: Decimal, cost_basis: Decimal) -> TickerId {
        let id = self.next_id;
        self.next_id += 1;

        let mut ticker = Ticker::new(id, asset, quantity, cost_basis);
        match self.rows.iter().find(|t| t.asset == ticker.asset) {
            Some(existing) => {
                ticker.last_price = existing.last_price;
                ticker.opening_price = existing.opening_price;
                ticker.updated_at = existing.updated_at;
                tracing::debug!(asset = %ticker.asset, id, "Added duplicate ticker");
            }
            None => {
                self.markets.subscribe(&ticker.asset);
                self.markets.request_stats(&ticker.asset);
                tracing::debug!(asset = %ticker.asset, id, "Added ticker");
            }
        }

        self.rows.push(ticker);
        id
    }

    /// Remove one row watching `asset`
    pub fn remove_ticker(&mut self, asset: &Asset) -> Option<Ticker> {
        let index = self.rows.iter().position(|t| &t.asset == asset)?;
        Some(self.remove_at(index))
    }

    /// Remove the row with the given id
    pub fn remove_row(&mut self, id: TickerId) -> Option<Ticker> {
        let index = self.rows.iter().position(|t| t.id == id)?;
        Some(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> Ticker {
        let removed = self.rows.remove(index);
        if !self.contains(&removed.asset) {
            self.markets.unsubscribe(&removed.asset);
        }
        tracing::debug!(asset = %removed.asset, id = removed.id, "Removed ticker");
        removed
    }

    /// Apply one market event; returns how many rows changed
    pub fn handle_event(&mut self, event: &MarketEvent) -> usize {
        match event {
            MarketEvent::PriceUpdate(price) => self.apply_price(price),
            MarketEvent::StatsReceived(asset, stats) => self.apply_stats(asset, *stats),
            MarketEvent::SearchResults(_) => 0,
        }
    }

    /// Update every row watching the price's asset
    pub fn apply_price(&mut self, price: &Price) -> usize {
        let value = match Decimal::from_str(&price.value) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(asset = %price.asset, value = %price.value, error = %e, "Unparsable price");
                return 0;
            }
        };

        let now = Utc::now();
        let mut updated = 0;
        for ticker in self.rows.iter_mut().filter(|t| t.asset == price.asset) {
            ticker.set_price(value, now);
            updated += 1;
        }
        updated
    }

    /// Seed prices of every row watching `asset`
    ///
    /// Stats for an asset removed while the fetch was in flight are ignored.
    pub fn apply_stats(&mut self, asset: &Asset, stats: Stats) -> usize {
        let mut updated = 0;
        for ticker in self.rows.iter_mut().filter(|t| &t.asset == asset) {
            ticker.set_stats(stats);
            updated += 1;
        }
        if updated == 0 {
            tracing::debug!(asset = %asset, "Stats for untracked asset");
        }
        updated
    }

    /// Request fresh stats for every distinct asset
    pub fn refresh_stats(&self) {
        for asset in self.assets() {
            self.markets.request_stats(&asset);
        }
    }

    pub fn contains(&self, asset: &Asset) -> bool {
        self.rows.iter().any(|t| &t.asset == asset)
    }

    /// Distinct watched assets, ordered
    pub fn assets(&self) -> BTreeSet<Asset> {
        self.rows.iter().map(|t| t.asset.clone()).collect()
    }

    pub fn rows(&self) -> &[Ticker] {
        &self.rows
    }

    pub fn get(&self, id: TickerId) -> Option<&Ticker> {
        self.rows.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Totals keyed by quote currency
    pub fn totals(&self) -> BTreeMap<String, Totals> {
        let mut totals: BTreeMap<String, Totals> = BTreeMap::new();
        for ticker in self.rows.iter().filter(|t| t.has_price()) {
            totals
                .entry(ticker.asset.currency.quote.clone())
                .or_default()
                .add(ticker);
        }
        totals
    }
}
