//! Handoff of worker results to the consuming task
//!
//! Workers post whole batches; the queue expands them one event at a time,
//! so events from one read are always delivered back to back.

use crate::asset::{Asset, Price, SearchResult, Stats};
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Result delivered to the consumer
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    /// One streamed price
    PriceUpdate(Price),
    /// Stats fetched for an asset
    StatsReceived(Asset, Stats),
    /// Results of the latest search
    SearchResults(Vec<SearchResult>),
}

#[derive(Debug)]
enum Posted {
    Prices(Vec<Price>),
    Stats(Vec<(Asset, Stats)>),
    Search(Vec<SearchResult>),
}

/// Create a connected poster/queue pair
pub fn event_channel() -> (EventPoster, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventPoster { tx },
        EventQueue {
            rx,
            pending: VecDeque::new(),
        },
    )
}

/// Sending half, cloned into every worker
#[derive(Debug, Clone)]
pub struct EventPoster {
    tx: mpsc::UnboundedSender<Posted>,
}

impl EventPoster {
    /// Post the prices of one stream read; false once the queue is gone
    pub fn post_prices(&self, prices: Vec<Price>) -> bool {
        self.tx.send(Posted::Prices(prices)).is_ok()
    }

    pub fn post_stats(&self, stats: Vec<(Asset, Stats)>) -> bool {
        self.tx.send(Posted::Stats(stats)).is_ok()
    }

    pub fn post_search(&self, results: Vec<SearchResult>) -> bool {
        self.tx.send(Posted::Search(results)).is_ok()
    }
}

/// Receiving half, owned by the consumer
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<Posted>,
    pending: VecDeque<MarketEvent>,
}

impl EventQueue {
    /// Wait for the next event; `None` once every poster is dropped
    pub async fn next(&mut self) -> Option<MarketEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let posted = self.rx.recv().await?;
            self.expand(posted);
        }
    }

    /// Next event if one is ready, without waiting
    pub fn try_next(&mut self) -> Option<MarketEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let posted = self.rx.try_recv().ok()?;
            self.expand(posted);
        }
    }

    /// Every event that is ready now
    pub fn drain(&mut self) -> Vec<MarketEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    fn expand(&mut self, posted: Posted) {
        match posted {
            Posted::Prices(prices) => self
                .pending
                .extend(prices.into_iter().map(MarketEvent::PriceUpdate)),
            Posted::Stats(stats) => self.pending.extend(
                stats
                    .into_iter()
                    .map(|(asset, stats)| MarketEvent::StatsReceived(asset, stats)),
            ),
            Posted::Search(results) => self.pending.push_back(MarketEvent::SearchResults(results)),
        }
    }
}
