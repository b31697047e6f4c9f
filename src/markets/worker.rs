//! Worker loops behind the markets facade
//!
//! Each loop checks the stop flag once per iteration and also races it
//! against every sleep and blocking call, so raising the flag ends the loop
//! promptly even while a socket is stalled.

use super::events::EventPoster;
use super::queue::{LockingList, SubscriptionQueue, SubscriptionRequest};
use crate::asset::Asset;
use crate::feed::ExchangeClient;
use crate::rest::QuoteSource;
use crate::telemetry::{record_latency, LatencyMetric};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};

/// REST client shared by the stats and search loops
pub type SharedQuoteSource = std::sync::Arc<Mutex<Box<dyn QuoteSource>>>;

/// Why a worker loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Stop flag raised or nobody left to receive results
    Stopped,
    /// The stream could not be recovered
    Fatal,
}

impl LoopExit {
    /// Process-style exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Stopped => 0,
            Self::Fatal => 1,
        }
    }
}

/// Resolves once the stop flag is raised or its sender is gone
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// Sleep for `idle` unless stopped first; true if stopped
async fn idle_or_stop(stop: &mut watch::Receiver<bool>, idle: Duration) -> bool {
    tokio::select! {
        _ = stop_requested(stop) => true,
        _ = tokio::time::sleep(idle) => false,
    }
}

/// Apply every queued request to the client in submission order
pub async fn drain_requests<C: ExchangeClient + ?Sized>(client: &mut C, queue: &SubscriptionQueue) {
    for request in queue.take_all() {
        match request {
            SubscriptionRequest::Subscribe(asset) => client.subscribe(&asset).await,
            SubscriptionRequest::Unsubscribe(asset) => client.unsubscribe(&asset).await,
        }
    }
}

/// Poll loop for one exchange
///
/// Drains the request queue, then either idles (no subscriptions) or performs
/// one stream read and posts the prices as one batch.
pub async fn market_loop<C: ExchangeClient + ?Sized>(
    client: &mut C,
    queue: &SubscriptionQueue,
    poster: &EventPoster,
    mut stop: watch::Receiver<bool>,
    idle: Duration,
) -> LoopExit {
    tracing::info!(exchange = client.name(), "Market loop started");

    loop {
        if *stop.borrow() {
            return LoopExit::Stopped;
        }

        drain_requests(client, queue).await;

        if client.subscription_count() == 0 {
            if idle_or_stop(&mut stop, idle).await {
                return LoopExit::Stopped;
            }
            continue;
        }

        let started = Instant::now();
        let read = tokio::select! {
            _ = stop_requested(&mut stop) => return LoopExit::Stopped,
            read = client.stream_read() => read,
        };

        match read {
            Ok(prices) => {
                record_latency(LatencyMetric::StreamRead, started.elapsed());
                if prices.is_empty() {
                    continue;
                }
                if !poster.post_prices(prices) {
                    tracing::debug!(exchange = client.name(), "Event queue dropped");
                    return LoopExit::Stopped;
                }
            }
            Err(e) => {
                tracing::error!(exchange = client.name(), error = %e, "Market loop failed, not restarting");
                return LoopExit::Fatal;
            }
        }
    }
}

/// Stats loop: fetch every queued asset as one batch
pub async fn stats_loop(
    source: SharedQuoteSource,
    queue: std::sync::Arc<LockingList<Asset>>,
    poster: EventPoster,
    mut stop: watch::Receiver<bool>,
    idle: Duration,
) -> LoopExit {
    tracing::info!("Stats loop started");

    loop {
        if *stop.borrow() {
            return LoopExit::Stopped;
        }

        let batch = queue.take_all();
        if batch.is_empty() {
            if idle_or_stop(&mut stop, idle).await {
                return LoopExit::Stopped;
            }
            continue;
        }

        tracing::debug!(count = batch.len(), "Fetching stats");
        let fetch = async {
            let mut results = Vec::with_capacity(batch.len());
            for asset in batch {
                let stats = source.lock().await.stats(&asset).await;
                results.push((asset, stats));
            }
            results
        };
        let results = tokio::select! {
            _ = stop_requested(&mut stop) => return LoopExit::Stopped,
            results = fetch => results,
        };

        if !poster.post_stats(results) {
            return LoopExit::Stopped;
        }
    }
}

/// Search loop: only the latest query is served
pub async fn search_loop(
    source: SharedQuoteSource,
    queue: std::sync::Arc<LockingList<String>>,
    poster: EventPoster,
    mut stop: watch::Receiver<bool>,
    idle: Duration,
) -> LoopExit {
    tracing::info!("Search loop started");

    loop {
        if *stop.borrow() {
            return LoopExit::Stopped;
        }

        let Some(query) = queue.take_all().pop() else {
            if idle_or_stop(&mut stop, idle).await {
                return LoopExit::Stopped;
            }
            continue;
        };

        if query.trim().is_empty() {
            tracing::debug!("Ignoring empty search");
            continue;
        }

        tracing::debug!(query = %query, "Searching");
        let search = async { source.lock().await.search(&query).await };
        let results = tokio::select! {
            _ = stop_requested(&mut stop) => return LoopExit::Stopped,
            results = search => results,
        };

        if !poster.post_search(results) {
            return LoopExit::Stopped;
        }
    }
}
