//! Markets facade
//!
//! Routes subscription, stats and search requests to four worker tasks (one
//! poll loop per exchange plus a stats and a search loop) and hands their
//! results back through an [`EventQueue`].
//!
//! All methods must be called from inside a tokio runtime, since the first
//! request of a kind may spawn its worker.

mod events;
mod queue;
mod worker;

#[cfg(test)]
pub(crate) mod fakes;

pub use events::{event_channel, EventPoster, EventQueue, MarketEvent};
pub use queue::{LockingList, SubscriptionQueue, SubscriptionRequest};
pub use worker::{drain_requests, market_loop, search_loop, stats_loop, LoopExit, SharedQuoteSource};

use crate::asset::{Asset, COINBASE_EXCHANGE};
use crate::feed::ExchangeClient;
use crate::rest::QuoteSource;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Which poll loop serves an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Coinbase,
    Finnhub,
}

impl Route {
    pub fn for_asset(asset: &Asset) -> Self {
        if asset.exchange == COINBASE_EXCHANGE {
            Self::Coinbase
        } else {
            Self::Finnhub
        }
    }
}

/// Idle sleeps of the worker loops
#[derive(Debug, Clone, Copy)]
pub struct LoopTiming {
    /// Market loop sleep when nothing is subscribed
    pub market_idle: Duration,
    /// Stats/search loop sleep when nothing is queued
    pub worker_idle: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            market_idle: Duration::from_millis(100),
            worker_idle: Duration::from_millis(300),
        }
    }
}

/// Requests a ticker list makes of the market layer
pub trait MarketRequests {
    fn subscribe(&self, asset: &Asset);
    fn unsubscribe(&self, asset: &Asset);
    fn request_stats(&self, asset: &Asset);
    fn request_search(&self, query: &str);
    fn launch_streams(&self);
}

impl<T: MarketRequests + ?Sized> MarketRequests for &T {
    fn subscribe(&self, asset: &Asset) {
        (**self).subscribe(asset)
    }

    fn unsubscribe(&self, asset: &Asset) {
        (**self).unsubscribe(asset)
    }

    fn request_stats(&self, asset: &Asset) {
        (**self).request_stats(asset)
    }

    fn request_search(&self, query: &str) {
        (**self).request_search(query)
    }

    fn launch_streams(&self) {
        (**self).launch_streams()
    }
}

type MarketTask = JoinHandle<(Box<dyn ExchangeClient>, LoopExit)>;

enum StreamState {
    /// Client waiting for its loop to be launched
    Parked(Box<dyn ExchangeClient>),
    Running(MarketTask),
    /// Loop joined by shutdown
    Done,
}

struct StreamWorker {
    queue: Arc<SubscriptionQueue>,
    state: Mutex<StreamState>,
}

impl StreamWorker {
    fn new(client: Box<dyn ExchangeClient>) -> Self {
        Self {
            queue: Arc::new(SubscriptionQueue::new()),
            state: Mutex::new(StreamState::Parked(client)),
        }
    }
}

#[derive(Default)]
struct RestWorkers {
    stats: Option<JoinHandle<LoopExit>>,
    search: Option<JoinHandle<LoopExit>>,
}

/// The single object the UI layer talks to
pub struct Markets {
    coinbase: StreamWorker,
    finnhub: StreamWorker,
    rest: SharedQuoteSource,
    stats_queue: Arc<LockingList<Asset>>,
    search_queue: Arc<LockingList<String>>,
    rest_workers: Mutex<RestWorkers>,
    poster: EventPoster,
    stop: watch::Sender<bool>,
    timing: LoopTiming,
}

impl Markets {
    /// Build the facade and the queue its events arrive on
    pub fn new(
        coinbase: Box<dyn ExchangeClient>,
        finnhub: Box<dyn ExchangeClient>,
        rest: Box<dyn QuoteSource>,
        timing: LoopTiming,
    ) -> (Self, EventQueue) {
        let (poster, events) = event_channel();
        let (stop, _) = watch::channel(false);

        let markets = Self {
            coinbase: StreamWorker::new(coinbase),
            finnhub: StreamWorker::new(finnhub),
            rest: Arc::new(tokio::sync::Mutex::new(rest)),
            stats_queue: Arc::new(LockingList::new()),
            search_queue: Arc::new(LockingList::new()),
            rest_workers: Mutex::new(RestWorkers::default()),
            poster,
            stop,
            timing,
        };
        (markets, events)
    }

    fn worker(&self, route: Route) -> &StreamWorker {
        match route {
            Route::Coinbase => &self.coinbase,
            Route::Finnhub => &self.finnhub,
        }
    }

    /// Requests not yet applied by a poll loop, in submission order
    pub fn pending_requests(&self, route: Route) -> Vec<SubscriptionRequest> {
        self.worker(route).queue.snapshot()
    }

    /// Assets waiting for a stats fetch
    pub fn pending_stats(&self) -> Vec<Asset> {
        self.stats_queue.snapshot()
    }

    /// Search waiting to be served
    pub fn pending_search(&self) -> Option<String> {
        self.search_queue.snapshot().pop()
    }

    /// Number of worker loops still running
    pub fn active_workers(&self) -> usize {
        let streams = [Route::Coinbase, Route::Finnhub]
            .into_iter()
            .filter(|route| {
                matches!(&*self.worker(*route).state.lock(), StreamState::Running(h) if !h.is_finished())
            })
            .count();

        let rest = self.rest_workers.lock();
        let rest_running = [&rest.stats, &rest.search]
            .into_iter()
            .filter(|h| matches!(h, Some(h) if !h.is_finished()))
            .count();

        streams + rest_running
    }

    fn launch_market_loop(&self, route: Route) {
        let worker = self.worker(route);
        let mut state = worker.state.lock();

        let mut client = match std::mem::replace(&mut *state, StreamState::Done) {
            StreamState::Parked(client) => client,
            other => {
                *state = other;
                return;
            }
        };

        let queue = Arc::clone(&worker.queue);
        let poster = self.poster.clone();
        let stop = self.stop.subscribe();
        let idle = self.timing.market_idle;

        *state = StreamState::Running(tokio::spawn(async move {
            let exit = market_loop(client.as_mut(), &queue, &poster, stop, idle).await;
            (client, exit)
        }));
    }

    fn launch_stats_loop(&self) {
        let mut workers = self.rest_workers.lock();
        if workers.stats.is_some() {
            return;
        }
        workers.stats = Some(tokio::spawn(stats_loop(
            Arc::clone(&self.rest),
            Arc::clone(&self.stats_queue),
            self.poster.clone(),
            self.stop.subscribe(),
            self.timing.worker_idle,
        )));
    }

    fn launch_search_loop(&self) {
        let mut workers = self.rest_workers.lock();
        if workers.search.is_some() {
            return;
        }
        workers.search = Some(tokio::spawn(search_loop(
            Arc::clone(&self.rest),
            Arc::clone(&self.search_queue),
            self.poster.clone(),
            self.stop.subscribe(),
            self.timing.worker_idle,
        )));
    }

    /// Stop every loop, wait for it, then close all connections
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down markets");
        self.stop.send_replace(true);

        for route in [Route::Coinbase, Route::Finnhub] {
            let state = std::mem::replace(&mut *self.worker(route).state.lock(), StreamState::Done);
            let mut client = match state {
                StreamState::Parked(client) => client,
                StreamState::Running(handle) => match handle.await {
                    Ok((client, exit)) => {
                        tracing::debug!(exchange = client.name(), code = exit.code(), "Market loop joined");
                        client
                    }
                    Err(e) => {
                        tracing::error!(route = ?route, error = %e, "Market loop panicked");
                        continue;
                    }
                },
                StreamState::Done => continue,
            };
            client.disconnect_ws().await;
        }

        let (stats, search) = {
            let mut workers = self.rest_workers.lock();
            (workers.stats.take(), workers.search.take())
        };
        for handle in [stats, search].into_iter().flatten() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker loop panicked");
            }
        }

        self.rest.lock().await.disconnect_http();
    }
}

impl MarketRequests for Markets {
    fn subscribe(&self, asset: &Asset) {
        let route = Route::for_asset(asset);
        tracing::debug!(asset = %asset, route = ?route, "Queue subscribe");
        self.worker(route)
            .queue
            .push_back(SubscriptionRequest::Subscribe(asset.clone()));
    }

    fn unsubscribe(&self, asset: &Asset) {
        let route = Route::for_asset(asset);
        tracing::debug!(asset = %asset, route = ?route, "Queue unsubscribe");
        self.worker(route)
            .queue
            .push_back(SubscriptionRequest::Unsubscribe(asset.clone()));
    }

    fn request_stats(&self, asset: &Asset) {
        self.stats_queue.push_back(asset.clone());
        self.launch_stats_loop();
    }

    fn request_search(&self, query: &str) {
        self.search_queue.replace(query.to_string());
        self.launch_search_loop();
    }

    /// Start all four loops; later calls do nothing
    ///
    /// A poll loop that ended on a fatal read is not restarted.
    fn launch_streams(&self) {
        self.launch_market_loop(Route::Coinbase);
        self.launch_market_loop(Route::Finnhub);
        self.launch_stats_loop();
        self.launch_search_loop();
    }
}
