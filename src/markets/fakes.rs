//! Scriptable exchange and quote clients for tests

use crate::asset::{Asset, Price, SearchResult, Stats};
use crate::error::Result;
use crate::feed::ExchangeClient;
use crate::rest::QuoteSource;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClientCall {
    Connect,
    Disconnect,
    Subscribe(Asset),
    Unsubscribe(Asset),
    Read,
}

/// Records every call; reads follow a script, then return empty batches
pub(crate) struct FakeExchange {
    name: &'static str,
    calls: Arc<Mutex<Vec<ClientCall>>>,
    reads: Arc<Mutex<VecDeque<Result<Vec<Price>>>>>,
    active: Vec<Asset>,
}

impl FakeExchange {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Arc::new(Mutex::new(Vec::new())),
            reads: Arc::new(Mutex::new(VecDeque::new())),
            active: Vec::new(),
        }
    }

    pub fn push_read(&mut self, read: Result<Vec<Price>>) {
        self.reads.lock().push_back(read);
    }

    /// Handle for queueing reads after the client moved into a task
    pub fn read_script(&self) -> Arc<Mutex<VecDeque<Result<Vec<Price>>>>> {
        Arc::clone(&self.reads)
    }

    pub fn call_log(&self) -> Arc<Mutex<Vec<ClientCall>>> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ExchangeClient for FakeExchange {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn connect_ws(&mut self) {
        self.calls.lock().push(ClientCall::Connect);
    }

    async fn disconnect_ws(&mut self) {
        self.calls.lock().push(ClientCall::Disconnect);
    }

    async fn subscribe(&mut self, asset: &Asset) {
        self.calls.lock().push(ClientCall::Subscribe(asset.clone()));
        self.active.push(asset.clone());
    }

    async fn unsubscribe(&mut self, asset: &Asset) {
        self.calls.lock().push(ClientCall::Unsubscribe(asset.clone()));
        if let Some(index) = self.active.iter().position(|a| a == asset) {
            self.active.remove(index);
        }
    }

    async fn stream_read(&mut self) -> Result<Vec<Price>> {
        self.calls.lock().push(ClientCall::Read);
        let next = self.reads.lock().pop_front();
        match next {
            Some(read) => read,
            None => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    fn subscription_count(&self) -> usize {
        self.active.len()
    }
}

/// Canned stats and search answers; unknown assets get the sentinel
pub(crate) struct FakeQuotes {
    stats: HashMap<Asset, Stats>,
    searches: HashMap<String, Vec<SearchResult>>,
    requests: Arc<Mutex<Vec<String>>>,
    connected: bool,
}

impl FakeQuotes {
    pub fn new() -> Self {
        Self {
            stats: HashMap::new(),
            searches: HashMap::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
            connected: false,
        }
    }

    pub fn with_stats(mut self, asset: Asset, stats: Stats) -> Self {
        self.stats.insert(asset, stats);
        self
    }

    pub fn with_search(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        self.searches.insert(query.to_string(), results);
        self
    }

    /// "stats:{asset}" and "search:{query}" per call, in call order
    pub fn requests(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl QuoteSource for FakeQuotes {
    fn connect_http(&mut self) {
        self.connected = true;
    }

    fn disconnect_http(&mut self) {
        self.connected = false;
        self.requests.lock().push("disconnect".to_string());
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn stats(&mut self, asset: &Asset) -> Stats {
        self.requests.lock().push(format!("stats:{}", asset));
        self.stats.get(asset).copied().unwrap_or(Stats::UNAVAILABLE)
    }

    async fn search(&mut self, query: &str) -> Vec<SearchResult> {
        self.requests.lock().push(format!("search:{}", query));
        self.searches.get(query).cloned().unwrap_or_default()
    }
}
