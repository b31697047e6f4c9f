//! Streaming connection state shared by the exchange clients

use crate::error::{MarketError, Result};
use crate::telemetry::{increment, set_gauge, CounterMetric, GaugeMetric};
use crate::ws::{WsClient, WsConfig};

/// Builds the protocol's subscribe control message for a wire id
pub(crate) type SubscribeEncoder = fn(&str) -> String;

/// One exchange's streaming socket plus the ids subscribed on it
///
/// `active` is a multiset: subscribing twice to the same id keeps two
/// entries, and the subscription count is its length.
pub(crate) struct StreamSession {
    exchange: &'static str,
    ws: WsClient,
    active: Vec<String>,
    encode_subscribe: SubscribeEncoder,
}

impl StreamSession {
    pub fn new(exchange: &'static str, config: WsConfig, encode_subscribe: SubscribeEncoder) -> Self {
        Self {
            exchange,
            ws: WsClient::new(config),
            active: Vec::new(),
            encode_subscribe,
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_connected(&self) -> bool {
        self.ws.is_connected()
    }

    /// Connect, logging instead of failing
    pub async fn connect(&mut self) -> bool {
        tracing::info!(exchange = self.exchange, "Websocket connect");
        match self.ws.connect().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(exchange = self.exchange, error = %e, "Websocket failed to connect");
                false
            }
        }
    }

    pub async fn disconnect(&mut self) {
        if self.ws.is_connected() {
            tracing::info!(exchange = self.exchange, "Websocket disconnect");
        }
        self.ws.disconnect().await;
    }

    /// Send a subscribe for `id`; counted only once the server has it
    pub async fn subscribe(&mut self, id: String) {
        if !self.ws.is_connected() && !self.connect().await {
            return;
        }
        tracing::info!(exchange = self.exchange, symbol = %id, "Websocket subscribing");
        match self.ws.send_text((self.encode_subscribe)(&id)).await {
            Ok(()) => {
                self.active.push(id);
                self.publish_count();
            }
            Err(e) => {
                tracing::error!(exchange = self.exchange, symbol = %id, error = %e, "Failed to subscribe")
            }
        }
    }

    /// Drop one subscription to `id`
    ///
    /// The local entry always goes, even if the control message fails, so a
    /// later resubscribe cannot bring it back. The wire message is only sent
    /// once no other subscription to the same id remains.
    pub async fn unsubscribe(&mut self, id: &str, message: String) {
        match self.active.iter().position(|a| a == id) {
            Some(index) => {
                self.active.remove(index);
                self.publish_count();
            }
            None => {
                tracing::debug!(exchange = self.exchange, symbol = %id, "Unsubscribe for inactive symbol");
            }
        }

        if self.active.iter().any(|a| a == id) {
            return;
        }
        if !self.ws.is_connected() {
            // A fresh connection carries no subscriptions
            return;
        }

        tracing::info!(exchange = self.exchange, symbol = %id, "Websocket unsubscribing");
        if let Err(e) = self.ws.send_text(message).await {
            tracing::error!(exchange = self.exchange, symbol = %id, error = %e, "Failed to unsubscribe");
        }
    }

    /// Read one message
    ///
    /// Returns `Ok(None)` when the read failed but the connection was
    /// re-established and every active id resubscribed. `Err` means recovery
    /// ran out of attempts.
    pub async fn read(&mut self) -> Result<Option<String>> {
        if !self.ws.is_connected() {
            self.recover("not connected").await?;
        }

        match self.ws.read_text().await {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                tracing::warn!(exchange = self.exchange, error = %e, "Failed to read from websocket");
                self.recover(&e.to_string()).await?;
                Ok(None)
            }
        }
    }

    /// Reconnect with backoff and resubscribe every active id
    async fn recover(&mut self, reason: &str) -> Result<()> {
        let mut attempts = 0;

        while self.ws.config().may_reconnect(attempts) {
            attempts += 1;
            if attempts > 1 {
                tokio::time::sleep(self.ws.config().reconnect_delay(attempts - 1)).await;
            }
            increment(CounterMetric::StreamReconnects, self.exchange, 1);
            tracing::info!(exchange = self.exchange, attempt = attempts, "Reconnecting websocket");

            if !self.connect().await {
                continue;
            }
            if self.resubscribe_all().await {
                return Ok(());
            }
        }

        Err(MarketError::StreamLost {
            exchange: self.exchange.to_string(),
            reason: format!("{} (gave up after {} attempts)", reason, attempts),
        })
    }

    async fn resubscribe_all(&mut self) -> bool {
        let mut ids = self.active.clone();
        ids.sort();
        ids.dedup();
        for id in ids {
            if let Err(e) = self.ws.send_text((self.encode_subscribe)(&id)).await {
                tracing::warn!(exchange = self.exchange, symbol = %id, error = %e, "Resubscribe failed");
                return false;
            }
        }
        tracing::info!(
            exchange = self.exchange,
            subscriptions = self.active.len(),
            "Websocket resubscribed"
        );
        true
    }

    fn publish_count(&self) {
        set_gauge(
            GaugeMetric::ActiveSubscriptions,
            self.exchange,
            self.active.len() as f64,
        );
    }
}
