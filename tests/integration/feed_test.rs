//! Integration tests for the streaming exchange clients

use crate::support::{drain, next_text, send_text, spawn_ws_server};
use std::sync::Arc;
use std::time::Duration;
use tickerwatch::asset::{Asset, Price};
use tickerwatch::error::MarketError;
use tickerwatch::feed::{CoinbaseFeed, ExchangeClient, FinnhubFeed};
use tickerwatch::symbols::SymbolIdCache;
use tickerwatch::ws::WsConfig;
use tokio::sync::mpsc;

fn btc() -> Asset {
    Asset::crypto("COINBASE", "BTC", "USD")
}

const BTC_TICKER: &str = r#"{"type":"ticker","sequence":1,"product_id":"BTC-USD","price":"43000.01","side":"buy"}"#;

#[tokio::test]
async fn test_finnhub_read_keeps_latest_trade_per_asset() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(1, move |_, mut ws| {
        let tx = tx.clone();
        async move {
            let subscribe = next_text(&mut ws).await.unwrap();
            tx.send(subscribe).unwrap();
            send_text(
                &mut ws,
                r#"{"type":"trade","data":[
                    {"s":"AAPL","p":190.1,"t":1,"v":10},
                    {"s":"AAPL","p":190.3,"t":3,"v":10},
                    {"s":"AAPL","p":190.2,"t":2,"v":10}]}"#,
            )
            .await;
            drain(&mut ws).await;
        }
    })
    .await;

    let ids = Arc::new(SymbolIdCache::default());
    let mut feed = FinnhubFeed::with_config(WsConfig::new(FinnhubFeed::build_ws_url(&url, "test")), ids);
    let aapl = Asset::stock("AAPL");

    feed.subscribe(&aapl).await;
    assert_eq!(feed.subscription_count(), 1);

    let prices = feed.stream_read().await.unwrap();
    assert_eq!(prices, vec![Price::new("190.2", aapl)]);
    assert_eq!(rx.recv().await.unwrap(), r#"{"symbol":"AAPL","type":"subscribe"}"#);

    feed.disconnect_ws().await;
}

#[tokio::test]
async fn test_coinbase_subscribe_then_ticker() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(1, move |_, mut ws| {
        let tx = tx.clone();
        async move {
            tx.send(next_text(&mut ws).await.unwrap()).unwrap();
            send_text(
                &mut ws,
                r#"{"type":"subscriptions","channels":[{"name":"ticker","product_ids":["BTC-USD"]}]}"#,
            )
            .await;
            send_text(&mut ws, BTC_TICKER).await;
            drain(&mut ws).await;
        }
    })
    .await;

    let mut feed = CoinbaseFeed::with_config(WsConfig::new(url));
    feed.subscribe(&btc()).await;

    // The subscription ack carries no price
    assert!(feed.stream_read().await.unwrap().is_empty());
    assert_eq!(
        feed.stream_read().await.unwrap(),
        vec![Price::new("43000.01", btc())]
    );

    let subscribe: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(subscribe["type"], "subscribe");
    assert_eq!(subscribe["product_ids"], serde_json::json!(["BTC-USD"]));
    assert_eq!(subscribe["channels"], serde_json::json!(["ticker"]));
}

#[tokio::test]
async fn test_coinbase_resubscribes_after_server_close() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(2, move |n, mut ws| {
        let tx = tx.clone();
        async move {
            let subscribe = next_text(&mut ws).await.unwrap();
            tx.send((n, subscribe)).unwrap();
            if n == 0 {
                let _ = ws.close(None).await;
                return;
            }
            send_text(&mut ws, BTC_TICKER).await;
            drain(&mut ws).await;
        }
    })
    .await;

    let config = WsConfig::new(url)
        .max_reconnects(3)
        .initial_delay(Duration::from_millis(10));
    let mut feed = CoinbaseFeed::with_config(config);
    feed.subscribe(&btc()).await;

    // First read sees the close, reconnects and resubscribes
    assert!(feed.stream_read().await.unwrap().is_empty());
    assert_eq!(feed.subscription_count(), 1);
    assert_eq!(
        feed.stream_read().await.unwrap(),
        vec![Price::new("43000.01", btc())]
    );

    let (first, _) = rx.recv().await.unwrap();
    let (second, resubscribe) = rx.recv().await.unwrap();
    assert_eq!((first, second), (0, 1));
    assert!(resubscribe.contains("BTC-USD"));
}

#[tokio::test]
async fn test_read_fails_once_reconnects_are_exhausted() {
    let url = spawn_ws_server(1, |_, mut ws| async move {
        let _ = next_text(&mut ws).await;
        let _ = ws.close(None).await;
    })
    .await;

    let config = WsConfig::new(url)
        .max_reconnects(2)
        .initial_delay(Duration::from_millis(5))
        .connect_timeout(Duration::from_secs(1));
    let mut feed = CoinbaseFeed::with_config(config);
    feed.subscribe(&btc()).await;

    let result = feed.stream_read().await;
    assert!(matches!(result, Err(MarketError::StreamLost { .. })));
}

#[tokio::test]
async fn test_read_timeout_triggers_reconnect() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(2, move |n, mut ws| {
        let tx = tx.clone();
        async move {
            let _ = next_text(&mut ws).await;
            tx.send(n).unwrap();
            if n == 1 {
                send_text(&mut ws, BTC_TICKER).await;
            }
            // Connection 0 stays silent
            drain(&mut ws).await;
        }
    })
    .await;

    let config = WsConfig::new(url)
        .read_timeout(Some(Duration::from_millis(100)))
        .initial_delay(Duration::from_millis(5));
    let mut feed = CoinbaseFeed::with_config(config);
    feed.subscribe(&btc()).await;

    assert!(feed.stream_read().await.unwrap().is_empty());
    assert_eq!(
        feed.stream_read().await.unwrap(),
        vec![Price::new("43000.01", btc())]
    );
    assert_eq!(rx.recv().await, Some(0));
    assert_eq!(rx.recv().await, Some(1));
}

#[tokio::test]
async fn test_unsubscribe_last_sends_control_message() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(1, move |_, mut ws| {
        let tx = tx.clone();
        async move {
            while let Some(text) = next_text(&mut ws).await {
                tx.send(text).unwrap();
            }
        }
    })
    .await;

    let mut feed = CoinbaseFeed::with_config(WsConfig::new(url));
    feed.subscribe(&btc()).await;
    feed.subscribe(&btc()).await;
    assert_eq!(feed.subscription_count(), 2);

    feed.unsubscribe(&btc()).await;
    assert_eq!(feed.subscription_count(), 1);
    feed.unsubscribe(&btc()).await;
    assert_eq!(feed.subscription_count(), 0);

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let text = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let msg: serde_json::Value = serde_json::from_str(&text).unwrap();
        kinds.push(msg["type"].as_str().unwrap().to_string());
    }
    assert_eq!(kinds, vec!["subscribe", "subscribe", "unsubscribe"]);
}

#[tokio::test]
async fn test_finnhub_unsubscribe_sends_symbol() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(1, move |_, mut ws| {
        let tx = tx.clone();
        async move {
            while let Some(text) = next_text(&mut ws).await {
                tx.send(text).unwrap();
            }
        }
    })
    .await;

    let ids = Arc::new(SymbolIdCache::new(vec![(
        "BINANCE:BTCUSDT".to_string(),
        Asset::crypto("BINANCE", "BTC", "USDT"),
    )]));
    let mut feed = FinnhubFeed::with_config(WsConfig::new(FinnhubFeed::build_ws_url(&url, "test")), ids);
    let btc = Asset::crypto("BINANCE", "BTC", "USDT");

    feed.subscribe(&btc).await;
    feed.unsubscribe(&btc).await;
    assert_eq!(feed.subscription_count(), 0);

    let mut messages = Vec::new();
    for _ in 0..2 {
        let text = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        messages.push(text);
    }
    assert_eq!(
        messages,
        vec![
            r#"{"symbol":"BINANCE:BTCUSDT","type":"subscribe"}"#,
            r#"{"symbol":"BINANCE:BTCUSDT","type":"unsubscribe"}"#,
        ]
    );
}

#[tokio::test]
async fn test_finnhub_resubscribes_after_server_close() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(2, move |n, mut ws| {
        let tx = tx.clone();
        async move {
            let subscribe = next_text(&mut ws).await.unwrap();
            tx.send((n, subscribe)).unwrap();
            if n == 0 {
                let _ = ws.close(None).await;
                return;
            }
            send_text(&mut ws, r#"{"type":"trade","data":[{"s":"AAPL","p":190.10,"t":1,"v":5}]}"#).await;
            drain(&mut ws).await;
        }
    })
    .await;

    let config = WsConfig::new(FinnhubFeed::build_ws_url(&url, "test"))
        .max_reconnects(3)
        .initial_delay(Duration::from_millis(10));
    let mut feed = FinnhubFeed::with_config(config, Arc::new(SymbolIdCache::default()));
    let aapl = Asset::stock("AAPL");
    feed.subscribe(&aapl).await;

    assert!(feed.stream_read().await.unwrap().is_empty());
    assert_eq!(feed.subscription_count(), 1);
    assert_eq!(
        feed.stream_read().await.unwrap(),
        vec![Price::new("190.10", aapl)]
    );

    let expected = r#"{"symbol":"AAPL","type":"subscribe"}"#.to_string();
    assert_eq!(rx.recv().await.unwrap(), (0, expected.clone()));
    assert_eq!(rx.recv().await.unwrap(), (1, expected));
}
