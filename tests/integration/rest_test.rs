//! Integration tests for the Finnhub REST client and the symbol crawl

use crate::support::spawn_http_server;
use std::sync::Arc;
use tickerwatch::asset::{Asset, Stats};
use tickerwatch::rest::{FinnhubRest, FinnhubRestConfig, QuoteSource};
use tickerwatch::symbols::{load_or_generate, read_ids_json, SymbolIdCache};

fn client(base_url: String) -> FinnhubRest {
    FinnhubRest::with_config(
        FinnhubRestConfig {
            base_url,
            ..Default::default()
        },
        "secret",
    )
}

#[tokio::test]
async fn test_stats_http_500_returns_sentinel() {
    let (base_url, mut requests) =
        spawn_http_server(|_| (500, r#"{"error":"boom"}"#.to_string())).await;
    let mut rest = client(base_url);

    let stats = rest.stats(&Asset::stock("AAPL")).await;
    assert_eq!(stats, Stats::new(-1.0, 0.0));
    assert!(requests.recv().await.unwrap().starts_with("/api/v1/quote?symbol=AAPL"));
}

#[tokio::test]
async fn test_quote_and_http_error_detail() {
    let (base_url, mut requests) = spawn_http_server(|target| {
        if target.contains("symbol=AAPL") {
            (200, r#"{"c":261.5,"h":263.0,"l":260.0,"o":261.0,"pc":259.25,"t":1582641000}"#.to_string())
        } else {
            (403, r#"{"error":"no access"}"#.to_string())
        }
    })
    .await;
    let rest = client(base_url);

    let stats = rest.quote(&Asset::stock("AAPL")).await.unwrap();
    assert_eq!(stats, Stats::new(261.5, 259.25));
    assert_eq!(
        requests.recv().await.unwrap(),
        "/api/v1/quote?symbol=AAPL&token=secret"
    );

    let err = rest.quote(&Asset::stock("MSFT")).await.unwrap_err();
    assert!(err.to_string().starts_with("code: 403\nFinnhub - Failed to get stats"));
}

#[tokio::test]
async fn test_search_resolves_crypto_through_symbol_ids() {
    let (base_url, _requests) = spawn_http_server(|_| {
        (
            200,
            r#"{"count":3,"result":[
                {"description":"Binance BTCUSDT","displaySymbol":"BTC/USDT","symbol":"BINANCE:BTCUSDT","type":"Crypto"},
                {"description":"BERKSHIRE HATHAWAY","displaySymbol":"BRK.B","symbol":"BRK.B","type":"Common Stock"},
                {"description":"APPLE INC","displaySymbol":"AAPL","symbol":"AAPL","type":"Common Stock"}]}"#
                .to_string(),
        )
    })
    .await;

    let ids = Arc::new(SymbolIdCache::new(vec![(
        "BINANCE:BTCUSDT".to_string(),
        Asset::crypto("BINANCE", "BTC", "USDT"),
    )]));
    let mut rest = client(base_url).with_ids(ids);

    let results = rest.search("b").await;
    let assets: Vec<Asset> = results.into_iter().map(|r| r.asset).collect();
    assert_eq!(
        assets,
        vec![Asset::crypto("BINANCE", "BTC", "USDT"), Asset::stock("AAPL")]
    );
}

#[tokio::test]
async fn test_search_failure_is_empty() {
    let (base_url, _requests) = spawn_http_server(|_| (502, "bad gateway".to_string())).await;
    let mut rest = client(base_url);
    assert!(rest.search("apple").await.is_empty());
}

#[tokio::test]
async fn test_symbol_crawl_skips_unserved_exchanges_and_writes_cache() {
    let (base_url, mut requests) = spawn_http_server(|target| {
        if target.starts_with("/api/v1/crypto/exchange") {
            (200, r#"["BINANCE","OKEX","BITTREX"]"#.to_string())
        } else if target.contains("exchange=BINANCE") {
            (
                200,
                r#"[{"description":"Binance BTCUSDT","displaySymbol":"BTC/USDT","symbol":"BINANCE:BTCUSDT"},
                    {"description":"odd","displaySymbol":"WEIRD","symbol":"BINANCE:WEIRD"}]"#
                    .to_string(),
            )
        } else {
            (500, "unexpected".to_string())
        }
    })
    .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("symbol_ids.json");
    let rest = client(base_url);

    let ids = load_or_generate(&path, &rest, false).await;
    assert_eq!(ids.len(), 1);
    assert_eq!(ids.find_asset("BINANCE:BTCUSDT"), Asset::crypto("BINANCE", "BTC", "USDT"));
    assert_eq!(read_ids_json(&path).unwrap().len(), 1);

    requests.close();
    let mut targets = Vec::new();
    while let Some(target) = requests.recv().await {
        targets.push(target);
    }
    assert_eq!(targets.len(), 2);
    assert!(targets.iter().all(|t| !t.contains("OKEX") && !t.contains("BITTREX")));
}
