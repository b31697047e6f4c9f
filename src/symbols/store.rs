//! On-disk symbol-id cache and the one-time crawl that builds it
//!
//! The file is `{"data":[{"i":id,"x":exchange,"b":base,"q":quote},...]}`.

use super::SymbolIdCache;
use crate::asset::{Asset, CurrencyPair};
use crate::error::Result;
use crate::rest::FinnhubRest;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Crypto exchanges Finnhub lists but does not serve symbols for
const SKIPPED_EXCHANGES: &[&str] = &["BITTREX", "OKEX"];

#[derive(Debug, Serialize, Deserialize)]
struct IdsDocument {
    data: Vec<IdEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IdEntry {
    #[serde(rename = "i")]
    id: String,
    #[serde(rename = "x")]
    exchange: String,
    #[serde(rename = "b")]
    base: String,
    #[serde(rename = "q")]
    quote: String,
}

/// Read symbol ids and their assets from a cache file
pub fn read_ids_json(path: impl AsRef<Path>) -> Result<Vec<(String, Asset)>> {
    let content = std::fs::read_to_string(path)?;
    let doc: IdsDocument = serde_json::from_str(&content)?;
    Ok(doc
        .data
        .into_iter()
        .map(|e| {
            (
                e.id,
                Asset::new(e.exchange, CurrencyPair::new(e.base, e.quote)),
            )
        })
        .collect())
}

/// Write symbol ids and their assets to a cache file
pub fn write_ids_json(path: impl AsRef<Path>, entries: &[(String, Asset)]) -> Result<()> {
    let doc = IdsDocument {
        data: entries
            .iter()
            .map(|(id, asset)| IdEntry {
                id: id.clone(),
                exchange: asset.exchange.clone(),
                base: asset.currency.base.clone(),
                quote: asset.currency.quote.clone(),
            })
            .collect(),
    };
    std::fs::write(path, serde_json::to_string(&doc)?)?;
    Ok(())
}

/// Split a Finnhub display symbol: "BTC/USDT" -> BTC, USDT
pub fn parse_display_symbol(display_symbol: &str) -> Option<CurrencyPair> {
    let (base, quote) = display_symbol.split_once('/')?;
    if base.is_empty() || quote.is_empty() {
        return None;
    }
    Some(CurrencyPair::new(base, quote))
}

/// Crawl every supported crypto exchange for its symbol ids
pub async fn generate_entries(rest: &FinnhubRest) -> Result<Vec<(String, Asset)>> {
    let exchanges = rest.crypto_exchanges().await?;
    let mut entries = Vec::new();

    for exchange in exchanges
        .into_iter()
        .filter(|x| !SKIPPED_EXCHANGES.contains(&x.as_str()))
    {
        let symbols = rest.crypto_symbols(&exchange).await?;
        tracing::debug!(exchange = %exchange, count = symbols.len(), "Fetched crypto symbols");

        for symbol in symbols {
            match parse_display_symbol(&symbol.display_symbol) {
                Some(currency) => {
                    entries.push((symbol.symbol, Asset::new(exchange.clone(), currency)))
                }
                None => tracing::debug!(
                    symbol = %symbol.symbol,
                    display = %symbol.display_symbol,
                    "Skipping unparsable display symbol"
                ),
            }
        }
    }

    Ok(entries)
}

/// Load the cache file, crawling and writing it first if it is absent
///
/// Failures are logged and leave an empty cache: stocks still work through
/// the fallback mapping.
pub async fn load_or_generate(
    path: impl AsRef<Path>,
    rest: &FinnhubRest,
    regenerate: bool,
) -> SymbolIdCache {
    let path = path.as_ref();

    if regenerate || !path.exists() {
        tracing::info!(path = %path.display(), "Generating symbol id cache, this takes a minute");
        match generate_entries(rest).await {
            Ok(entries) => {
                if let Err(e) = write_ids_json(path, &entries) {
                    tracing::error!(error = %e, "Failed to write symbol id cache");
                }
                tracing::info!(count = entries.len(), "Symbol ids initialized");
                return SymbolIdCache::new(entries);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to generate symbol ids");
                return SymbolIdCache::default();
            }
        }
    }

    match read_ids_json(path) {
        Ok(entries) => {
            tracing::debug!(count = entries.len(), "Loaded symbol id cache");
            SymbolIdCache::new(entries)
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Failed to read symbol id cache");
            SymbolIdCache::default()
        }
    }
}
