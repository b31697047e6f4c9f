//! Finnhub symbol-id mapping
//!
//! Finnhub identifies crypto instruments by opaque ids such as
//! `BINANCE:BTCUSDT`. The cache maps those ids to [`Asset`]s and back. It is
//! built once at startup and shared read-only by the Finnhub stream and REST
//! clients.

mod store;

pub use store::{generate_entries, load_or_generate, parse_display_symbol, read_ids_json, write_ids_json};

use crate::asset::Asset;
use std::collections::{BTreeMap, HashMap};

/// Bidirectional symbol-id <-> asset table
#[derive(Debug, Clone, Default)]
pub struct SymbolIdCache {
    assets: HashMap<String, Asset>,
    ids: BTreeMap<Asset, String>,
}

impl SymbolIdCache {
    pub fn new(entries: Vec<(String, Asset)>) -> Self {
        let mut cache = Self::default();
        for (id, asset) in entries {
            cache.ids.insert(asset.clone(), id.clone());
            cache.assets.insert(id, asset);
        }
        cache
    }

    /// Finnhub symbol id for the asset
    ///
    /// Stocks are not in the table and use their base currency as id.
    pub fn find_symbol_id(&self, asset: &Asset) -> String {
        self.ids
            .get(asset)
            .cloned()
            .unwrap_or_else(|| asset.currency.base.clone())
    }

    /// Asset for a Finnhub symbol id, falling back to a USD stock
    pub fn find_asset(&self, symbol_id: &str) -> Asset {
        self.assets
            .get(symbol_id)
            .cloned()
            .unwrap_or_else(|| Asset::stock(symbol_id))
    }

    pub fn is_cached(&self, symbol_id: &str) -> bool {
        self.assets.contains_key(symbol_id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
