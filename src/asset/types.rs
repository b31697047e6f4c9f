//! Value types produced by the exchange clients

use super::Asset;
use serde::{Deserialize, Serialize};

/// A live price for one asset
///
/// The value is kept as the exact decimal text the exchange sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub value: String,
    pub asset: Asset,
}

impl Price {
    pub fn new(value: impl Into<String>, asset: Asset) -> Self {
        Self {
            value: value.into(),
            asset,
        }
    }
}

/// Reference statistics for one asset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub current_price: f64,
    pub opening_price: f64,
}

impl Stats {
    /// Returned when a fetch failed; shows up as a -1 price until the next fetch
    pub const UNAVAILABLE: Stats = Stats {
        current_price: -1.0,
        opening_price: 0.0,
    };

    pub fn new(current_price: f64, opening_price: f64) -> Self {
        Self {
            current_price,
            opening_price,
        }
    }

    pub fn is_available(&self) -> bool {
        self.current_price >= 0.0
    }
}

/// One hit of a free-text asset search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Provider type, e.g. "Crypto" or "Common Stock"
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub asset: Asset,
}
