//! Asset identity types
//!
//! An [`Asset`] names one tradable instrument on one exchange. Stocks carry an
//! empty exchange and are served by the Finnhub stream; everything quoted on
//! `COINBASE` goes to the Coinbase stream.

mod types;

pub use types::{Price, SearchResult, Stats};

use crate::error::MarketError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange name routed to the Coinbase client
pub const COINBASE_EXCHANGE: &str = "COINBASE";

/// Quote currency assumed for stocks
pub const STOCK_QUOTE: &str = "USD";

/// Base/quote currency pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

/// Specific currency asset on a specific exchange
///
/// Ordering is lexicographic on (exchange, base, quote), which the field order
/// gives us through the derive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub exchange: String,
    pub currency: CurrencyPair,
}

impl Asset {
    pub fn new(exchange: impl Into<String>, currency: CurrencyPair) -> Self {
        Self {
            exchange: exchange.into(),
            currency,
        }
    }

    /// A stock quoted in USD
    pub fn stock(symbol: impl Into<String>) -> Self {
        Self::new("", CurrencyPair::new(symbol, STOCK_QUOTE))
    }

    /// A crypto pair on the given exchange
    pub fn crypto(
        exchange: impl Into<String>,
        base: impl Into<String>,
        quote: impl Into<String>,
    ) -> Self {
        Self::new(exchange, CurrencyPair::new(base, quote))
    }

    pub fn is_stock(&self) -> bool {
        self.exchange.is_empty()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_stock() {
            if self.currency.quote == STOCK_QUOTE {
                write!(f, "{}", self.currency.base)
            } else {
                write!(f, "{}-{}", self.currency.base, self.currency.quote)
            }
        } else {
            write!(
                f,
                "{}:{}-{}",
                self.exchange, self.currency.base, self.currency.quote
            )
        }
    }
}

/// Parses `EXCHANGE:BASE-QUOTE`, `BASE-QUOTE` (stock) or a bare stock symbol
impl FromStr for Asset {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MarketError::Parse("empty asset".to_string()));
        }

        let (exchange, pair) = match s.split_once(':') {
            Some((exchange, pair)) => (exchange.to_uppercase(), pair),
            None => (String::new(), s),
        };

        let currency = match pair.split_once('-') {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
                CurrencyPair::new(base.to_uppercase(), quote.to_uppercase())
            }
            None if exchange.is_empty() => CurrencyPair::new(pair.to_uppercase(), STOCK_QUOTE),
            _ => {
                return Err(MarketError::Parse(format!(
                    "Can't parse currency pair from: {}",
                    s
                )))
            }
        };

        Ok(Self { exchange, currency })
    }
}
