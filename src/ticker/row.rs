//! One displayed position and its derived figures

use crate::asset::{Asset, Stats};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Row identifier, unique for the life of a list
pub type TickerId = u64;

/// Move of the last price versus the one before it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Down,
    #[default]
    Unchanged,
}

impl Direction {
    pub fn between(previous: Decimal, current: Decimal) -> Self {
        match current.cmp(&previous) {
            std::cmp::Ordering::Greater => Self::Up,
            std::cmp::Ordering::Less => Self::Down,
            std::cmp::Ordering::Equal => Self::Unchanged,
        }
    }
}

/// A watched asset with the position held in it
///
/// Prices start at the unavailable sentinel (-1 last, 0 open) until stats
/// or a streamed price arrive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticker {
    pub id: TickerId,
    pub asset: Asset,
    pub quantity: Decimal,
    /// Price paid per unit
    pub cost_basis: Decimal,
    pub last_price: Decimal,
    pub opening_price: Decimal,
    pub direction: Direction,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ticker {
    pub fn new(id: TickerId, asset: Asset, quantity: Decimal, cost_basis: Decimal) -> Self {
        Self {
            id,
            asset,
            quantity,
            cost_basis,
            last_price: to_decimal(Stats::UNAVAILABLE.current_price),
            opening_price: to_decimal(Stats::UNAVAILABLE.opening_price),
            direction: Direction::Unchanged,
            updated_at: None,
        }
    }

    /// Seed last and opening price from a stats fetch
    pub fn set_stats(&mut self, stats: Stats) {
        self.update_last(to_decimal(stats.current_price));
        self.opening_price = to_decimal(stats.opening_price);
    }

    /// Apply a streamed price
    pub fn set_price(&mut self, price: Decimal, at: DateTime<Utc>) {
        self.update_last(price);
        self.updated_at = Some(at);
    }

    fn update_last(&mut self, price: Decimal) {
        self.direction = Direction::between(self.last_price, price);
        self.last_price = price;
    }

    /// Whether a real price has been seen
    pub fn has_price(&self) -> bool {
        self.last_price >= Decimal::ZERO
    }

    /// Percent move since the open; `None` without an opening price
    pub fn percent_change(&self) -> Option<Decimal> {
        if self.opening_price.is_zero() {
            return None;
        }
        Some((self.last_price - self.opening_price) / self.opening_price * dec!(100))
    }

    pub fn value(&self) -> Decimal {
        self.quantity * self.last_price
    }

    /// Gain versus what was paid
    pub fn open_pl(&self) -> Decimal {
        self.value() - self.quantity * self.cost_basis
    }

    /// Gain since the open
    pub fn daily_pl(&self) -> Decimal {
        self.quantity * (self.last_price - self.opening_price)
    }
}

/// Sums over every row quoted in one currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub value: Decimal,
    pub open_pl: Decimal,
    pub daily_pl: Decimal,
}

impl Totals {
    pub(crate) fn add(&mut self, ticker: &Ticker) {
        self.value += ticker.value();
        self.open_pl += ticker.open_pl();
        self.daily_pl += ticker.daily_pl();
    }
}

fn to_decimal(value: f64) -> Decimal {
    match Decimal::try_from(value) {
        Ok(d) => d.normalize(),
        Err(_) => {
            tracing::warn!(value, "Price out of decimal range");
            dec!(-1)
        }
    }
}
