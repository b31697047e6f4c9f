//! tickerwatch: live stock and crypto price watcher
//!
//! This library provides the core components for:
//! - Streaming prices from Coinbase and Finnhub over WebSocket
//! - Quotes, search and symbol lookup via the Finnhub REST API
//! - A markets facade running one poll loop per exchange plus stats and
//!   search workers
//! - Ticker rows with subscription bookkeeping and derived P&L
//! - Logging and Prometheus metrics

pub mod asset;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod markets;
pub mod paths;
pub mod rest;
pub mod symbols;
pub mod telemetry;
pub mod ticker;
pub mod ws;
