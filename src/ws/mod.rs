//! WebSocket connection wrapper
//!
//! Owns one streaming connection and exposes it as explicit connect / write /
//! read / disconnect steps, so an exchange client can drive it from its poll
//! loop one read at a time.

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsConfig, WsError};
