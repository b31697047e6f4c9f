//! Error types shared by the exchange clients and the markets facade

use crate::ws::WsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised inside the market data layer
///
/// Most of these never leave an exchange client: they are logged and turned
/// into a sentinel or empty result at the client boundary.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("code: {status}\n{context}: {body}")]
    Http {
        status: u16,
        context: String,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected message: {0}")]
    Parse(String),

    #[error("{exchange} error: {message}")]
    Protocol { exchange: String, message: String },

    #[error("{exchange} stream lost: {reason}")]
    StreamLost { exchange: String, reason: String },

    #[error("REST client is not connected")]
    NotConnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API key file not found: {}", .0.display())]
    MissingKey(PathBuf),

    #[error("Empty API key in {}", .0.display())]
    EmptyKey(PathBuf),

    #[error("Can't find HOME environment variable")]
    MissingHome,
}

/// Result alias for the market data layer
pub type Result<T> = std::result::Result<T, MarketError>;
