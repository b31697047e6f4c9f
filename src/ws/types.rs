//! WebSocket types and configuration

use std::time::Duration;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Maximum reconnection attempts before giving up (0 = infinite)
    pub max_reconnect_attempts: u32,
    /// Initial delay before first reconnection attempt
    pub initial_reconnect_delay: Duration,
    /// Maximum delay between reconnection attempts
    pub max_reconnect_delay: Duration,
    /// Timeout for the TCP/TLS/WebSocket handshake
    pub connect_timeout: Duration,
    /// Read deadline; `None` blocks until the server sends something
    pub read_timeout: Option<Duration>,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 10,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set maximum reconnection attempts
    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    /// Set initial reconnection delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_reconnect_delay = d;
        self
    }

    /// Set maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }

    /// Set handshake timeout
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }

    /// Set read deadline
    pub fn read_timeout(mut self, d: Option<Duration>) -> Self {
        self.read_timeout = d;
        self
    }

    /// Backoff before the given reconnection attempt (1-based)
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_reconnect_delay
            .checked_mul(1u32 << shift)
            .map_or(self.max_reconnect_delay, |d| d.min(self.max_reconnect_delay))
    }

    /// Whether another reconnection attempt is allowed
    pub fn may_reconnect(&self, attempts_made: u32) -> bool {
        self.max_reconnect_attempts == 0 || attempts_made < self.max_reconnect_attempts
    }
}

/// WebSocket errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsError {
    /// Connection failed
    ConnectionFailed(String),
    /// No open connection
    NotConnected,
    /// Send failed
    SendFailed(String),
    /// Receive failed
    ReceiveFailed(String),
    /// Server closed the connection
    Closed(String),
    /// Nothing arrived before the read deadline
    ReadTimeout(Duration),
}

impl std::fmt::Display for WsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsError::ConnectionFailed(e) => write!(f, "Connection failed: {}", e),
            WsError::NotConnected => write!(f, "Not connected"),
            WsError::SendFailed(e) => write!(f, "Send failed: {}", e),
            WsError::ReceiveFailed(e) => write!(f, "Receive failed: {}", e),
            WsError::Closed(reason) => write!(f, "Connection closed: {}", reason),
            WsError::ReadTimeout(d) => write!(f, "No message within {:?}", d),
        }
    }
}

impl std::error::Error for WsError {}
