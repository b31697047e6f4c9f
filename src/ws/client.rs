//! WebSocket client owning a single connection

use super::types::{WsConfig, WsError};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client with explicit connect/read/write steps
///
/// Any transport failure drops the connection, so `is_connected` turning
/// false is how callers learn they need to reconnect.
pub struct WsClient {
    config: WsConfig,
    stream: Option<Stream>,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the connection, replacing any existing one
    pub async fn connect(&mut self) -> Result<(), WsError> {
        self.disconnect().await;

        let connect = connect_async(self.config.url.as_str());
        let (stream, _response) = tokio::time::timeout(self.config.connect_timeout, connect)
            .await
            .map_err(|_| {
                WsError::ConnectionFailed(format!(
                    "handshake took longer than {:?}",
                    self.config.connect_timeout
                ))
            })?
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    /// Send one text frame
    pub async fn send_text(&mut self, text: String) -> Result<(), WsError> {
        let stream = self.stream.as_mut().ok_or(WsError::NotConnected)?;
        if let Err(e) = stream.send(Message::Text(text)).await {
            self.stream = None;
            return Err(WsError::SendFailed(e.to_string()));
        }
        Ok(())
    }

    /// Wait for the next data frame and return it as text
    ///
    /// Control frames are handled here: pings are answered, pongs and raw
    /// frames skipped. Binary frames that are valid UTF-8 count as text.
    pub async fn read_text(&mut self) -> Result<String, WsError> {
        loop {
            let stream = self.stream.as_mut().ok_or(WsError::NotConnected)?;

            let next = match self.config.read_timeout {
                Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        self.stream = None;
                        return Err(WsError::ReadTimeout(limit));
                    }
                },
                None => stream.next().await,
            };

            match next {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => return Ok(text),
                    Err(_) => tracing::debug!(url = %self.config.url, "Ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = stream.send(Message::Pong(data)).await {
                        self.stream = None;
                        return Err(WsError::SendFailed(e.to_string()));
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    self.stream = None;
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "no reason given".to_string());
                    return Err(WsError::Closed(reason));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.stream = None;
                    return Err(WsError::ReceiveFailed(e.to_string()));
                }
                None => {
                    self.stream = None;
                    return Err(WsError::Closed("stream ended".to_string()));
                }
            }
        }
    }

    /// Close the connection if open; errors while closing are ignored
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }
}
