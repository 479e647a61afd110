//! Player error types

use thiserror::Error;

/// Errors surfaced by the player client
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Connection timed out")]
    Timeout,

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Track fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error(transparent)]
    Protocol(#[from] ens_protocol::ProtocolError),

    #[error("Audio engine error: {0}")]
    Engine(String),

    #[error("Connection closed by relay")]
    Closed,
}
