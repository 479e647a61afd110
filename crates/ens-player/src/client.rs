//! WebSocket connection loop
//!
//! Connects to the relay, runs the initial sync exchange, and drives a
//! [`PlayerSession`] off the message stream until the relay closes the
//! connection.

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use ens_core::config::PlayerConfig;
use ens_protocol::{decode_server, encode_client, ClientMessage};

use crate::engine::AudioEngine;
use crate::error::PlayerError;
use crate::session::PlayerSession;
use crate::source::TrackSource;

/// WebSocket endpoint derived from the relay's base HTTP URL
pub fn websocket_url(server_url: &str) -> Result<Url, PlayerError> {
    let mut url = Url::parse(server_url)?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| PlayerError::Connect(format!("cannot derive ws url from {}", server_url)))?;
    url.set_path("/ws");
    Ok(url)
}

/// Connect and run the session until the relay closes the connection
pub async fn run<E, S>(
    config: &PlayerConfig,
    mut session: PlayerSession<E, S>,
) -> Result<(), PlayerError>
where
    E: AudioEngine,
    S: TrackSource,
{
    let url = websocket_url(&config.server_url)?;
    tracing::info!(%url, "Connecting to relay");

    let (socket, _) = tokio::time::timeout(config.connect_timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| PlayerError::Timeout)??;
    let (mut write, mut read) = socket.split();

    for message in session.on_connect() {
        send(&mut write, &message).await?;
    }
    if let Some(secret) = &config.master_secret {
        send(&mut write, &session.attempt_master(secret)).await?;
    }

    while let Some(frame) = read.next().await {
        match frame? {
            Message::Text(text) => {
                let message = match decode_server(&text) {
                    Ok(message) => message,
                    Err(error) => {
                        tracing::warn!(%error, "Ignoring malformed message from relay");
                        continue;
                    }
                };
                for reply in session.handle_server_message(message).await? {
                    send(&mut write, &reply).await?;
                }
            }
            Message::Close(_) => {
                tracing::info!("Relay closed the connection");
                return Ok(());
            }
            _ => {}
        }
    }

    Err(PlayerError::Closed)
}

async fn send<W>(write: &mut W, message: &ClientMessage) -> Result<(), PlayerError>
where
    W: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = encode_client(message)?;
    write.send(Message::Text(text)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url_from_http_base() {
        let url = websocket_url("http://relay:4600").unwrap();
        assert_eq!(url.as_str(), "ws://relay:4600/ws");
    }

    #[test]
    fn test_websocket_url_from_https_base() {
        let url = websocket_url("https://relay.example.com").unwrap();
        assert_eq!(url.as_str(), "wss://relay.example.com/ws");
    }

    #[test]
    fn test_websocket_url_replaces_existing_path() {
        let url = websocket_url("http://relay:4600/some/page").unwrap();
        assert_eq!(url.as_str(), "ws://relay:4600/ws");
    }
}
