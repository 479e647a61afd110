//! WebSocket server and event loop
//!
//! Connection handling follows a strict single-writer layout: each
//! socket gets a writer task fed by a per-connection channel, and every
//! lifecycle event and inbound frame is funneled into one mpsc channel
//! consumed by a lone event-loop task that owns the `Coordinator` and
//! `ConnectionRegistry`. Arrival order on that channel is processing
//! order, which is the whole concurrency story.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;

use ens_core::config::RelayConfig;
use ens_core::time::{Clock, SystemClock};
use ens_protocol::{decode_client, encode_server, ClientId, ServerMessage};

use crate::coordinator::{Coordinator, Target};
use crate::registry::ConnectionRegistry;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Everything the event loop reacts to, in arrival order
#[derive(Debug)]
pub enum RelayEvent {
    Connected {
        client_id: ClientId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    },
    Inbound {
        client_id: ClientId,
        text: String,
    },
    Disconnected {
        client_id: ClientId,
    },
}

/// Shared state handed to Axum handlers. Handlers never touch protocol
/// state directly; they only enqueue events.
#[derive(Clone)]
struct AppState {
    events: mpsc::UnboundedSender<RelayEvent>,
}

/// Relay server entry point
pub struct RelayServer;

impl RelayServer {
    /// Bind and start serving. Returns once the listener is bound; the
    /// handle keeps the background tasks alive and exposes the bound
    /// address (useful with port 0 in tests).
    pub async fn start(config: RelayConfig, clock: Arc<dyn Clock>) -> anyhow::Result<RelayHandle> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let coordinator = Coordinator::new(
            config.master_secret.clone(),
            config.lead_time_millis(),
            clock,
        );
        let events = tokio::spawn(run_event_loop(coordinator, event_rx));

        let state = AppState {
            events: event_tx,
        };
        let router = build_router(state, &config);

        let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(address = %local_addr, "Relay listening");

        let shutdown = CancellationToken::new();
        let serve_token = shutdown.clone();
        let server = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(serve_token.cancelled_owned())
                .await;
            if let Err(error) = result {
                tracing::error!(%error, "Relay server exited with error");
            }
        });

        Ok(RelayHandle {
            local_addr,
            shutdown,
            _server: server,
            _events: events,
        })
    }
}

/// Handle returned by `RelayServer::start`
pub struct RelayHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    _server: tokio::task::JoinHandle<()>,
    _events: tokio::task::JoinHandle<()>,
}

impl RelayHandle {
    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Begin a graceful shutdown
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

fn build_router(state: AppState, config: &RelayConfig) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .nest_service("/audio", ServeDir::new(&config.audio_dir))
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Drive one WebSocket connection: a writer task draining the outbound
/// channel and a reader task forwarding frames as events. The identity
/// of the connection lives and dies here; the event loop learns of both
/// ends through `Connected`/`Disconnected`.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = ClientId::new();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerMessage>();

    if state
        .events
        .send(RelayEvent::Connected {
            client_id: client_id.clone(),
            sender: out_tx,
        })
        .is_err()
    {
        // Event loop already gone, nothing to serve
        return;
    }
    tracing::debug!(client_id = %client_id, "Socket opened");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer_id = client_id.clone();
    let writer = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        ping_interval.tick().await;

        loop {
            tokio::select! {
                message = out_rx.recv() => {
                    let Some(message) = message else { break };
                    match encode_server(&message) {
                        Ok(text) => {
                            if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            tracing::error!(client_id = %writer_id, %error, "Failed to encode outbound message");
                        }
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(WsMessage::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let reader_id = client_id.clone();
    let reader_events = state.events.clone();
    let reader = tokio::spawn(async move {
        while let Some(Ok(message)) = ws_rx.next().await {
            match message {
                WsMessage::Text(text) => {
                    if reader_events
                        .send(RelayEvent::Inbound {
                            client_id: reader_id.clone(),
                            text,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                WsMessage::Close(_) => break,
                // axum answers pings itself; pongs need no bookkeeping
                _ => {}
            }
        }
    });

    // Either side finishing means the connection is done
    tokio::select! {
        _ = writer => {}
        _ = reader => {}
    }

    let _ = state.events.send(RelayEvent::Disconnected {
        client_id: client_id.clone(),
    });
    tracing::debug!(client_id = %client_id, "Socket closed");
}

/// The single task that owns all protocol state. Runs until every
/// event sender is dropped.
pub async fn run_event_loop(
    mut coordinator: Coordinator,
    mut events: mpsc::UnboundedReceiver<RelayEvent>,
) {
    let mut registry = ConnectionRegistry::new();

    while let Some(event) = events.recv().await {
        match event {
            RelayEvent::Connected { client_id, sender } => {
                registry.insert(client_id.clone(), sender);
                let out = coordinator.client_connected(client_id);
                deliver(&registry, out);
            }
            RelayEvent::Inbound { client_id, text } => {
                let message = match decode_client(&text) {
                    Ok(message) => message,
                    Err(error) => {
                        tracing::warn!(client_id = %client_id, %error, "Ignoring malformed message");
                        continue;
                    }
                };
                let out = coordinator.handle_message(&client_id, message);
                deliver(&registry, out);
            }
            RelayEvent::Disconnected { client_id } => {
                // Removed before the cascade so the departed connection
                // is excluded from any resulting broadcast.
                registry.remove(&client_id);
                let out = coordinator.client_disconnected(&client_id);
                deliver(&registry, out);
            }
        }
    }

    tracing::debug!("Event loop finished");
}

fn deliver(registry: &ConnectionRegistry, outbound: Vec<crate::coordinator::Outbound>) {
    for out in outbound {
        match out.target {
            Target::One(id) => registry.send_to(&id, &out.message),
            Target::AllExcept(excluded) => {
                registry.broadcast_where(|id| id != &excluded, &out.message)
            }
            Target::All => registry.broadcast_where(|_| true, &out.message),
        }
    }
}

/// Start a relay on an ephemeral local port with the given secret.
/// Intended for integration tests.
pub async fn start_local(master_secret: &str, lead_time_millis: u64) -> anyhow::Result<RelayHandle> {
    let config = RelayConfig {
        bind_address: "127.0.0.1:0".to_string(),
        master_secret: master_secret.to_string(),
        lead_time: Duration::from_millis(lead_time_millis),
        ..RelayConfig::default()
    };
    RelayServer::start(config, Arc::new(SystemClock)).await
}
