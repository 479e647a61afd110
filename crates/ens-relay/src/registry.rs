//! Connection registry
//!
//! Maps client identifiers to the writer-task sender for each live
//! socket. The registry is owned by the relay's single event-loop task,
//! so no locking is needed; the per-client channel is the only handle
//! anything holds to a connection.

use std::collections::HashMap;

use tokio::sync::mpsc;

use ens_protocol::{ClientId, ServerMessage};

/// Registry of currently open connections
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ClientId, mpsc::UnboundedSender<ServerMessage>>,
}

impl ConnectionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a connection, generating a fresh unique identifier for it
    pub fn admit(&mut self, sender: mpsc::UnboundedSender<ServerMessage>) -> ClientId {
        let id = ClientId::new();
        self.insert(id.clone(), sender);
        id
    }

    /// Admit a connection under an identifier generated by the caller
    /// (the socket handler creates the id so it can tag later events)
    pub fn insert(&mut self, id: ClientId, sender: mpsc::UnboundedSender<ServerMessage>) {
        self.connections.insert(id, sender);
    }

    /// Purge a connection. Returns true if it was present.
    pub fn remove(&mut self, id: &ClientId) -> bool {
        self.connections.remove(id).is_some()
    }

    /// Send to exactly one connection.
    ///
    /// An absent identifier or a closed writer channel is a race to be
    /// tolerated, not an error: both silently no-op.
    pub fn send_to(&self, id: &ClientId, message: &ServerMessage) {
        if let Some(sender) = self.connections.get(id) {
            if sender.send(message.clone()).is_err() {
                tracing::trace!(client_id = %id, "Dropped message to closing connection");
            }
        }
    }

    /// Send to every open connection matching the predicate
    pub fn broadcast_where(
        &self,
        predicate: impl Fn(&ClientId) -> bool,
        message: &ServerMessage,
    ) {
        for (id, sender) in &self.connections {
            if predicate(id) && sender.send(message.clone()).is_err() {
                tracing::trace!(client_id = %id, "Dropped broadcast to closing connection");
            }
        }
    }

    /// Whether a connection is currently registered
    pub fn contains(&self, id: &ClientId) -> bool {
        self.connections.contains_key(id)
    }

    /// Identifiers of all current connections
    pub fn client_ids(&self) -> Vec<ClientId> {
        self.connections.keys().cloned().collect()
    }

    /// Number of open connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
