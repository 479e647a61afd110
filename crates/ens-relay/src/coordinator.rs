//! Protocol coordinator
//!
//! The `Coordinator` is the relay's entire protocol brain: a pure state
//! machine over (membership, master slot, readiness set) that maps each
//! lifecycle event or inbound message to a list of outbound messages.
//! It performs no I/O — the event loop in `server` feeds it and hands
//! its output to the `ConnectionRegistry` for delivery — which makes
//! every protocol rule unit-testable without a live channel.
//!
//! # Authorization model
//!
//! Master-only messages (`requestPlayback`, `requestStop`,
//! `assignTrackToClient`) from any other connection are dropped with no
//! response; a failed election is the one unauthorized action that gets
//! an answer, a slave-role confirmation carrying the reason.

use std::sync::Arc;

use ens_core::time::Clock;
use ens_protocol::{AssignTrackPayload, ClientId, ClientMessage, Role, ServerMessage};

use crate::readiness::ReadinessTracker;

/// Delivery target for one outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Exactly one connection
    One(ClientId),
    /// Every connection except one
    AllExcept(ClientId),
    /// Every connection
    All,
}

/// An outbound message paired with where it should go
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub target: Target,
    pub message: ServerMessage,
}

impl Outbound {
    fn one(id: ClientId, message: ServerMessage) -> Self {
        Self {
            target: Target::One(id),
            message,
        }
    }

    fn all_except(id: ClientId, message: ServerMessage) -> Self {
        Self {
            target: Target::AllExcept(id),
            message,
        }
    }

    fn all(message: ServerMessage) -> Self {
        Self {
            target: Target::All,
            message,
        }
    }
}

/// Single-writer coordinator for the playback session
pub struct Coordinator {
    /// Connected clients in join order
    clients: Vec<ClientId>,
    /// At most one elected master; always a current member of `clients`
    master: Option<ClientId>,
    readiness: ReadinessTracker,
    master_secret: String,
    lead_time_millis: u64,
    clock: Arc<dyn Clock>,
}

impl Coordinator {
    /// Create a coordinator with the given election secret and playback
    /// lead time
    pub fn new(master_secret: String, lead_time_millis: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            clients: Vec::new(),
            master: None,
            readiness: ReadinessTracker::new(),
            master_secret,
            lead_time_millis,
            clock,
        }
    }

    /// Identifier of the current master, if any
    pub fn master(&self) -> Option<&ClientId> {
        self.master.as_ref()
    }

    /// Number of connected clients
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Readiness state, for inspection
    pub fn readiness(&self) -> &ReadinessTracker {
        &self.readiness
    }

    /// A new connection was admitted. Greets it as a slave and lets the
    /// master (if any) know about the newcomer.
    pub fn client_connected(&mut self, id: ClientId) -> Vec<Outbound> {
        self.clients.push(id.clone());
        tracing::info!(client_id = %id, clients = self.clients.len(), "Client connected");

        let mut out = vec![Outbound::one(
            id.clone(),
            ServerMessage::Role {
                role: Role::Slave,
                message: "Connected. Provide the secret to become master.".to_string(),
                existing_clients: None,
            },
        )];

        if let Some(master) = self.master.clone() {
            out.push(Outbound::one(
                master,
                ServerMessage::NewClientConnected {
                    client_id: id.clone(),
                },
            ));
            out.push(Outbound::one(
                id,
                ServerMessage::MasterStatusChange {
                    master_present: true,
                    message: None,
                },
            ));
        }

        out
    }

    /// A connection closed. Cascades removal through membership, the
    /// readiness set, and (when the master left) the master slot.
    pub fn client_disconnected(&mut self, id: &ClientId) -> Vec<Outbound> {
        self.clients.retain(|c| c != id);
        self.readiness.remove(id);
        tracing::info!(client_id = %id, clients = self.clients.len(), "Client disconnected");

        if self.master.as_ref() == Some(id) {
            // The slot is simply cleared; the departed connection needs
            // no demotion message.
            self.master = None;
            tracing::info!("Master disconnected, role is now vacant");
            return vec![Outbound::all(ServerMessage::MasterStatusChange {
                master_present: false,
                message: Some("Master disconnected. Role is now vacant.".to_string()),
            })];
        }

        if let Some(master) = self.master.clone() {
            return vec![Outbound::one(
                master,
                ServerMessage::ClientDisconnected { client_id: id.clone() },
            )];
        }

        Vec::new()
    }

    /// Process one inbound message from a connected client
    pub fn handle_message(&mut self, from: &ClientId, message: ClientMessage) -> Vec<Outbound> {
        match message {
            ClientMessage::AttemptMaster { secret } => self.attempt_master(from, &secret),
            ClientMessage::TimeSync { client_time } => self.time_sync(from, client_time),
            ClientMessage::ClientReady => self.client_ready(from),
            ClientMessage::RequestPlayback { target_client_ids } => {
                self.request_playback(from, target_client_ids)
            }
            ClientMessage::RequestStop => self.request_stop(from),
            ClientMessage::AssignTrackToClient { payload } => self.assign_track(from, payload),
        }
    }

    fn attempt_master(&mut self, from: &ClientId, secret: &str) -> Vec<Outbound> {
        if secret != self.master_secret {
            tracing::warn!(client_id = %from, "Master election with incorrect secret");
            return vec![Outbound::one(
                from.clone(),
                ServerMessage::Role {
                    role: Role::Slave,
                    message: "Incorrect secret. You are a slave.".to_string(),
                    existing_clients: None,
                },
            )];
        }

        if self.master.as_ref() == Some(from) {
            // Idempotent: confirm only, no demotion, no readiness reset
            return vec![Outbound::one(
                from.clone(),
                ServerMessage::Role {
                    role: Role::Master,
                    message: "You are already the master.".to_string(),
                    existing_clients: None,
                },
            )];
        }

        let mut out = Vec::new();

        if let Some(previous) = self.master.replace(from.clone()) {
            tracing::info!(old = %previous, new = %from, "Master role taken over");
            out.push(Outbound::one(
                previous,
                ServerMessage::Role {
                    role: Role::Slave,
                    message: "Master role taken by another client.".to_string(),
                    existing_clients: None,
                },
            ));
        } else {
            tracing::info!(client_id = %from, "Master role claimed");
        }

        // Readiness was scoped to the prior master's session
        self.readiness.clear();

        let existing: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|c| *c != from)
            .cloned()
            .collect();

        out.push(Outbound::one(
            from.clone(),
            ServerMessage::Role {
                role: Role::Master,
                message: "You are now the master.".to_string(),
                existing_clients: Some(existing),
            },
        ));
        out.push(Outbound::all_except(
            from.clone(),
            ServerMessage::MasterStatusChange {
                master_present: true,
                message: None,
            },
        ));

        out
    }

    fn time_sync(&self, from: &ClientId, client_time: f64) -> Vec<Outbound> {
        vec![Outbound::one(
            from.clone(),
            ServerMessage::TimeSyncResponse {
                client_time,
                server_time: self.clock.now_millis() as f64,
            },
        )]
    }

    fn client_ready(&mut self, from: &ClientId) -> Vec<Outbound> {
        self.readiness.mark_ready(from);
        tracing::debug!(client_id = %from, "Client reported ready");

        match self.master.clone() {
            Some(master) => vec![Outbound::one(
                master,
                ServerMessage::ClientStateUpdate {
                    client_id: from.clone(),
                    is_ready: true,
                },
            )],
            None => Vec::new(),
        }
    }

    fn request_playback(&self, from: &ClientId, targets: Vec<ClientId>) -> Vec<Outbound> {
        let Some(master) = self.master.clone() else {
            tracing::warn!(client_id = %from, "Playback request with no master elected, ignored");
            return Vec::new();
        };
        if &master != from {
            tracing::warn!(client_id = %from, "Playback request from non-master, ignored");
            return Vec::new();
        }

        // One shared target time; every recipient schedules against it
        // with its own clock offset. Readiness is deliberately not
        // enforced here.
        let target_time = (self.clock.now_millis() + self.lead_time_millis) as f64;

        // The master always plays along, even with an empty target set.
        let mut recipients: Vec<ClientId> = Vec::new();
        for id in targets {
            if !recipients.contains(&id) {
                recipients.push(id);
            }
        }
        if !recipients.contains(&master) {
            recipients.push(master);
        }

        tracing::info!(
            recipients = recipients.len(),
            target_time,
            "Scheduling playback"
        );

        recipients
            .into_iter()
            .map(|id| {
                Outbound::one(
                    id,
                    ServerMessage::PlaybackCommand {
                        server_start_time: target_time,
                    },
                )
            })
            .collect()
    }

    fn request_stop(&self, from: &ClientId) -> Vec<Outbound> {
        if self.master.as_ref() != Some(from) {
            tracing::warn!(client_id = %from, "Stop request from non-master, ignored");
            return Vec::new();
        }

        // Stop is always "now", never scheduled into the future
        tracing::info!("Broadcasting stop");
        vec![Outbound::all(ServerMessage::StopCommand)]
    }

    fn assign_track(&mut self, from: &ClientId, payload: AssignTrackPayload) -> Vec<Outbound> {
        if self.master.as_ref() != Some(from) {
            tracing::warn!(client_id = %from, "Track assignment from non-master, ignored");
            return Vec::new();
        }

        let AssignTrackPayload {
            target_client_id,
            track_name,
        } = payload;

        if !self.clients.contains(&target_client_id) {
            // Stale master UI; it will self-correct on the next
            // disconnect notification.
            tracing::debug!(target = %target_client_id, "Assignment to unknown client, ignored");
            return Vec::new();
        }

        // Even an identical reassignment is new work: the target must
        // load and re-report before it counts as ready again.
        self.readiness.mark_not_ready(&target_client_id);
        tracing::info!(target = %target_client_id, track = %track_name, "Track assigned");

        vec![
            Outbound::one(
                from.clone(),
                ServerMessage::ClientStateUpdate {
                    client_id: target_client_id.clone(),
                    is_ready: false,
                },
            ),
            Outbound::one(target_client_id, ServerMessage::AssignTrack { track_name }),
        ]
    }
}
