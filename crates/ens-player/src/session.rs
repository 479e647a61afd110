//! Player session state machine
//!
//! One `PlayerSession` tracks everything a connected player knows: its
//! current role, its clock offset estimate, the loaded track, and (as
//! master) the group roster. `handle_server_message` maps each relay
//! message to engine actions plus any replies to send back, which keeps
//! the whole protocol exercisable without a socket.

use std::sync::Arc;

use ens_core::time::Clock;
use ens_protocol::{AssignTrackPayload, ClientId, ClientMessage, Role, ServerMessage};

use crate::engine::{AudioEngine, BufferHandle};
use crate::error::PlayerError;
use crate::roster::Roster;
use crate::scheduler;
use crate::source::TrackSource;
use crate::sync::ClockOffset;

struct LoadedTrack {
    name: String,
    buffer: BufferHandle,
}

/// State of one player connection
pub struct PlayerSession<E: AudioEngine, S: TrackSource> {
    engine: E,
    source: S,
    clock: Arc<dyn Clock>,
    role: Role,
    offset: Option<ClockOffset>,
    track: Option<LoadedTrack>,
    roster: Roster,
    master_present: bool,
}

impl<E: AudioEngine, S: TrackSource> PlayerSession<E, S> {
    pub fn new(engine: E, source: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine,
            source,
            clock,
            role: Role::Slave,
            offset: None,
            track: None,
            roster: Roster::new(),
            master_present: false,
        }
    }

    /// Messages to send right after the socket opens. The sync request
    /// goes first so the offset estimate is in place before any
    /// playback command can arrive.
    pub fn on_connect(&self) -> Vec<ClientMessage> {
        vec![ClientMessage::TimeSync {
            client_time: self.clock.now_millis() as f64,
        }]
    }

    /// Election attempt with the given secret
    pub fn attempt_master(&self, secret: &str) -> ClientMessage {
        ClientMessage::AttemptMaster {
            secret: secret.to_string(),
        }
    }

    /// Master control: assign a track to a peer
    pub fn assign_track(&self, target: ClientId, track_name: &str) -> ClientMessage {
        ClientMessage::AssignTrackToClient {
            payload: AssignTrackPayload {
                target_client_id: target,
                track_name: track_name.to_string(),
            },
        }
    }

    /// Master control: trigger playback on every known peer (the relay
    /// adds the master itself)
    pub fn play_all(&self) -> ClientMessage {
        ClientMessage::RequestPlayback {
            target_client_ids: self.roster.peers().to_vec(),
        }
    }

    /// Master control: stop everyone
    pub fn stop_all(&self) -> ClientMessage {
        ClientMessage::RequestStop
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }

    pub fn offset(&self) -> Option<ClockOffset> {
        self.offset
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn master_present(&self) -> bool {
        self.master_present
    }

    /// Name of the currently loaded track, if any
    pub fn track_name(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.name.as_str())
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Apply one relay message; returns replies to send back
    pub async fn handle_server_message(
        &mut self,
        message: ServerMessage,
    ) -> Result<Vec<ClientMessage>, PlayerError> {
        match message {
            ServerMessage::Role {
                role,
                message,
                existing_clients,
            } => {
                tracing::info!(?role, %message, "Role update");
                self.role = role;
                if role == Role::Master {
                    self.master_present = true;
                    self.roster.reset(existing_clients.unwrap_or_default());
                }
                Ok(Vec::new())
            }

            ServerMessage::TimeSyncResponse {
                client_time,
                server_time,
            } => {
                let received_at = self.clock.now_millis() as f64;
                let offset = ClockOffset::from_round_trip(client_time, server_time, received_at);
                tracing::info!(offset_ms = offset.millis(), "Clock offset estimated");
                self.offset = Some(offset);
                Ok(Vec::new())
            }

            ServerMessage::AssignTrack { track_name } => {
                tracing::info!(track = %track_name, "Track assigned");
                // A failed load is local: the master simply never sees
                // this client become ready.
                let bytes = match self.source.fetch(&track_name).await {
                    Ok(bytes) => bytes,
                    Err(error) => {
                        tracing::warn!(track = %track_name, %error, "Track fetch failed");
                        return Ok(Vec::new());
                    }
                };
                let buffer = match self.engine.load(bytes).await {
                    Ok(buffer) => buffer,
                    Err(error) => {
                        tracing::warn!(track = %track_name, %error, "Track load failed");
                        return Ok(Vec::new());
                    }
                };
                self.track = Some(LoadedTrack {
                    name: track_name,
                    buffer,
                });
                Ok(vec![ClientMessage::ClientReady])
            }

            ServerMessage::PlaybackCommand { server_start_time } => {
                self.schedule_playback(server_start_time).await?;
                Ok(Vec::new())
            }

            ServerMessage::StopCommand => {
                self.engine.stop().await?;
                Ok(Vec::new())
            }

            ServerMessage::NewClientConnected { client_id } => {
                tracing::info!(client_id = %client_id, "Peer joined");
                self.roster.add(client_id);
                Ok(Vec::new())
            }

            ServerMessage::ClientDisconnected { client_id } => {
                tracing::info!(client_id = %client_id, "Peer left");
                self.roster.remove(&client_id);
                Ok(Vec::new())
            }

            ServerMessage::ClientStateUpdate {
                client_id,
                is_ready,
            } => {
                tracing::debug!(client_id = %client_id, is_ready, "Peer readiness update");
                self.roster.set_ready(&client_id, is_ready);
                Ok(Vec::new())
            }

            ServerMessage::MasterStatusChange {
                master_present,
                message,
            } => {
                if let Some(message) = message {
                    tracing::info!(master_present, %message, "Master status changed");
                } else {
                    tracing::info!(master_present, "Master status changed");
                }
                self.master_present = master_present;
                Ok(Vec::new())
            }
        }
    }

    async fn schedule_playback(&mut self, server_start_time: f64) -> Result<(), PlayerError> {
        let Some(offset) = self.offset else {
            tracing::warn!("Playback command before clock sync, ignoring");
            return Ok(());
        };
        let Some(track) = &self.track else {
            tracing::warn!("Playback command with no track loaded, ignoring");
            return Ok(());
        };

        let local_now = self.clock.now_millis() as f64;
        match scheduler::start_delay(server_start_time, &offset, local_now) {
            Some(delay) => {
                tracing::info!(
                    track = %track.name,
                    delay_ms = delay.as_millis() as u64,
                    "Starting playback at shared target"
                );
                self.engine.play_after(track.buffer, delay).await
            }
            None => {
                // Better one silent device than one out of sync
                tracing::warn!(
                    target = server_start_time,
                    "Target time already elapsed, discarding playback command"
                );
                Ok(())
            }
        }
    }
}
