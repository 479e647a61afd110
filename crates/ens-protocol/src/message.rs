//! Message types for the ensemble relay protocol
//!
//! Messages are JSON objects with a `type` field naming the variant and
//! the remaining fields inline, e.g.
//! `{"type":"attemptMaster","secret":"..."}`. Timestamps are wall-clock
//! milliseconds carried as JSON numbers (`f64`), matching what a
//! browser participant produces with `Date.now()`.
//!
//! # Message Flow
//!
//! Typical sequence for one session:
//!
//! 1. Client connects, relay sends `role{slave}`
//! 2. Client sends `timeSync`, relay echoes `timeSyncResponse`
//! 3. One client sends `attemptMaster{secret}` and, on success,
//!    receives `role{master, existingClients}`
//! 4. Master sends `assignTrackToClient`; the target receives
//!    `assignTrack` and reports `clientReady` once loaded
//! 5. Master sends `requestPlayback`; every selected client plus the
//!    master receives `playbackCommand` with one shared target time
//! 6. `requestStop` fans out `stopCommand` to everyone, immediately

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::ClientId;

/// Role held by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The single connection allowed to issue playback, stop, and
    /// track-assignment commands
    Master,
    /// Any other connection; receives commands and reports readiness
    Slave,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Slave => write!(f, "slave"),
        }
    }
}

/// Payload of `assignTrackToClient`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTrackPayload {
    /// The slave that should load the track
    pub target_client_id: ClientId,
    /// Track file name, resolved by the client under the relay's
    /// `/audio/` prefix
    pub track_name: String,
}

/// Messages consumed by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Request the master role with a shared secret
    AttemptMaster { secret: String },

    /// Clock sample: the client's wall clock at send time, echoed back
    /// together with the relay's clock in `timeSyncResponse`
    #[serde(rename_all = "camelCase")]
    TimeSync { client_time: f64 },

    /// The assigned track is decoded and schedulable
    ClientReady,

    /// Master only: schedule playback for the listed clients
    #[serde(rename_all = "camelCase")]
    RequestPlayback { target_client_ids: Vec<ClientId> },

    /// Master only: stop playback everywhere, now
    RequestStop,

    /// Master only: assign a track to one client
    AssignTrackToClient { payload: AssignTrackPayload },
}

/// Messages emitted by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Role assignment or confirmation. `existing_clients` is present
    /// only on a successful election so the new master can render the
    /// participants that joined before it
    #[serde(rename_all = "camelCase")]
    Role {
        role: Role,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        existing_clients: Option<Vec<ClientId>>,
    },

    /// Echo of a `timeSync` sample, stamped with the relay clock
    #[serde(rename_all = "camelCase")]
    TimeSyncResponse { client_time: f64, server_time: f64 },

    /// Scheduled playback start, expressed on the relay's clock
    #[serde(rename_all = "camelCase")]
    PlaybackCommand { server_start_time: f64 },

    /// Stop local playback immediately; never carries a delay
    StopCommand,

    /// A track was assigned to this client
    #[serde(rename_all = "camelCase")]
    AssignTrack { track_name: String },

    /// Sent to the master when another client joins
    #[serde(rename_all = "camelCase")]
    NewClientConnected { client_id: ClientId },

    /// Sent to the master when another client leaves
    #[serde(rename_all = "camelCase")]
    ClientDisconnected { client_id: ClientId },

    /// Sent to the master when a client's readiness changes
    #[serde(rename_all = "camelCase")]
    ClientStateUpdate { client_id: ClientId, is_ready: bool },

    /// UI hint broadcast when the master role is taken or vacated
    #[serde(rename_all = "camelCase")]
    MasterStatusChange {
        master_present: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}
