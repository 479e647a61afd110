//! Master-side view of the group
//!
//! Only meaningful while this player holds the master role: which
//! peers exist and which of them have reported their assigned track as
//! loaded. Readiness here is advisory, mirroring what the relay
//! forwards; the master may trigger playback regardless.

use std::collections::HashSet;

use ens_protocol::ClientId;

/// Peers known to the master and their readiness
#[derive(Debug, Default)]
pub struct Roster {
    peers: Vec<ClientId>,
    ready: HashSet<ClientId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster with the peer list from a role grant
    pub fn reset(&mut self, peers: Vec<ClientId>) {
        self.peers = peers;
        self.ready.clear();
    }

    pub fn add(&mut self, id: ClientId) {
        if !self.peers.contains(&id) {
            self.peers.push(id);
        }
    }

    pub fn remove(&mut self, id: &ClientId) {
        self.peers.retain(|p| p != id);
        self.ready.remove(id);
    }

    pub fn set_ready(&mut self, id: &ClientId, is_ready: bool) {
        if is_ready {
            self.ready.insert(id.clone());
        } else {
            self.ready.remove(id);
        }
    }

    pub fn peers(&self) -> &[ClientId] {
        &self.peers
    }

    pub fn is_ready(&self, id: &ClientId) -> bool {
        self.ready.contains(id)
    }

    /// Whether every known peer has reported ready. Vacuously true
    /// with no peers.
    pub fn all_ready(&self) -> bool {
        self.peers.iter().all(|p| self.ready.contains(p))
    }
}
