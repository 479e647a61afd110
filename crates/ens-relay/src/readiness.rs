//! Per-client readiness tracking
//!
//! A client is "ready" when it has reported that its assigned track is
//! decoded and schedulable. Readiness is advisory: it is surfaced to
//! the master so its play control can be gated in the UI, but the relay
//! never refuses a playback request over it. That relaxation is a
//! deliberate design choice, not an oversight — the judgment call stays
//! with the controlling client.

use std::collections::HashSet;

use ens_protocol::ClientId;

/// Set of clients whose last-known audio load succeeded after their
/// most recent track assignment.
#[derive(Debug, Default)]
pub struct ReadinessTracker {
    ready: HashSet<ClientId>,
}

impl ReadinessTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a client ready. Idempotent; returns true if the state changed.
    pub fn mark_ready(&mut self, id: &ClientId) -> bool {
        self.ready.insert(id.clone())
    }

    /// Mark a client not ready. Called on every track (re)assignment,
    /// since a freshly assigned track is by definition not yet loaded.
    /// Returns true if the state changed.
    pub fn mark_not_ready(&mut self, id: &ClientId) -> bool {
        self.ready.remove(id)
    }

    /// Whether a client is currently marked ready
    pub fn is_ready(&self, id: &ClientId) -> bool {
        self.ready.contains(id)
    }

    /// Whether every listed client is ready. An empty list is
    /// vacuously ready.
    pub fn all_ready<'a>(&self, ids: impl IntoIterator<Item = &'a ClientId>) -> bool {
        ids.into_iter().all(|id| self.is_ready(id))
    }

    /// Forget a disconnected client
    pub fn remove(&mut self, id: &ClientId) {
        self.ready.remove(id);
    }

    /// Drop all readiness state. Done on every master change: readiness
    /// was scoped to the prior master's session.
    pub fn clear(&mut self) {
        self.ready.clear();
    }

    /// Number of clients currently ready
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    /// Whether no client is ready
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_ready_is_idempotent() {
        let mut tracker = ReadinessTracker::new();
        let id = ClientId::from("c1");

        assert!(tracker.mark_ready(&id));
        assert!(!tracker.mark_ready(&id));
        assert!(tracker.is_ready(&id));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_mark_not_ready_clears_entry() {
        let mut tracker = ReadinessTracker::new();
        let id = ClientId::from("c1");

        tracker.mark_ready(&id);
        assert!(tracker.mark_not_ready(&id));
        assert!(!tracker.is_ready(&id));
        assert!(!tracker.mark_not_ready(&id));
    }

    #[test]
    fn test_all_ready_empty_set_is_vacuously_true() {
        let tracker = ReadinessTracker::new();
        assert!(tracker.all_ready(std::iter::empty()));
    }

    #[test]
    fn test_all_ready_requires_every_listed_client() {
        let mut tracker = ReadinessTracker::new();
        let a = ClientId::from("a");
        let b = ClientId::from("b");

        tracker.mark_ready(&a);
        assert!(tracker.all_ready([&a]));
        assert!(!tracker.all_ready([&a, &b]));

        tracker.mark_ready(&b);
        assert!(tracker.all_ready([&a, &b]));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut tracker = ReadinessTracker::new();
        tracker.mark_ready(&ClientId::from("a"));
        tracker.mark_ready(&ClientId::from("b"));

        tracker.clear();
        assert!(tracker.is_empty());
        assert!(!tracker.is_ready(&ClientId::from("a")));
    }
}
