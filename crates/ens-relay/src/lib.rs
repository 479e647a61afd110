//! ens-relay: Coordinator daemon for synchronized multi-device playback
//!
//! The relay accepts WebSocket connections from participant clients,
//! elects a single master via a shared secret, routes track assignments
//! and readiness reports, and fans a master's play trigger out as one
//! shared absolute start time. All protocol state is owned by a single
//! event-loop task; messages are processed strictly in arrival order.

pub mod coordinator;
pub mod readiness;
pub mod registry;
pub mod server;

pub use coordinator::{Coordinator, Outbound, Target};
pub use readiness::ReadinessTracker;
pub use registry::ConnectionRegistry;
pub use server::{RelayHandle, RelayServer};
