//! ens-player: Client that plays its assigned track in lockstep with
//! the rest of the group
//!
//! A player connects to the relay, measures its clock offset against
//! the relay's clock, loads whatever track the master assigns it, and
//! starts playback at the shared target time the relay fans out. With
//! a secret it can instead take the master role and drive the session.

pub mod client;
pub mod engine;
pub mod error;
pub mod roster;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod sync;

pub use client::run;
pub use engine::{AudioEngine, BufferHandle, SilentEngine};
pub use error::PlayerError;
pub use roster::Roster;
pub use session::PlayerSession;
pub use source::{HttpTrackSource, TrackSource};
pub use sync::ClockOffset;
