//! ens-protocol: Wire protocol for the ensemble playback relay
//!
//! This crate defines the JSON message envelopes exchanged between
//! participant clients and the relay over a text-framed channel. Every
//! envelope is an object of shape `{ "type": "...", ...fields }`; the
//! enums here are internally tagged so serde produces exactly that
//! layout.

pub mod codec;
pub mod error;
pub mod ids;
pub mod message;

pub use codec::{decode_client, decode_server, encode_client, encode_server};
pub use error::ProtocolError;
pub use ids::ClientId;
pub use message::{AssignTrackPayload, ClientMessage, Role, ServerMessage};
