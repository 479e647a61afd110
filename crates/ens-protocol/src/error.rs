//! Protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding envelopes
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The frame was not valid JSON, or its `type` was missing/unknown
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),
}
