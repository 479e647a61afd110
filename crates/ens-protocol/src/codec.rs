//! JSON text-frame codec
//!
//! The relay and its clients exchange one JSON envelope per WebSocket
//! text frame, so the codec is a thin serde_json wrapper. Decoding
//! failures are returned to the caller, which is expected to drop the
//! frame silently (a malformed envelope must never crash the relay or
//! provoke an error reply).

use crate::error::ProtocolError;
use crate::message::{ClientMessage, ServerMessage};

/// Decode a client-to-relay envelope from a text frame
pub fn decode_client(text: &str) -> Result<ClientMessage, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a relay-to-client envelope from a text frame
pub fn decode_server(text: &str) -> Result<ServerMessage, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode a client-to-relay envelope
pub fn encode_client(message: &ClientMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Encode a relay-to-client envelope
pub fn encode_server(message: &ServerMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_decode_client_roundtrip() {
        let text = r#"{"type":"timeSync","clientTime":42.0}"#;
        let msg = decode_client(text).unwrap();
        assert_eq!(msg, ClientMessage::TimeSync { client_time: 42.0 });

        let encoded = encode_client(&msg).unwrap();
        assert_eq!(decode_client(&encoded).unwrap(), msg);
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(decode_client("not json at all").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_type() {
        assert!(decode_client(r#"{"secret":"x"}"#).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert!(decode_client(r#"{"type":"launchMissiles"}"#).is_err());
    }

    #[test]
    fn test_encode_server_role() {
        let msg = ServerMessage::Role {
            role: Role::Slave,
            message: "Connected.".to_string(),
            existing_clients: None,
        };
        let text = encode_server(&msg).unwrap();
        assert!(text.contains(r#""type":"role""#));
        assert_eq!(decode_server(&text).unwrap(), msg);
    }
}
