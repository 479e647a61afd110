//! Player client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a player client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Base HTTP URL of the relay, e.g. `http://127.0.0.1:4600`.
    ///
    /// The WebSocket endpoint and the `/audio/` track prefix are both
    /// derived from it.
    pub server_url: String,

    /// Shared secret to attempt master election with after connecting.
    /// When absent the player stays a slave.
    pub master_secret: Option<String>,

    /// Connection timeout
    #[serde(with = "super::duration_millis", rename = "connect_timeout_ms")]
    pub connect_timeout: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:4600".to_string(),
            master_secret: None,
            connect_timeout: Duration::from_millis(5000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_secret() {
        let config = PlayerConfig::default();
        assert!(config.master_secret.is_none());
    }

    #[test]
    fn test_parses_secret_and_timeout() {
        let config: PlayerConfig = toml::from_str(
            "server_url = \"http://box:4600\"\nmaster_secret = \"s\"\nconnect_timeout_ms = 250",
        )
        .unwrap();
        assert_eq!(config.server_url, "http://box:4600");
        assert_eq!(config.master_secret.as_deref(), Some("s"));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }
}
