//! Relay daemon configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the relay daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to bind the WebSocket server to
    pub bind_address: String,

    /// Shared secret required to claim the master role.
    ///
    /// Delivered out-of-band (config file or flag). An empty secret is
    /// allowed but the daemon warns loudly about it at startup.
    pub master_secret: String,

    /// Lead time added to "now" when computing a playback target time.
    ///
    /// Long enough to absorb relay latency and client processing, short
    /// enough to still feel responsive when the master hits play.
    #[serde(with = "super::duration_millis", rename = "lead_time_ms")]
    pub lead_time: Duration,

    /// Directory of audio files served under the `/audio/` prefix
    pub audio_dir: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4600".to_string(),
            master_secret: String::new(),
            lead_time: Duration::from_millis(2000),
            audio_dir: PathBuf::from("audio"),
        }
    }
}

impl RelayConfig {
    /// Lead time in milliseconds, as stamped into playback commands
    pub fn lead_time_millis(&self) -> u64 {
        self.lead_time.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lead_time_is_two_seconds() {
        let config = RelayConfig::default();
        assert_eq!(config.lead_time_millis(), 2000);
    }

    #[test]
    fn test_lead_time_parses_from_millis() {
        let config: RelayConfig = toml::from_str("lead_time_ms = 1500").unwrap();
        assert_eq!(config.lead_time, Duration::from_millis(1500));
    }
}
