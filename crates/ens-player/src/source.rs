//! Track retrieval
//!
//! Assigned tracks are fetched from the relay's `/audio/` prefix by
//! name. Behind a trait so session tests can feed bytes directly.

use async_trait::async_trait;
use url::Url;

use crate::error::PlayerError;

/// Source of raw track bytes
#[async_trait]
pub trait TrackSource: Send {
    async fn fetch(&self, track_name: &str) -> Result<Vec<u8>, PlayerError>;
}

/// Fetches tracks over HTTP from the relay
pub struct HttpTrackSource {
    base: Url,
    http: reqwest::Client,
}

impl HttpTrackSource {
    /// `server_url` is the relay's base HTTP URL; tracks resolve under
    /// its `/audio/` prefix.
    pub fn new(server_url: &str) -> Result<Self, PlayerError> {
        let base = Url::parse(server_url)?.join("audio/")?;
        Ok(Self {
            base,
            http: reqwest::Client::new(),
        })
    }

    /// Full URL a track name resolves to
    pub fn track_url(&self, track_name: &str) -> Result<Url, PlayerError> {
        Ok(self.base.join(track_name)?)
    }
}

#[async_trait]
impl TrackSource for HttpTrackSource {
    async fn fetch(&self, track_name: &str) -> Result<Vec<u8>, PlayerError> {
        let url = self.track_url(track_name)?;
        tracing::debug!(%url, "Fetching track");
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// In-memory source for tests and demos
#[derive(Debug, Default)]
pub struct MemoryTrackSource {
    tracks: std::collections::HashMap<String, Vec<u8>>,
}

impl MemoryTrackSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.tracks.insert(name.into(), bytes);
    }
}

#[async_trait]
impl TrackSource for MemoryTrackSource {
    async fn fetch(&self, track_name: &str) -> Result<Vec<u8>, PlayerError> {
        self.tracks
            .get(track_name)
            .cloned()
            .ok_or_else(|| PlayerError::Engine(format!("unknown track: {}", track_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_url_joins_under_audio_prefix() {
        let source = HttpTrackSource::new("http://relay:4600").unwrap();
        assert_eq!(
            source.track_url("loop-04.mp3").unwrap().as_str(),
            "http://relay:4600/audio/loop-04.mp3"
        );
    }

    #[test]
    fn test_invalid_server_url_is_rejected() {
        assert!(HttpTrackSource::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_memory_source_serves_inserted_tracks() {
        let mut source = MemoryTrackSource::new();
        source.insert("a.mp3", vec![1, 2, 3]);

        assert_eq!(source.fetch("a.mp3").await.unwrap(), vec![1, 2, 3]);
        assert!(source.fetch("b.mp3").await.is_err());
    }
}
