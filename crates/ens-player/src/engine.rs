//! Audio engine seam
//!
//! Playback itself sits behind a trait so the session logic can be
//! exercised without an audio device. The shipped `SilentEngine`
//! accepts loads and schedules without producing sound; a real output
//! backend implements the same three operations.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PlayerError;

/// Opaque handle to a decoded track held by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferHandle(pub u64);

/// Playback backend
#[async_trait]
pub trait AudioEngine: Send {
    /// Decode raw track bytes into a playable buffer
    async fn load(&mut self, bytes: Vec<u8>) -> Result<BufferHandle, PlayerError>;

    /// Start the buffer after the given local delay
    async fn play_after(&mut self, buffer: BufferHandle, delay: Duration)
        -> Result<(), PlayerError>;

    /// Stop playback immediately and cancel anything scheduled
    async fn stop(&mut self) -> Result<(), PlayerError>;
}

/// A playback request recorded by [`SilentEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledPlay {
    pub buffer: BufferHandle,
    pub delay: Duration,
}

/// Engine that swallows audio. Used as the default backend and as the
/// test double for session logic.
#[derive(Debug, Default)]
pub struct SilentEngine {
    next_handle: u64,
    loaded: Vec<usize>,
    scheduled: Vec<ScheduledPlay>,
    stops: usize,
}

impl SilentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Playback requests in the order they were scheduled
    pub fn scheduled(&self) -> &[ScheduledPlay] {
        &self.scheduled
    }

    /// Byte lengths of every buffer loaded so far
    pub fn loaded_sizes(&self) -> &[usize] {
        &self.loaded
    }

    /// Number of stop requests received
    pub fn stops(&self) -> usize {
        self.stops
    }
}

#[async_trait]
impl AudioEngine for SilentEngine {
    async fn load(&mut self, bytes: Vec<u8>) -> Result<BufferHandle, PlayerError> {
        let handle = BufferHandle(self.next_handle);
        self.next_handle += 1;
        self.loaded.push(bytes.len());
        tracing::debug!(handle = handle.0, bytes = bytes.len(), "Loaded track buffer");
        Ok(handle)
    }

    async fn play_after(
        &mut self,
        buffer: BufferHandle,
        delay: Duration,
    ) -> Result<(), PlayerError> {
        tracing::info!(handle = buffer.0, delay_ms = delay.as_millis() as u64, "Playback scheduled");
        self.scheduled.push(ScheduledPlay { buffer, delay });
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), PlayerError> {
        tracing::info!("Playback stopped");
        self.stops += 1;
        Ok(())
    }
}
