//! Time utilities for ensemble
//!
//! The relay stamps every time-sync echo and playback target with its
//! own wall clock in milliseconds; clients translate those stamps into
//! local deadlines with their estimated offset. Timestamps cross the
//! wire as JSON numbers, so helpers here deal in `u64` milliseconds and
//! callers widen to `f64` at the protocol boundary.

use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current Unix timestamp in milliseconds.
///
/// # Panics
/// Panics if the system time is before the Unix epoch (1970-01-01),
/// which would indicate a severely misconfigured system.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_millis() as u64
}

/// Calculate elapsed time in milliseconds since a given timestamp.
///
/// Returns 0 if the given time is in the future.
pub fn elapsed_millis(since: u64) -> u64 {
    current_time_millis().saturating_sub(since)
}

/// Source of coordinator wall-clock readings.
///
/// The relay's coordinator takes its clock through this trait so that
/// scheduling decisions (playback target times, time-sync stamps) are
/// deterministic under test.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// The real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        current_time_millis()
    }
}
