//! Playback start scheduling
//!
//! The relay's play command carries one absolute target time on the
//! relay's clock. Each player translates it locally and waits out the
//! remaining delay. A target that has already elapsed is discarded
//! outright: starting late (or mid-track) would be worse for the group
//! than one silent device.

use std::time::Duration;

use crate::sync::ClockOffset;

/// Remaining local delay until the shared target time, or `None` if
/// the target has already passed.
pub fn start_delay(
    target_server_time: f64,
    offset: &ClockOffset,
    local_now: f64,
) -> Option<Duration> {
    let local_target = offset.server_to_local(target_server_time);
    let delay = local_target - local_now;
    if delay < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(delay / 1000.0))
}
