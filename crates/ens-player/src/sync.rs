//! Clock offset estimation
//!
//! The relay never translates timestamps for anyone; each player keeps
//! its own estimate of `relay clock - local clock` and converts the
//! shared target time itself. One request/response sample gives the
//! estimate: assuming the network path is symmetric, the relay stamped
//! its reply halfway through the measured round trip.

/// Estimated difference between the relay's clock and the local clock,
/// in milliseconds. Positive means the relay's clock is ahead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockOffset {
    millis: f64,
}

impl ClockOffset {
    /// Estimate from one sync round trip: `sent_at` and `received_at`
    /// are local stamps around the exchange, `server_time` is the
    /// relay's stamp from the response.
    pub fn from_round_trip(sent_at: f64, server_time: f64, received_at: f64) -> Self {
        let rtt = received_at - sent_at;
        Self {
            millis: server_time + rtt / 2.0 - received_at,
        }
    }

    /// Offset in milliseconds
    pub fn millis(&self) -> f64 {
        self.millis
    }

    /// Translate a relay-clock timestamp into the local clock
    pub fn server_to_local(&self, server_time: f64) -> f64 {
        server_time - self.millis
    }
}
