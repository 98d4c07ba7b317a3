//! Periodic RSSI beacon scheduler.
//!
//! Driven by the router's own `tick`, not a timer thread: the router calls
//! [`BeaconScheduler::is_due`] on every cooperative tick and it reports
//! whether a beacon is due.

use std::time::{Duration, Instant};

/// Tracks when the next outgoing beacon is due.
#[derive(Debug)]
pub struct BeaconScheduler {
    interval: Duration,
    last_sent: Option<Instant>,
}

impl BeaconScheduler {
    pub fn new(interval: Duration) -> Self {
        BeaconScheduler {
            interval,
            last_sent: None,
        }
    }

    /// Whether a beacon should be emitted right now. Does not itself mark a
    /// beacon as sent — call [`BeaconScheduler::mark_sent`] once it actually goes out.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_sent {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        }
    }

    /// Record that a beacon was just sent at `now`.
    pub fn mark_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }
}
