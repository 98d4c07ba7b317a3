//! Tunable protocol constants and router-wide configuration.
//!
//! The defaults below are the values named in the base spec's "Constants"
//! table (§4.7). [`RouterConfig`] collects them into a single struct so a
//! caller can override any one of them (e.g. a faster beacon interval for a
//! bench harness) without touching router internals.

use std::time::Duration;

/// How often a participating node emits an RSSI beacon.
pub const BEACON_INTERVAL: Duration = Duration::from_millis(10_000);

/// How long a routing table entry stays valid without being refreshed.
pub const ROUTE_EXPIRY: Duration = Duration::from_millis(30_000);

/// How long a neighbor table entry stays valid without a beacon.
pub const NEIGHBOR_TIMEOUT: Duration = Duration::from_millis(5_000);

/// How long a seen frame/broadcast id is remembered for duplicate detection.
pub const DUP_RETENTION: Duration = Duration::from_millis(30_000);

/// Minimum RSSI a link must clear to be considered for rebroadcast/route use.
pub const RSSI_THRESHOLD: i8 = -80;

/// Sentinel RSSI value for "no measurement on file".
pub const RSSI_UNKNOWN: i8 = -120;

/// Transport port carrying RREQ/RREP control traffic.
pub const AODV_PORT: u16 = crate::frame::AODV_PORT;

/// Transport port carrying periodic RSSI beacons.
pub const RSSI_BEACON_PORT: u16 = crate::frame::RSSI_BEACON_PORT;

/// Hop count ceiling beyond which an RREQ is no longer rebroadcast.
pub const MAX_HOP_COUNT: u16 = 8;

/// Router-wide tunables, collected so they can be overridden together.
///
/// `Default` reproduces the constants above; construct with `..Default::default()`
/// to override a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    pub beacon_interval: Duration,
    pub route_expiry: Duration,
    pub neighbor_timeout: Duration,
    pub dup_retention: Duration,
    pub rssi_threshold: i8,
    pub max_hop_count: u16,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            beacon_interval: BEACON_INTERVAL,
            route_expiry: ROUTE_EXPIRY,
            neighbor_timeout: NEIGHBOR_TIMEOUT,
            dup_retention: DUP_RETENTION,
            rssi_threshold: RSSI_THRESHOLD,
            max_hop_count: MAX_HOP_COUNT,
        }
    }
}
