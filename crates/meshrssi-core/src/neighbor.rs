//! One-hop neighbor table, fed by periodic RSSI beacons.

use crate::config::RSSI_UNKNOWN;
use crate::node_id::NodeId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// What is known about a single one-hop neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborEntry {
    pub rssi: i8,
    pub last_seen: Instant,
}

/// Table of directly-heard neighbors, aged out when their beacons stop.
#[derive(Debug)]
pub struct NeighborTable {
    neighbors: HashMap<NodeId, NeighborEntry>,
    timeout: Duration,
}

impl NeighborTable {
    pub fn new(timeout: Duration) -> Self {
        NeighborTable {
            neighbors: HashMap::new(),
            timeout,
        }
    }

    /// Record a beacon heard from `node` at `now` with signal `rssi`.
    pub fn observe(&mut self, node: NodeId, rssi: i8, now: Instant) {
        self.neighbors
            .insert(node, NeighborEntry { rssi, last_seen: now });
    }

    /// The RSSI on file for `node`, or [`RSSI_UNKNOWN`] if it has not beaconed
    /// recently (or ever).
    pub fn rssi_for(&self, node: NodeId, now: Instant) -> i8 {
        match self.neighbors.get(&node) {
            Some(entry) if now.duration_since(entry.last_seen) < self.timeout => entry.rssi,
            _ => RSSI_UNKNOWN,
        }
    }

    /// Whether `node` currently has a live (non-expired) neighbor entry.
    pub fn is_neighbor(&self, node: NodeId, now: Instant) -> bool {
        self.neighbors
            .get(&node)
            .is_some_and(|entry| now.duration_since(entry.last_seen) < self.timeout)
    }

    /// Drop entries whose beacon has not been refreshed within `timeout`.
    pub fn prune_stale(&mut self, now: Instant) {
        let timeout = self.timeout;
        self.neighbors
            .retain(|_, entry| now.duration_since(entry.last_seen) < timeout);
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_neighbor_reports_sentinel_rssi() {
        let table = NeighborTable::new(Duration::from_millis(5_000));
        assert_eq!(table.rssi_for(NodeId::new(1), Instant::now()), RSSI_UNKNOWN);
    }

    #[test]
    fn observed_neighbor_reports_its_rssi_until_timeout() {
        let mut table = NeighborTable::new(Duration::from_millis(5_000));
        let t0 = Instant::now();
        table.observe(NodeId::new(1), -55, t0);

        assert_eq!(table.rssi_for(NodeId::new(1), t0), -55);
        assert!(table.is_neighbor(NodeId::new(1), t0 + Duration::from_millis(4_000)));
        assert_eq!(
            table.rssi_for(NodeId::new(1), t0 + Duration::from_millis(6_000)),
            RSSI_UNKNOWN
        );
    }

    #[test]
    fn prune_stale_removes_expired_entries() {
        let mut table = NeighborTable::new(Duration::from_millis(1_000));
        let t0 = Instant::now();
        table.observe(NodeId::new(1), -60, t0);
        table.observe(NodeId::new(2), -60, t0);

        table.prune_stale(t0 + Duration::from_millis(2_000));
        assert!(table.is_empty());
    }

    #[test]
    fn a_fresher_beacon_overwrites_the_prior_reading() {
        let mut table = NeighborTable::new(Duration::from_millis(5_000));
        let t0 = Instant::now();
        table.observe(NodeId::new(1), -80, t0);
        table.observe(NodeId::new(1), -50, t0 + Duration::from_millis(100));
        assert_eq!(
            table.rssi_for(NodeId::new(1), t0 + Duration::from_millis(100)),
            -50
        );
        assert_eq!(table.len(), 1);
    }
}
