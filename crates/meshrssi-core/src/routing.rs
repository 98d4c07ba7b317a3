//! Routing table with an RSSI-biased metric.
//!
//! A route is preferred over another first by stronger RSSI, and only on an
//! RSSI tie by fewer hops — the inverse priority of classic hop-count-only
//! AODV, per the base spec's redesign of the route selection metric.

use crate::node_id::NodeId;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A single routing table entry: how to reach a destination, and how good
/// that path currently looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub next_hop: NodeId,
    pub hop_count: u16,
    pub rssi: i8,
    pub sequence_number: u32,
    pub last_updated: Instant,
}

impl RouteEntry {
    /// Ordering used to pick the better of two routes to the same
    /// destination: higher RSSI wins; ties broken by fewer hops.
    fn metric_cmp(&self, other: &Self) -> Ordering {
        self.rssi
            .cmp(&other.rssi)
            .then_with(|| other.hop_count.cmp(&self.hop_count))
    }

    /// Whether `self` is strictly better than `other` by the RSSI-biased metric.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.metric_cmp(other) == Ordering::Greater
    }
}

/// Destination-keyed routing table, expiring entries that go unrefreshed.
#[derive(Debug)]
pub struct RoutingTable {
    routes: HashMap<NodeId, RouteEntry>,
    expiry: Duration,
}

impl RoutingTable {
    pub fn new(expiry: Duration) -> Self {
        RoutingTable {
            routes: HashMap::new(),
            expiry,
        }
    }

    /// The live route to `destination`, if one is on file and not expired.
    pub fn get(&self, destination: NodeId, now: Instant) -> Option<RouteEntry> {
        self.routes.get(&destination).copied().filter(|route| {
            now.duration_since(route.last_updated) < self.expiry
        })
    }

    /// Install `candidate` for `destination` if there is no live route yet, or
    /// if `candidate` is strictly better than the one on file. Returns `true`
    /// if the table was changed.
    pub fn update_if_better(&mut self, destination: NodeId, candidate: RouteEntry, now: Instant) -> bool {
        match self.get(destination, now) {
            Some(existing) if !candidate.is_better_than(&existing) => false,
            _ => {
                self.routes.insert(destination, candidate);
                true
            }
        }
    }

    /// Unconditionally install or replace the route to `destination`.
    pub fn insert(&mut self, destination: NodeId, route: RouteEntry) {
        self.routes.insert(destination, route);
    }

    /// Drop routes that have not been refreshed within the expiry window.
    pub fn prune_expired(&mut self, now: Instant) {
        let expiry = self.expiry;
        self.routes
            .retain(|_, route| now.duration_since(route.last_updated) < expiry);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
