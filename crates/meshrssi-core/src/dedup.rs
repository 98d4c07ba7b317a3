//! Duplicate-suppression caches.
//!
//! Two independent caches are kept: one over raw frame ids (so the same
//! frame is never processed twice, regardless of port) and one over
//! `(source, broadcast_id)` pairs (so a flooded RREQ is only rebroadcast
//! once per origination, even though each hop gives it a fresh frame id).
//! Both evict by age rather than by count, per the base spec.

use crate::node_id::NodeId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Remembers frame ids recently seen, to drop exact duplicates.
#[derive(Debug)]
pub struct SeenFrameIds {
    seen: HashMap<u32, Instant>,
    retention: Duration,
}

impl SeenFrameIds {
    pub fn new(retention: Duration) -> Self {
        SeenFrameIds {
            seen: HashMap::new(),
            retention,
        }
    }

    /// Record `id` as seen at `now`. Returns `true` if this id had already
    /// been recorded within the retention window (i.e. this is a duplicate).
    pub fn check_and_insert(&mut self, id: u32, now: Instant) -> bool {
        self.evict(now);
        self.seen.insert(id, now).is_some()
    }

    /// Whether `id` is currently within the retention window, without
    /// recording it.
    pub fn contains(&self, id: u32) -> bool {
        self.seen.contains_key(&id)
    }

    fn evict(&mut self, now: Instant) {
        let retention = self.retention;
        self.seen
            .retain(|_, seen_at| now.duration_since(*seen_at) < retention);
    }
}

/// Remembers `(source, broadcast_id)` pairs, to suppress re-flooding of an
/// RREQ that has already been handled regardless of the hop it arrives from.
#[derive(Debug)]
pub struct SeenBroadcastIds {
    seen: HashMap<(NodeId, u32), Instant>,
    retention: Duration,
}

impl SeenBroadcastIds {
    pub fn new(retention: Duration) -> Self {
        SeenBroadcastIds {
            seen: HashMap::new(),
            retention,
        }
    }

    pub fn check_and_insert(&mut self, source: NodeId, broadcast_id: u32, now: Instant) -> bool {
        self.evict(now);
        self.seen.insert((source, broadcast_id), now).is_some()
    }

    pub fn contains(&self, source: NodeId, broadcast_id: u32) -> bool {
        self.seen.contains_key(&(source, broadcast_id))
    }

    fn evict(&mut self, now: Instant) {
        let retention = self.retention;
        self.seen
            .retain(|_, seen_at| now.duration_since(*seen_at) < retention);
    }
}
