//! Route Request handling.
//!
//! A node receiving an RREQ either answers it directly (it is the
//! destination, or already holds a fresh route to one), or rebroadcasts it
//! one hop further out. In both cases it remembers which neighbor handed it
//! the request, keyed by `route_request_id`, so that a matching RREP can
//! later be relayed back along the same path without needing a persistent
//! reverse route table entry of its own.

use crate::codec::RreqPacket;
use crate::dedup::SeenBroadcastIds;
use crate::frame::Frame;
use crate::neighbor::NeighborTable;
use crate::node_id::NodeId;
use crate::routing::{RouteEntry, RoutingTable};
use crate::transport::Role;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks the newest sequence number accepted from each RREQ originator.
///
/// Per-originator freshness (§4.4 step 1) is distinct from the broadcast-id
/// dedup caches in [`crate::dedup`]: it never forgets an entry by age, since
/// "monotonically non-decreasing" is a lifetime guarantee, not a
/// within-a-window one.
#[derive(Debug, Default)]
pub struct SequenceTable {
    newest: HashMap<NodeId, u32>,
}

impl SequenceTable {
    pub fn new() -> Self {
        SequenceTable { newest: HashMap::new() }
    }

    /// If `sequence_number` is newer than (or no entry exists for) `source`,
    /// records it and returns `true`. Otherwise leaves the table untouched
    /// and returns `false` — the caller should drop the RREQ without any
    /// further side effects.
    pub fn check_and_update(&mut self, source: NodeId, sequence_number: u32) -> bool {
        match self.newest.get(&source) {
            Some(&stored) if sequence_number <= stored => false,
            _ => {
                self.newest.insert(source, sequence_number);
                true
            }
        }
    }
}

/// What the router should do in response to an inbound RREQ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RreqOutcome {
    /// Answer directly: unicast this RREP to `to` (the node the RREQ arrived from).
    Reply { rrep: crate::codec::RrepPacket, to: NodeId },
    /// Flood the request one hop further.
    Rebroadcast(RreqPacket),
    /// Neither a reply nor a rebroadcast applies.
    Drop,
}

/// Maps an in-flight `route_request_id` to the neighbor that forwarded it to
/// us, so a later RREP for that id can be relayed back the way it came.
#[derive(Debug)]
pub struct ReverseHopCache {
    hops: HashMap<u32, (NodeId, Instant)>,
    retention: Duration,
}

impl ReverseHopCache {
    pub fn new(retention: Duration) -> Self {
        ReverseHopCache {
            hops: HashMap::new(),
            retention,
        }
    }

    pub fn record(&mut self, route_request_id: u32, previous_hop: NodeId, now: Instant) {
        self.evict(now);
        self.hops.insert(route_request_id, (previous_hop, now));
    }

    pub fn lookup(&self, route_request_id: u32, now: Instant) -> Option<NodeId> {
        self.hops.get(&route_request_id).and_then(|(hop, seen_at)| {
            if now.duration_since(*seen_at) < self.retention {
                Some(*hop)
            } else {
                None
            }
        })
    }

    fn evict(&mut self, now: Instant) {
        let retention = self.retention;
        self.hops.retain(|_, (_, seen_at)| now.duration_since(*seen_at) < retention);
    }
}

/// Process an RREQ that has already passed sequence-freshness gating
/// ([`SequenceTable::check_and_update`], checked by the caller before this
/// runs so a stale retry never reaches here).
///
/// `frame` is the envelope the RREQ arrived in; `rreq` is its decoded
/// payload. Always records the reverse hop for `rreq.route_request_id`, then
/// picks a terminal reply, a known-route reply, or a rebroadcast — the
/// `broadcast_id` flood-dedup check only applies to the rebroadcast path, so
/// a terminal/known-route answer is still given even if this exact flood
/// already passed through here once.
#[allow(clippy::too_many_arguments)]
pub fn handle_rreq(
    local_node_id: NodeId,
    local_sequence_number: u32,
    role: Role,
    rssi_threshold: i8,
    max_hop_count: u16,
    rreq: RreqPacket,
    frame: &Frame,
    neighbors: &NeighborTable,
    routes: &mut RoutingTable,
    reverse_hops: &mut ReverseHopCache,
    seen_broadcasts: &mut SeenBroadcastIds,
    now: Instant,
) -> RreqOutcome {
    reverse_hops.record(rreq.route_request_id, frame.from, now);

    if rreq.destination == local_node_id {
        let rrep = crate::codec::RrepPacket {
            source: local_node_id,
            destination: rreq.source,
            route_request_id: rreq.route_request_id,
            hop_count: 0,
            rssi: neighbors.rssi_for(rreq.source, now),
            sequence_number: local_sequence_number,
        };
        return RreqOutcome::Reply { rrep, to: frame.from };
    }

    if let Some(route) = routes.get(rreq.destination, now) {
        // The RREQ just arrived over some link to us; treat that link's RSSI
        // as a candidate metric for the route we already hold and keep
        // whichever is stronger, without disturbing `next_hop` — we are
        // refreshing our own record of the destination, not rerouting
        // through the node that sent us this RREQ.
        let candidate = RouteEntry {
            next_hop: route.next_hop,
            hop_count: rreq.hop_count + 1,
            rssi: frame.rx_rssi,
            sequence_number: route.sequence_number,
            last_updated: now,
        };
        routes.update_if_better(rreq.destination, candidate, now);
        let route = routes
            .get(rreq.destination, now)
            .expect("just looked up or refreshed above");
        let rrep = crate::codec::RrepPacket {
            source: local_node_id,
            destination: rreq.source,
            route_request_id: rreq.route_request_id,
            hop_count: route.hop_count,
            rssi: route.rssi,
            sequence_number: route.sequence_number,
        };
        return RreqOutcome::Reply { rrep, to: frame.from };
    }

    if !role.participates_in_rebroadcast() {
        return RreqOutcome::Drop;
    }

    if seen_broadcasts.check_and_insert(rreq.source, rreq.broadcast_id, now) {
        return RreqOutcome::Drop;
    }

    let hop_count = rreq.hop_count + 1;
    let rssi = frame.rx_rssi;

    if frame.hop_limit == 0 || rssi < rssi_threshold || hop_count >= max_hop_count {
        return RreqOutcome::Drop;
    }

    RreqOutcome::Rebroadcast(RreqPacket {
        source: rreq.source,
        destination: rreq.destination,
        broadcast_id: rreq.broadcast_id,
        route_request_id: rreq.route_request_id,
        hop_count,
        rssi,
        sequence_number: rreq.sequence_number,
    })
}

/// Install/refresh the reverse route toward `rreq.source` learned from
/// observing this RREQ arrive via `frame.from`. Kept separate from
/// [`handle_rreq`] so callers can decide independently whether to maintain it.
pub fn install_reverse_route(
    rreq: &RreqPacket,
    frame: &Frame,
    routes: &mut RoutingTable,
    now: Instant,
) {
    let candidate = RouteEntry {
        next_hop: frame.from,
        hop_count: rreq.hop_count + 1,
        rssi: frame.rx_rssi,
        sequence_number: rreq.sequence_number,
        last_updated: now,
    };
    routes.update_if_better(rreq.source, candidate, now);
}
