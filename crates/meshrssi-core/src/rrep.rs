//! Route Reply handling.
//!
//! An RREP always carries the original querier in its `destination` field
//! and the node that most recently forwarded it in `source`; each hop that
//! relays it installs a route back toward that querier keyed by
//! `destination`, then (if it is not itself the querier) re-stamps `source`
//! as itself and continues the reply toward whichever neighbor handed it the
//! matching RREQ.

use crate::codec::RrepPacket;
use crate::frame::Frame;
use crate::node_id::NodeId;
use crate::routing::{RouteEntry, RoutingTable};
use crate::rreq::ReverseHopCache;
use std::time::Instant;

/// What the router should do after installing the route carried by an RREP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RrepOutcome {
    /// This node is the original querier; the reply has arrived.
    Delivered,
    /// Relay the reply on toward the querier via `to`, with the envelope
    /// hop_limit already decremented once.
    Relay { rrep: RrepPacket, to: NodeId, hop_limit: u8 },
    /// No reverse hop is on file for this reply's `route_request_id`; it
    /// cannot be relayed further and is dropped.
    Unroutable,
    /// A reverse hop is on file but the envelope's `hop_limit` is already
    /// zero; the reply is dropped rather than relayed.
    Expired,
}

/// Install the route carried by `rrep` and decide whether/how to relay it.
pub fn handle_rrep(
    local_node_id: NodeId,
    local_sequence_number: u32,
    rrep: RrepPacket,
    frame: &Frame,
    routes: &mut RoutingTable,
    reverse_hops: &ReverseHopCache,
    now: Instant,
) -> RrepOutcome {
    let candidate = RouteEntry {
        next_hop: rrep.source,
        hop_count: rrep.hop_count + 1,
        rssi: rrep.rssi,
        sequence_number: rrep.sequence_number,
        last_updated: now,
    };
    routes.update_if_better(rrep.destination, candidate, now);

    if rrep.destination == local_node_id {
        return RrepOutcome::Delivered;
    }

    let next_hop = match reverse_hops.lookup(rrep.route_request_id, now) {
        Some(next_hop) => next_hop,
        None => return RrepOutcome::Unroutable,
    };

    if frame.hop_limit == 0 {
        return RrepOutcome::Expired;
    }

    RrepOutcome::Relay {
        // The relayed packet's own `hop_count` field is decremented, floored
        // at zero — distinct from (and the inverse of) the RouteEntry's
        // hop_count above, which tracks path length and grows with each hop.
        rrep: RrepPacket {
            source: local_node_id,
            destination: rrep.destination,
            route_request_id: rrep.route_request_id,
            hop_count: rrep.hop_count.saturating_sub(1),
            rssi: frame.rx_rssi,
            sequence_number: local_sequence_number,
        },
        to: next_hop,
        hop_limit: frame.hop_limit - 1,
    }
}
