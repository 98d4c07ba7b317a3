//! The router facade.
//!
//! [`Router`] composes the neighbor table, routing table, duplicate caches
//! and beacon scheduler over a single [`Transport`], the way
//! [`crate`]'s sibling facades compose a PHY over a protocol state machine.
//! Every public method runs to completion synchronously — there is no
//! background task and no blocking I/O; a caller's `tick` or `filter_incoming`
//! call does all its work (including any resulting sends) before returning.

use crate::beacon::BeaconScheduler;
use crate::codec::{self, ControlFrame, RrepPacket, RreqPacket};
use crate::config::RouterConfig;
use crate::dedup::{SeenBroadcastIds, SeenFrameIds};
use crate::error::RouterError;
use crate::frame::{Frame, AODV_PORT, RSSI_BEACON_PORT};
use crate::neighbor::NeighborTable;
use crate::node_id::NodeId;
use crate::routing::RoutingTable;
use crate::rrep::{self, RrepOutcome};
use crate::rreq::{self, ReverseHopCache, RreqOutcome, SequenceTable};
use crate::transport::{Role, Transport};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Default hop limit stamped on frames the router itself originates.
const DEFAULT_HOP_LIMIT: u8 = 8;

/// The RSSI-weighted reactive AODV router.
pub struct Router<T: Transport> {
    transport: T,
    role: Role,
    config: RouterConfig,

    neighbors: NeighborTable,
    routes: RoutingTable,
    seen_frames: SeenFrameIds,
    seen_broadcasts: SeenBroadcastIds,
    reverse_hops: ReverseHopCache,
    sequence_numbers: SequenceTable,
    beacons: BeaconScheduler,

    sequence_number: u32,
    next_broadcast_id: u32,
    next_route_request_id: u32,
    next_frame_id: u32,
}

impl<T: Transport> Router<T> {
    pub fn new(transport: T, role: Role, config: RouterConfig) -> Self {
        Router {
            neighbors: NeighborTable::new(config.neighbor_timeout),
            routes: RoutingTable::new(config.route_expiry),
            seen_frames: SeenFrameIds::new(config.dup_retention),
            seen_broadcasts: SeenBroadcastIds::new(config.dup_retention),
            reverse_hops: ReverseHopCache::new(config.dup_retention),
            sequence_numbers: SequenceTable::new(),
            beacons: BeaconScheduler::new(config.beacon_interval),
            transport,
            role,
            config,
            sequence_number: 0,
            next_broadcast_id: 0,
            next_route_request_id: 0,
            next_frame_id: 0,
        }
    }

    fn local_node_id(&self) -> NodeId {
        self.transport.local_node_id()
    }

    fn allocate_frame_id(&mut self) -> u32 {
        self.next_frame_id = self.next_frame_id.wrapping_add(1);
        self.next_frame_id
    }

    /// Whether a route to `destination` is currently on file.
    pub fn has_route(&self, destination: NodeId, now: Instant) -> bool {
        self.routes.get(destination, now).is_some()
    }

    /// Periodic maintenance: emit a beacon if one is due, and age out expired
    /// table entries. Must be called regularly by the host application —
    /// the router has no timer of its own.
    pub fn tick(&mut self, now: Instant) -> Result<(), T::Error> {
        self.neighbors.prune_stale(now);
        self.routes.prune_expired(now);

        if self.beacons.is_due(now) {
            let payload = codec::encode_beacon(self.transport.local_rssi()).to_vec();
            let frame = Frame {
                from: self.local_node_id(),
                to: NodeId::BROADCAST,
                id: self.allocate_frame_id(),
                hop_limit: 1,
                port: RSSI_BEACON_PORT,
                payload,
                rx_rssi: self.transport.local_rssi(),
            };
            self.transport.send(frame)?;
            self.beacons.mark_sent(now);
        }
        Ok(())
    }

    /// Submit application data for `destination`. If a route is already
    /// known, the payload is sent immediately along it; otherwise an RREQ
    /// flood is originated to discover one and the payload is dropped (the
    /// router does not queue outbound data awaiting route discovery).
    pub fn submit_outgoing(
        &mut self,
        destination: NodeId,
        payload: Vec<u8>,
        port: u16,
        now: Instant,
    ) -> Result<(), T::Error> {
        if let Some(route) = self.routes.get(destination, now) {
            let frame = Frame {
                from: self.local_node_id(),
                to: route.next_hop,
                id: self.allocate_frame_id(),
                hop_limit: DEFAULT_HOP_LIMIT,
                port,
                payload,
                rx_rssi: self.transport.local_rssi(),
            };
            return self.transport.send(frame);
        }

        debug!(?destination, "no route on file, originating route discovery");
        self.originate_route_request(destination, now)
    }

    /// Originate a fresh RREQ flood for `destination`.
    pub fn originate_route_request(&mut self, destination: NodeId, now: Instant) -> Result<(), T::Error> {
        self.sequence_number = self.sequence_number.wrapping_add(1);
        self.next_broadcast_id = self.next_broadcast_id.wrapping_add(1);
        self.next_route_request_id = self.next_route_request_id.wrapping_add(1);

        let rreq = RreqPacket {
            source: self.local_node_id(),
            destination,
            broadcast_id: self.next_broadcast_id,
            route_request_id: self.next_route_request_id,
            hop_count: 0,
            rssi: self.transport.local_rssi(),
            sequence_number: self.sequence_number,
        };
        self.reverse_hops
            .record(rreq.route_request_id, self.local_node_id(), now);
        self.send_rreq(&rreq)
    }

    fn send_rreq(&mut self, rreq: &RreqPacket) -> Result<(), T::Error> {
        let frame = Frame {
            from: self.local_node_id(),
            to: NodeId::BROADCAST,
            id: self.allocate_frame_id(),
            hop_limit: DEFAULT_HOP_LIMIT,
            port: AODV_PORT,
            payload: rreq.to_bytes().to_vec(),
            rx_rssi: self.transport.local_rssi(),
        };
        self.transport.send(frame)
    }

    /// Build and send an internally-synthesized frame (an RREP reply/relay,
    /// or a rebroadcast RREQ), logging and discarding a transport failure
    /// rather than propagating it. Per §7, only `submit_outgoing`'s own
    /// `send` call surfaces `TransportError` to a caller — an emission
    /// triggered purely as a side effect of processing an inbound frame logs
    /// and discards on failure instead.
    fn emit(&mut self, frame: Frame) {
        if let Err(err) = self.transport.send(frame) {
            warn!(%err, "internal emission failed, discarding");
        }
    }

    fn emit_rrep(&mut self, rrep: &RrepPacket, to: NodeId, hop_limit: u8) {
        let frame = Frame {
            from: self.local_node_id(),
            to,
            id: self.allocate_frame_id(),
            hop_limit,
            port: AODV_PORT,
            payload: rrep.to_bytes().to_vec(),
            rx_rssi: self.transport.local_rssi(),
        };
        self.emit(frame);
    }

    /// Filter and process an inbound frame, performing frame-id duplicate
    /// suppression first. Returns `true` if the frame must be dropped by
    /// upper layers — a confirmed duplicate, a beacon (never propagated), or
    /// an in-TTL AODV control frame (always fully absorbed here) — and
    /// `false` if the router has no opinion on the frame and it should fall
    /// through to the transport's own flood/forwarding policy.
    pub fn filter_incoming(&mut self, frame: Frame, now: Instant) -> bool {
        if self.seen_frames.check_and_insert(frame.id, now) {
            trace!(frame_id = frame.id, "dropping duplicate frame");
            if !self.role.participates_in_rebroadcast() {
                self.transport.cancel_pending(frame.from, frame.id);
            }
            return true;
        }
        self.dispatch(frame, now)
    }

    /// Process an inbound frame without the frame-id short-circuit — for
    /// transports that already perform their own duplicate suppression
    /// upstream. The frame id is still recorded so later duplicates via
    /// [`Router::filter_incoming`] are caught.
    pub fn ingest_incoming(&mut self, frame: Frame, now: Instant) {
        self.seen_frames.check_and_insert(frame.id, now);
        self.dispatch(frame, now);
    }

    /// Dispatch by port. Returns whether the frame was fully handled (and
    /// thus must not surface to an upper layer).
    fn dispatch(&mut self, frame: Frame, now: Instant) -> bool {
        match frame.port {
            AODV_PORT if frame.hop_limit > 0 => {
                self.dispatch_control(frame, now);
                true
            }
            AODV_PORT => {
                trace!(
                    frame_id = frame.id,
                    error = %RouterError::TtlExpired,
                    "dropping control frame with expired hop_limit"
                );
                false
            }
            RSSI_BEACON_PORT => {
                self.dispatch_beacon(&frame, now);
                true
            }
            other => {
                trace!(port = other, "frame on unrecognized port, passing through");
                false
            }
        }
    }

    fn dispatch_beacon(&mut self, frame: &Frame, now: Instant) {
        match codec::decode_beacon(&frame.payload) {
            Ok(rssi) => self.neighbors.observe(frame.from, rssi, now),
            Err(err) => warn!(?err, "malformed beacon payload"),
        }
    }

    fn dispatch_control(&mut self, frame: Frame, now: Instant) {
        let control = match ControlFrame::parse(&frame.payload) {
            Ok(control) => control,
            Err(err) => {
                warn!(?err, "malformed control payload");
                return;
            }
        };

        match control {
            ControlFrame::Rreq(rreq) => self.dispatch_rreq(rreq, frame, now),
            ControlFrame::Rrep(rrep) => self.dispatch_rrep(rrep, frame, now),
        }
    }

    fn dispatch_rreq(&mut self, rreq: RreqPacket, frame: Frame, now: Instant) {
        if !self.sequence_numbers.check_and_update(rreq.source, rreq.sequence_number) {
            trace!(
                source = ?rreq.source,
                sequence_number = rreq.sequence_number,
                error = %RouterError::StaleSequence,
                "dropping rreq"
            );
            return;
        }

        rreq::install_reverse_route(&rreq, &frame, &mut self.routes, now);

        let outcome = rreq::handle_rreq(
            self.local_node_id(),
            self.sequence_number,
            self.role,
            self.config.rssi_threshold,
            self.config.max_hop_count,
            rreq,
            &frame,
            &self.neighbors,
            &mut self.routes,
            &mut self.reverse_hops,
            &mut self.seen_broadcasts,
            now,
        );
        self.routes.prune_expired(now);

        match outcome {
            RreqOutcome::Reply { rrep, to } => self.emit_rrep(&rrep, to, DEFAULT_HOP_LIMIT),
            RreqOutcome::Rebroadcast(rreq) => {
                // `handle_rreq` already gated on the envelope's hop_limit being
                // > 0 before deciding to rebroadcast (§4.4 step 4); it is
                // decremented exactly once here and sent on even if that
                // brings it to zero — the next hop is the one that stops.
                let mut forwarded = frame;
                forwarded.decrement_hop_limit();
                let frame_id = self.allocate_frame_id();
                let out = Frame {
                    from: self.local_node_id(),
                    to: NodeId::BROADCAST,
                    id: frame_id,
                    hop_limit: forwarded.hop_limit,
                    port: AODV_PORT,
                    payload: rreq.to_bytes().to_vec(),
                    rx_rssi: self.transport.local_rssi(),
                };
                self.emit(out);
            }
            RreqOutcome::Drop => {
                if !self.role.participates_in_rebroadcast() {
                    self.transport.cancel_pending(frame.from, frame.id);
                }
            }
        }
    }

    fn dispatch_rrep(&mut self, rrep: RrepPacket, frame: Frame, now: Instant) {
        let outcome = rrep::handle_rrep(
            self.local_node_id(),
            self.sequence_number,
            rrep,
            &frame,
            &mut self.routes,
            &self.reverse_hops,
            now,
        );

        match outcome {
            RrepOutcome::Delivered => debug!(source = ?rrep.source, "route discovery complete"),
            RrepOutcome::Relay { rrep, to, hop_limit } => self.emit_rrep(&rrep, to, hop_limit),
            RrepOutcome::Unroutable => {
                trace!(route_request_id = rrep.route_request_id, "no reverse hop, dropping rrep")
            }
            RrepOutcome::Expired => {
                trace!(route_request_id = rrep.route_request_id, "hop_limit exhausted, dropping rrep")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("stub transport error")]
    pub struct StubError;

    #[derive(Default)]
    struct Inner {
        sent: Vec<Frame>,
        cancelled: Vec<u32>,
    }

    struct StubTransport {
        node_id: NodeId,
        rssi: i8,
        inner: Rc<RefCell<Inner>>,
    }

    impl StubTransport {
        fn new(node_id: NodeId, rssi: i8) -> (Self, Rc<RefCell<Inner>>) {
            let inner = Rc::new(RefCell::new(Inner::default()));
            (
                StubTransport {
                    node_id,
                    rssi,
                    inner: inner.clone(),
                },
                inner,
            )
        }
    }

    impl Transport for StubTransport {
        type Error = StubError;

        fn send(&mut self, frame: Frame) -> Result<(), Self::Error> {
            self.inner.borrow_mut().sent.push(frame);
            Ok(())
        }

        fn cancel_pending(&mut self, _from: NodeId, frame_id: u32) {
            self.inner.borrow_mut().cancelled.push(frame_id);
        }

        fn local_rssi(&self) -> i8 {
            self.rssi
        }

        fn local_node_id(&self) -> NodeId {
            self.node_id
        }
    }

    fn router(node_id: u32, role: Role) -> (Router<StubTransport>, Rc<RefCell<Inner>>) {
        let (transport, inner) = StubTransport::new(NodeId::new(node_id), -40);
        (Router::new(transport, role, RouterConfig::default()), inner)
    }

    #[test]
    fn tick_emits_a_beacon_on_first_call_only() {
        let (mut r, inner) = router(1, Role::Router);
        let t0 = Instant::now();
        r.tick(t0).unwrap();
        assert_eq!(inner.borrow().sent.len(), 1);
        assert_eq!(inner.borrow().sent[0].port, RSSI_BEACON_PORT);

        r.tick(t0 + std::time::Duration::from_millis(1_000)).unwrap();
        assert_eq!(inner.borrow().sent.len(), 1);
    }

    #[test]
    fn inbound_beacon_populates_neighbor_table_and_is_absorbed() {
        let (mut r, _inner) = router(1, Role::Router);
        let now = Instant::now();
        let frame = Frame {
            from: NodeId::new(2),
            to: NodeId::BROADCAST,
            id: 10,
            hop_limit: 1,
            port: RSSI_BEACON_PORT,
            payload: codec::encode_beacon(-55).to_vec(),
            rx_rssi: -55,
        };
        assert!(r.filter_incoming(frame, now), "a beacon must never surface to an upper layer");
        assert_eq!(r.neighbors.rssi_for(NodeId::new(2), now), -55);
    }

    #[test]
    fn duplicate_frame_is_dropped_and_leaf_role_cancels_pending_send() {
        let (mut r, inner) = router(1, Role::Client);
        let now = Instant::now();
        let frame = Frame {
            from: NodeId::new(2),
            to: NodeId::BROADCAST,
            id: 10,
            hop_limit: 1,
            port: RSSI_BEACON_PORT,
            payload: codec::encode_beacon(-55).to_vec(),
            rx_rssi: -55,
        };
        assert!(r.filter_incoming(frame.clone(), now));
        assert!(r.filter_incoming(frame, now), "a duplicate must be reported as must-drop");
        assert_eq!(inner.borrow().cancelled, vec![10]);
    }

    #[test]
    fn duplicate_frame_is_dropped_but_forwarding_role_leaves_pending_send_alone() {
        let (mut r, inner) = router(1, Role::Router);
        let now = Instant::now();
        let frame = Frame {
            from: NodeId::new(2),
            to: NodeId::BROADCAST,
            id: 10,
            hop_limit: 1,
            port: RSSI_BEACON_PORT,
            payload: codec::encode_beacon(-55).to_vec(),
            rx_rssi: -55,
        };
        assert!(r.filter_incoming(frame.clone(), now));
        assert!(r.filter_incoming(frame, now));
        assert!(inner.borrow().cancelled.is_empty());
    }

    #[test]
    fn unrecognized_port_falls_through_instead_of_being_absorbed() {
        let (mut r, inner) = router(1, Role::Router);
        let now = Instant::now();
        let frame = Frame {
            from: NodeId::new(2),
            to: NodeId::new(1),
            id: 99,
            hop_limit: 4,
            port: 500,
            payload: vec![1, 2, 3],
            rx_rssi: -50,
        };
        assert!(
            !r.filter_incoming(frame, now),
            "plain application traffic must not be reported as must-drop"
        );
        assert!(inner.borrow().sent.is_empty());
    }

    #[test]
    fn aodv_frame_with_expired_ttl_is_neither_processed_nor_absorbed() {
        let (mut r, inner) = router(100, Role::Router);
        let now = Instant::now();
        let rreq = RreqPacket {
            source: NodeId::new(1),
            destination: NodeId::new(100),
            broadcast_id: 7,
            route_request_id: 7,
            hop_count: 2,
            rssi: -60,
            sequence_number: 5,
        };
        let frame = Frame {
            from: NodeId::new(5),
            to: NodeId::BROADCAST,
            id: 20,
            hop_limit: 0,
            port: AODV_PORT,
            payload: rreq.to_bytes().to_vec(),
            rx_rssi: -60,
        };
        assert!(!r.filter_incoming(frame, now));
        assert!(
            inner.borrow().sent.is_empty(),
            "a ttl-expired rreq must not trigger a terminal rrep even though this node is the destination"
        );
        assert!(r.routes.get(NodeId::new(1), now).is_none(), "no reverse route should be installed either");
    }

    #[test]
    fn destination_node_answers_rreq_with_rrep() {
        let (mut r, inner) = router(100, Role::Router);
        let now = Instant::now();
        let rreq = RreqPacket {
            source: NodeId::new(1),
            destination: NodeId::new(100),
            broadcast_id: 7,
            route_request_id: 7,
            hop_count: 2,
            rssi: -60,
            sequence_number: 5,
        };
        let frame = Frame {
            from: NodeId::new(5),
            to: NodeId::BROADCAST,
            id: 20,
            hop_limit: 4,
            port: AODV_PORT,
            payload: rreq.to_bytes().to_vec(),
            rx_rssi: -60,
        };
        assert!(r.filter_incoming(frame, now));

        let sent = inner.borrow();
        assert_eq!(sent.sent.len(), 1);
        assert_eq!(sent.sent[0].to, NodeId::new(5));
        let rrep = RrepPacket::from_bytes(&sent.sent[0].payload).unwrap();
        assert_eq!(rrep.hop_count, 0);
        assert_eq!(rrep.destination, NodeId::new(1));
    }

    #[test]
    fn reingesting_the_same_rreq_with_no_newer_sequence_emits_nothing() {
        let (mut r, inner) = router(100, Role::Router);
        let now = Instant::now();
        let rreq = RreqPacket {
            source: NodeId::new(1),
            destination: NodeId::new(100),
            broadcast_id: 7,
            route_request_id: 7,
            hop_count: 2,
            rssi: -60,
            sequence_number: 5,
        };
        let frame = |id: u32| Frame {
            from: NodeId::new(5),
            to: NodeId::BROADCAST,
            id,
            hop_limit: 4,
            port: AODV_PORT,
            payload: rreq.to_bytes().to_vec(),
            rx_rssi: -60,
        };
        r.filter_incoming(frame(20), now);
        assert_eq!(inner.borrow().sent.len(), 1);

        r.filter_incoming(frame(21), now);
        assert_eq!(inner.borrow().sent.len(), 1, "stale sequence must not re-trigger the rrep");
    }

    #[test]
    fn leaf_role_never_rebroadcasts_an_unanswerable_rreq() {
        let (mut r, inner) = router(2, Role::Client);
        let now = Instant::now();
        let rreq = RreqPacket {
            source: NodeId::new(1),
            destination: NodeId::new(100),
            broadcast_id: 7,
            route_request_id: 7,
            hop_count: 0,
            rssi: -60,
            sequence_number: 5,
        };
        let frame = Frame {
            from: NodeId::new(5),
            to: NodeId::BROADCAST,
            id: 20,
            hop_limit: 4,
            port: AODV_PORT,
            payload: rreq.to_bytes().to_vec(),
            rx_rssi: -60,
        };
        r.filter_incoming(frame, now);
        assert!(inner.borrow().sent.is_empty());
    }

    #[test]
    fn rrep_delivered_to_originating_querier_installs_no_relay() {
        let (mut r, inner) = router(1, Role::Router);
        let now = Instant::now();
        r.reverse_hops.record(7, NodeId::new(9), now);

        let rrep = RrepPacket {
            source: NodeId::new(50),
            destination: NodeId::new(1),
            route_request_id: 7,
            hop_count: 2,
            rssi: -65,
            sequence_number: 9,
        };
        let frame = Frame {
            from: NodeId::new(50),
            to: NodeId::new(1),
            id: 30,
            hop_limit: 4,
            port: AODV_PORT,
            payload: rrep.to_bytes().to_vec(),
            rx_rssi: -65,
        };
        r.filter_incoming(frame, now);
        assert!(inner.borrow().sent.is_empty());
        assert_eq!(r.routes.get(NodeId::new(1), now).unwrap().next_hop, NodeId::new(50));
    }

    #[test]
    fn submit_outgoing_sends_directly_over_a_known_route() {
        let (mut r, inner) = router(1, Role::Router);
        let now = Instant::now();
        r.routes.insert(
            NodeId::new(100),
            crate::routing::RouteEntry {
                next_hop: NodeId::new(5),
                hop_count: 2,
                rssi: -50,
                sequence_number: 1,
                last_updated: now,
            },
        );

        r.submit_outgoing(NodeId::new(100), vec![1, 2, 3], 500, now).unwrap();
        let sent = inner.borrow();
        assert_eq!(sent.sent.len(), 1);
        assert_eq!(sent.sent[0].to, NodeId::new(5));
        assert_eq!(sent.sent[0].payload, vec![1, 2, 3]);
    }

    #[test]
    fn submit_outgoing_without_a_route_originates_discovery() {
        let (mut r, inner) = router(1, Role::Router);
        let now = Instant::now();
        r.submit_outgoing(NodeId::new(100), vec![1, 2, 3], 500, now).unwrap();

        let sent = inner.borrow();
        assert_eq!(sent.sent.len(), 1);
        assert_eq!(sent.sent[0].to, NodeId::BROADCAST);
        assert_eq!(sent.sent[0].port, AODV_PORT);
    }
}
