//! The collaborator seam between the router and the underlying radio/bus.
//!
//! Kept deliberately narrow: the router never asks a transport what role it
//! is playing. `Role` is passed to [`crate::router::Router::new`] directly,
//! per the base spec's Design Notes, so a transport implementation never
//! needs to know or care how its frames are being used.

use crate::frame::Frame;
use crate::node_id::NodeId;

/// How a node participates in the mesh.
///
/// Only [`Role::Router`], [`Role::RouterClient`] and [`Role::Repeater`]
/// rebroadcast RREQs on behalf of others; the rest ("leaf" roles) originate
/// and receive traffic but never forward it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    ClientMute,
    Router,
    RouterClient,
    Repeater,
}

impl Role {
    /// Whether nodes with this role rebroadcast RREQs they are not the
    /// destination of.
    pub fn participates_in_rebroadcast(&self) -> bool {
        matches!(self, Role::Router | Role::RouterClient | Role::Repeater)
    }
}

/// What the router needs from the underlying packet bus.
///
/// Implementors carry their own notion of "send failed" as `Error`; the
/// router never inspects it beyond propagating it back to the caller of
/// `Router::submit_outgoing`.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Hand a frame to the bus for transmission.
    fn send(&mut self, frame: Frame) -> Result<(), Self::Error>;

    /// Cancel a previously scheduled opportunistic rebroadcast of the frame
    /// identified by `(from, id)`, if the bus has not already sent it. A
    /// no-op if it already went out.
    fn cancel_pending(&mut self, from: NodeId, id: u32);

    /// The transport's current estimate of its own receive signal strength
    /// (used to populate outgoing beacons).
    fn local_rssi(&self) -> i8;

    /// This node's own identity.
    fn local_node_id(&self) -> NodeId;
}
