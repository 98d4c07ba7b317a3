//! Transport-level frame envelope
//!
//! `Frame` is the carrier the router receives from and hands to the
//! underlying packet bus. The router treats it as opaque except for
//! `hop_limit`, which it reads and decrements on rebroadcast/forward.

use crate::node_id::NodeId;

/// Well-known transport port numbers the router dispatches on.
pub const AODV_PORT: u16 = 400;
pub const RSSI_BEACON_PORT: u16 = 300;

/// A mesh frame as delivered by / handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub from: NodeId,
    pub to: NodeId,
    pub id: u32,
    pub hop_limit: u8,
    pub port: u16,
    pub payload: Vec<u8>,
    pub rx_rssi: i8,
}

impl Frame {
    /// Decrement `hop_limit` by one, saturating at zero.
    pub fn decrement_hop_limit(&mut self) {
        self.hop_limit = self.hop_limit.saturating_sub(1);
    }
}
