//! Node identity
//!
//! A `NodeId` is an opaque 32-bit identifier for a mesh node. Two values are
//! reserved: `NONE` (no node / invalid) and `BROADCAST` (all nodes).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque node identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Reserved "no node" value.
    pub const NONE: NodeId = NodeId(0);

    /// Reserved broadcast address.
    pub const BROADCAST: NodeId = NodeId(0xFFFF_FFFF);

    /// Wrap a raw `u32` as a `NodeId`.
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    /// The raw `u32` value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Whether this is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Whether this is the reserved "none" value.
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        NodeId(raw)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:08x})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
