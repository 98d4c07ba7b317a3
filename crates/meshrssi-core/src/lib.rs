//! RSSI-weighted reactive mesh routing.
//!
//! This crate implements a single-threaded, cooperatively-scheduled AODV-style
//! router whose route selection metric is biased by link RSSI rather than
//! hop count alone. It has no opinion about the underlying radio: callers
//! implement [`transport::Transport`] over whatever packet bus they have and
//! drive the router with inbound frames and a periodic [`router::Router::tick`].

pub mod beacon;
pub mod clock;
pub mod codec;
pub mod config;
pub mod dedup;
pub mod error;
pub mod frame;
pub mod neighbor;
pub mod node_id;
pub mod rrep;
pub mod rreq;
pub mod router;
pub mod routing;
pub mod transport;

pub use config::RouterConfig;
pub use error::{RouterError, RouterResult};
pub use frame::Frame;
pub use node_id::NodeId;
pub use router::Router;
pub use transport::{Role, Transport};
