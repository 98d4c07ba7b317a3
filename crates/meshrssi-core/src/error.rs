//! Error types for the router crate.

use thiserror::Error;

/// Conditions the router can drop a frame or control message for.
///
/// These never cross the router's public API as a `Result::Err` — they are
/// logged and the triggering frame is discarded, per the router's "all
/// routing decisions are advisory" recovery policy. The one error that does
/// propagate to a caller is a transport send failure, which surfaces as the
/// transport's own associated `Error` type from `Transport::send`, not as a
/// `RouterError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Control payload shorter than its declared fixed layout.
    #[error("malformed control frame: {0}")]
    MalformedFrame(&'static str),

    /// No next hop known for a destination that needed one.
    #[error("no route to destination")]
    NoRoute,

    /// RREQ sequence number not newer than the one already on file.
    #[error("stale sequence number")]
    StaleSequence,

    /// Frame arrived (or would be forwarded) with `hop_limit == 0`.
    #[error("hop limit expired")]
    TtlExpired,
}

/// Result alias for internal, non-propagating router operations.
pub type RouterResult<T> = Result<T, RouterError>;
