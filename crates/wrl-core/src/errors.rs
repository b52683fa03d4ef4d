//! Error taxonomy for WristLink Core.
//!
//! Every error here is non-fatal and locally recovered: the controller
//! degrades by leaving state unchanged and surfaces a diagnostic. Nothing
//! in this module terminates the process.

use thiserror::Error;

pub use crate::protocol::DecodeError;
pub use crate::transport::{ActivationError, SendError};

/// The host was not reachable when a request-type send was about to start.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("host not reachable")]
pub struct UnreachableError;

/// Unified error type for core operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Transport could not start.
    #[error("activation error: {0}")]
    Activation(#[from] ActivationError),

    /// Request failed to reach the host or timed out.
    #[error("send error: {0}")]
    Send(#[from] SendError),

    /// Inbound dictionary missing the expected field or of unknown shape.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Reachability precondition failed before the send.
    #[error(transparent)]
    Unreachable(#[from] UnreachableError),

    /// Operation attempted from a session state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),
}
