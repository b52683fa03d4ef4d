//! Transport contract required by the session core.
//!
//! The platform messaging layer between the wearable and the phone is an
//! external collaborator; the core only depends on this trait. Unsolicited
//! inbound dictionaries are not part of the trait: the embedding forwards
//! them to `SessionController::handle_push` as they arrive, possibly while
//! a request is in flight.
//!
//! `harness` provides in-process implementations for tests and demos.

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::Payload;

/// Errors from starting the transport session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActivationError {
    /// The underlying session could not be started.
    #[error("transport activation failed: {0}")]
    Failed(String),
}

/// Errors from a request that was handed to the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The transport gave up waiting for a response.
    #[error("request timed out")]
    Timeout,

    /// The link dropped while the request was in flight.
    #[error("transport disconnected")]
    Disconnected,

    /// The transport rejected or lost the request.
    #[error("send failed: {0}")]
    Failed(String),
}

/// Outcome of a completed activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    /// Whether the host was reachable at the moment activation completed.
    pub initially_reachable: bool,
}

/// Bidirectional wearable-to-host channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start the underlying session. Exactly one completion per call.
    async fn activate(&self) -> Result<Activation, ActivationError>;

    /// Point-in-time reachability probe. Synchronous, no I/O, never cached
    /// by callers.
    fn is_reachable(&self) -> bool;

    /// Send a request dictionary and await the single response for it.
    ///
    /// Timeouts and retransmission are the transport's policy; the core
    /// neither configures nor cancels in-flight requests.
    async fn send_request(&self, payload: Payload) -> Result<Payload, SendError>;
}
