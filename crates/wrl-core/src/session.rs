//! Wearable-side session state machine and controller.
//!
//! `SessionController` owns the transport lifecycle state and the cached
//! "system enabled" flag. Inbound snapshots are the only writer of the
//! flag; the wearable's own UI never mutates it. The host's copy is
//! authoritative and the latest received value always wins, so no version
//! numbers or timestamps travel with it.
//!
//! The controller holds no persisted storage: a fresh process starts in
//! `Inactive` with the flag false and re-syncs over the link.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::errors::{CoreError, UnreachableError};
use crate::protocol::{Ack, DecodeError, Message, Payload};
use crate::transport::{ActivationError, SendError, Transport};

// ============================================================================
// Session State
// ============================================================================

/// Transport lifecycle state, independent of the synchronized flag.
///
/// ```text
/// Inactive --activate()--> Activating --(ok)--> Active
///                                     --(err)--> Failed
/// Active --(transport loss signal)--> Failed
/// ```
///
/// `Active` is the only state from which outbound requests are attempted,
/// and is re-entered only via a fresh `activate()` call; there is no
/// automatic reconnect loop in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No activation has been requested yet.
    Inactive,
    /// Activation is in flight.
    Activating,
    /// The link is up; requests may be sent.
    Active,
    /// Activation failed or the transport signalled loss. Manual
    /// re-activation required.
    Failed,
}

// ============================================================================
// SOS Outcome
// ============================================================================

/// Outcome reported for a single SOS attempt.
///
/// The enabled/disabled gating of the UI affordance depends only on the
/// cached flag, never on one of these outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SosOutcome {
    /// The cached flag was false; nothing was sent.
    Ignored,
    /// The session was not active; nothing was sent.
    NotActive,
    /// The reachability probe failed; nothing was sent.
    Unreachable,
    /// The request was handed to the transport but delivery failed.
    SendFailed(SendError),
    /// The host responded. `ack` is present when the response decoded.
    Delivered { ack: Option<Ack> },
}

impl SosOutcome {
    /// Whether the command reached the host.
    pub fn is_delivered(&self) -> bool {
        matches!(self, SosOutcome::Delivered { .. })
    }

    /// Distinguishable failure reason, `None` for delivery or the silent
    /// disabled-flag no-op.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            SosOutcome::Ignored | SosOutcome::Delivered { .. } => None,
            SosOutcome::NotActive => Some("session not active".into()),
            SosOutcome::Unreachable => Some(UnreachableError.to_string()),
            SosOutcome::SendFailed(err) => Some(err.to_string()),
        }
    }
}

// ============================================================================
// Controller Statistics
// ============================================================================

/// Counters for controller activity.
#[derive(Debug, Default)]
pub struct ControllerStats {
    /// Unsolicited inbound dictionaries handed to the controller.
    pushes_received: AtomicU64,
    /// Snapshots folded into the cached flag (pushed or queried).
    snapshots_applied: AtomicU64,
    /// Inbound dictionaries that failed to decode, or decoded to a kind
    /// unexpected in their context.
    decode_failures: AtomicU64,
    /// Well-formed inbound messages dropped for having no wearable-side
    /// meaning.
    dropped: AtomicU64,
    /// State queries handed to the transport.
    state_queries: AtomicU64,
    /// SOS requests handed to the transport.
    sos_sent: AtomicU64,
    /// SOS attempts that produced a failure outcome.
    sos_failed: AtomicU64,
}

impl ControllerStats {
    /// Get a snapshot of current counters.
    pub fn snapshot(&self) -> ControllerStatsSnapshot {
        ControllerStatsSnapshot {
            pushes_received: self.pushes_received.load(Ordering::Relaxed),
            snapshots_applied: self.snapshots_applied.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            state_queries: self.state_queries.load(Ordering::Relaxed),
            sos_sent: self.sos_sent.load(Ordering::Relaxed),
            sos_failed: self.sos_failed.load(Ordering::Relaxed),
        }
    }

    fn inc_pushes_received(&self) {
        self.pushes_received.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_snapshots_applied(&self) {
        self.snapshots_applied.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_decode_failures(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_state_queries(&self) {
        self.state_queries.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_sos_sent(&self) {
        self.sos_sent.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_sos_failed(&self) {
        self.sos_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of controller counters at a point in time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerStatsSnapshot {
    pub pushes_received: u64,
    pub snapshots_applied: u64,
    pub decode_failures: u64,
    pub dropped: u64,
    pub state_queries: u64,
    pub sos_sent: u64,
    pub sos_failed: u64,
}

// ============================================================================
// Session Controller
// ============================================================================

/// Wearable-side session controller.
///
/// Explicitly constructed and explicitly owned; whoever builds the
/// presentation layer receives the instance. There is no process-wide
/// default.
pub struct SessionController<T: Transport> {
    transport: Arc<T>,
    /// Lifecycle state. Flag writes also take this lock, so the two
    /// mutable fields share one serialization point.
    state: Mutex<SessionState>,
    /// Cached mirror of the host's flag. Presentation reads go through the
    /// watch channel and never contend with writers.
    enabled: watch::Sender<bool>,
    stats: ControllerStats,
}

impl<T: Transport> SessionController<T> {
    /// Create a controller in `Inactive` with the flag false.
    pub fn new(transport: Arc<T>) -> Self {
        let (enabled, _) = watch::channel(false);
        Self {
            transport,
            state: Mutex::new(SessionState::Inactive),
            enabled,
            stats: ControllerStats::default(),
        }
    }

    /// Current lifecycle state.
    pub fn session_state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Pure read of the cached flag. Never blocks.
    pub fn is_system_enabled(&self) -> bool {
        *self.enabled.borrow()
    }

    /// Subscribe to flag changes. The receiver observes the current value
    /// immediately and every later overwrite.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.enabled.subscribe()
    }

    /// Counters for observability.
    pub fn stats(&self) -> ControllerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Request transport activation.
    ///
    /// Idempotent: calling while activation is in flight or the session is
    /// already active is a no-op success. On failure the session lands in
    /// `Failed`, the flag keeps its value, and no retry is attempted.
    /// If the host is reachable the moment activation completes, a single
    /// state query is issued before this method returns.
    pub async fn activate(&self) -> Result<(), ActivationError> {
        {
            let mut state = self.state.lock().unwrap();
            let current = *state;
            match current {
                SessionState::Activating | SessionState::Active => {
                    debug!(state = ?current, "activate: already underway");
                    return Ok(());
                }
                SessionState::Inactive | SessionState::Failed => {
                    *state = SessionState::Activating;
                }
            }
        }

        match self.transport.activate().await {
            Ok(activation) => {
                *self.state.lock().unwrap() = SessionState::Active;
                info!(
                    initially_reachable = activation.initially_reachable,
                    "session active"
                );
                if activation.initially_reachable {
                    // Failures are logged inside; the push path stays the
                    // primary sync channel.
                    let _ = self.request_system_state().await;
                }
                Ok(())
            }
            Err(err) => {
                *self.state.lock().unwrap() = SessionState::Failed;
                warn!(error = %err, "session activation failed");
                Err(err)
            }
        }
    }

    /// Re-query the host for the current flag on demand.
    ///
    /// Returns the freshly applied value. A failed refresh leaves the
    /// cached flag untouched.
    pub async fn refresh(&self) -> Result<bool, CoreError> {
        let state = self.session_state();
        if state != SessionState::Active {
            return Err(CoreError::InvalidState(format!(
                "cannot query host while {state:?}"
            )));
        }
        if !self.transport.is_reachable() {
            return Err(UnreachableError.into());
        }
        self.request_system_state().await
    }

    /// Issue the one-shot SOS command. Single best-effort attempt, no
    /// retry; every outcome is reported.
    pub async fn trigger_sos(&self) -> SosOutcome {
        // UI affordance gate, not a protocol guarantee.
        if !self.is_system_enabled() {
            debug!("sos ignored: system disabled");
            return SosOutcome::Ignored;
        }

        let state = self.session_state();
        if state != SessionState::Active {
            warn!(state = ?state, "sos blocked: session not active");
            self.stats.inc_sos_failed();
            return SosOutcome::NotActive;
        }

        if !self.transport.is_reachable() {
            warn!(error = %UnreachableError, "sos blocked");
            self.stats.inc_sos_failed();
            return SosOutcome::Unreachable;
        }

        self.stats.inc_sos_sent();
        match self.transport.send_request(Message::TriggerSos.encode()).await {
            Ok(response) => {
                let ack = match Message::decode(&response) {
                    Ok(Message::Ack(ack)) => Some(ack),
                    Ok(other) => {
                        self.stats.inc_decode_failures();
                        debug!(kind = other.kind(), "sos response was not an ack");
                        None
                    }
                    Err(err) => {
                        self.stats.inc_decode_failures();
                        warn!(error = %err, "sos response did not decode");
                        None
                    }
                };
                info!(
                    accepted = ack.as_ref().map(|a| a.accepted),
                    "sos delivered"
                );
                SosOutcome::Delivered { ack }
            }
            Err(err) => {
                self.stats.inc_sos_failed();
                warn!(error = %err, "sos send failed");
                SosOutcome::SendFailed(err)
            }
        }
    }

    /// Fold an unsolicited inbound dictionary into the controller.
    ///
    /// This is the primary sync path: snapshots overwrite the cached flag
    /// whenever they arrive, in any session state, including while a
    /// request is still pending. Anything else is logged and dropped
    /// without touching state.
    pub fn handle_push(&self, payload: Payload) {
        self.stats.inc_pushes_received();
        match Message::decode(&payload) {
            Ok(Message::SystemStateSnapshot { is_system_enabled }) => {
                self.apply_snapshot(is_system_enabled);
            }
            Ok(other) => {
                self.stats.inc_dropped();
                debug!(kind = other.kind(), "dropping inbound message");
            }
            Err(err) => {
                self.stats.inc_decode_failures();
                warn!(error = %err, "push did not decode");
            }
        }
    }

    /// Note a transport-level connection loss signal.
    pub fn handle_transport_lost(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == SessionState::Active {
            *state = SessionState::Failed;
            warn!("transport lost, session failed");
        }
    }

    /// Send a state query and fold the response in. Both send and decode
    /// failures are non-fatal: the cached flag keeps its previous value.
    async fn request_system_state(&self) -> Result<bool, CoreError> {
        self.stats.inc_state_queries();
        let response = self
            .transport
            .send_request(Message::RequestSystemState.encode())
            .await
            .map_err(|err| {
                warn!(error = %err, "state query send failed");
                CoreError::Send(err)
            })?;

        match Message::decode(&response) {
            Ok(Message::SystemStateSnapshot { is_system_enabled }) => {
                self.apply_snapshot(is_system_enabled);
                Ok(is_system_enabled)
            }
            Ok(other) => {
                self.stats.inc_decode_failures();
                warn!(kind = other.kind(), "state query answered with unexpected message");
                Err(DecodeError::UnexpectedKind(other.kind()).into())
            }
            Err(err) => {
                self.stats.inc_decode_failures();
                warn!(error = %err, "state query response did not decode");
                Err(err.into())
            }
        }
    }

    /// Overwrite the cached flag. Last write wins; the host is the only
    /// author of the value.
    fn apply_snapshot(&self, value: bool) {
        let _state = self.state.lock().unwrap();
        let previous = self.enabled.send_replace(value);
        self.stats.inc_snapshots_applied();
        if previous != value {
            info!(enabled = value, "system flag updated");
        } else {
            debug!(enabled = value, "system flag unchanged");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
