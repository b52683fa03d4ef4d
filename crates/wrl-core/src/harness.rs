//! Test harness for WristLink core functionality.
//!
//! In-process transports used by unit tests, the integration tests, and
//! the demo agent: a fully scripted transport for state-machine tests, and
//! a loopback pair with a simulated phone-side host for end-to-end flows.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::protocol::{Ack, Message, Payload};
use crate::transport::{Activation, ActivationError, SendError, Transport};

/// Build a snapshot dictionary.
pub fn snapshot_payload(enabled: bool) -> Payload {
    Message::SystemStateSnapshot { is_system_enabled: enabled }.encode()
}

/// Build an acknowledgement dictionary.
pub fn ack_payload(accepted: bool, detail: &str) -> Payload {
    Message::Ack(Ack { accepted, detail: detail.into() }).encode()
}

// ============================================================================
// Scripted Transport
// ============================================================================

/// Transport double that records every request and serves scripted results.
///
/// Defaults: activation succeeds with `initially_reachable = false`, the
/// host is reachable, and an unscripted request times out.
pub struct ScriptedTransport {
    reachable: AtomicBool,
    activations: AtomicU64,
    activation: Mutex<Result<Activation, ActivationError>>,
    responses: Mutex<VecDeque<Result<Payload, SendError>>>,
    sent: Mutex<Vec<Payload>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(true),
            activations: AtomicU64::new(0),
            activation: Mutex::new(Ok(Activation { initially_reachable: false })),
            responses: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Script the result served by subsequent `activate` calls.
    pub fn script_activation(&self, result: Result<Activation, ActivationError>) {
        *self.activation.lock().unwrap() = result;
    }

    /// Queue the result for the next unanswered request.
    pub fn push_response(&self, response: Result<Payload, SendError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Toggle the reachability probe.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }

    /// Number of `activate` calls that reached the transport.
    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::Relaxed)
    }

    /// Every request payload handed to the transport, in send order.
    pub fn sent(&self) -> Vec<Payload> {
        self.sent.lock().unwrap().clone()
    }

    /// `sent()`, decoded. Panics on a payload the core failed to encode.
    pub fn sent_messages(&self) -> Vec<Message> {
        self.sent()
            .iter()
            .map(|payload| Message::decode(payload).expect("controller sent undecodable payload"))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn activate(&self) -> Result<Activation, ActivationError> {
        self.activations.fetch_add(1, Ordering::Relaxed);
        self.activation.lock().unwrap().clone()
    }

    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }

    async fn send_request(&self, payload: Payload) -> Result<Payload, SendError> {
        self.sent.lock().unwrap().push(payload);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SendError::Timeout))
    }
}

// ============================================================================
// Loopback Host Pair
// ============================================================================

/// In-process phone-side host: owns the authoritative flag, answers state
/// queries with snapshots and SOS commands with acks.
pub struct HostSim {
    enabled: Mutex<bool>,
    reachable: AtomicBool,
    sos_received: AtomicU64,
}

impl HostSim {
    pub fn new(enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            enabled: Mutex::new(enabled),
            reachable: AtomicBool::new(true),
            sos_received: AtomicU64::new(0),
        })
    }

    /// Host-side business decision; callers broadcast the new snapshot to
    /// wearables themselves.
    pub fn set_enabled(&self, enabled: bool) {
        *self.enabled.lock().unwrap() = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.lock().unwrap()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }

    /// SOS commands that reached the host.
    pub fn sos_received(&self) -> u64 {
        self.sos_received.load(Ordering::Relaxed)
    }

    /// Snapshot dictionary of the current authoritative flag.
    pub fn snapshot(&self) -> Payload {
        snapshot_payload(self.is_enabled())
    }

    /// Answer one wearable request.
    pub fn respond(&self, payload: &Payload) -> Result<Payload, SendError> {
        match Message::decode(payload) {
            Ok(Message::RequestSystemState) => Ok(self.snapshot()),
            Ok(Message::TriggerSos) => {
                self.sos_received.fetch_add(1, Ordering::Relaxed);
                Ok(ack_payload(true, "sos received"))
            }
            Ok(other) => Err(SendError::Failed(format!(
                "host cannot answer {}",
                other.kind()
            ))),
            Err(err) => Err(SendError::Failed(format!("undecodable request: {err}"))),
        }
    }
}

/// Wearable-side transport half wired directly to a `HostSim`.
pub struct LoopbackTransport {
    host: Arc<HostSim>,
}

impl LoopbackTransport {
    pub fn new(host: Arc<HostSim>) -> Arc<Self> {
        Arc::new(Self { host })
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn activate(&self) -> Result<Activation, ActivationError> {
        Ok(Activation {
            initially_reachable: self.host.is_reachable(),
        })
    }

    fn is_reachable(&self) -> bool {
        self.host.is_reachable()
    }

    async fn send_request(&self, payload: Payload) -> Result<Payload, SendError> {
        if !self.host.is_reachable() {
            return Err(SendError::Disconnected);
        }
        self.host.respond(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_transport_times_out_unscripted_requests() {
        let transport = ScriptedTransport::new();
        let result = transport.send_request(Payload::new()).await;
        assert_eq!(result, Err(SendError::Timeout));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn host_sim_answers_state_queries() {
        let host = HostSim::new(true);
        let transport = LoopbackTransport::new(host.clone());

        let response = transport
            .send_request(Message::RequestSystemState.encode())
            .await
            .unwrap();

        assert_eq!(
            Message::decode(&response),
            Ok(Message::SystemStateSnapshot { is_system_enabled: true })
        );
    }

    #[tokio::test]
    async fn host_sim_counts_sos_and_acks() {
        let host = HostSim::new(true);
        let transport = LoopbackTransport::new(host.clone());

        let response = transport
            .send_request(Message::TriggerSos.encode())
            .await
            .unwrap();

        assert!(matches!(
            Message::decode(&response),
            Ok(Message::Ack(Ack { accepted: true, .. }))
        ));
        assert_eq!(host.sos_received(), 1);
    }

    #[tokio::test]
    async fn unreachable_host_fails_sends() {
        let host = HostSim::new(false);
        host.set_reachable(false);
        let transport = LoopbackTransport::new(host.clone());

        assert!(!transport.is_reachable());
        let result = transport
            .send_request(Message::RequestSystemState.encode())
            .await;
        assert_eq!(result, Err(SendError::Disconnected));
    }
}
