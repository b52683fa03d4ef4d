//! Integration tests for the wearable session flows.
//!
//! These run the controller against the loopback host pair end to end:
//! activation and initial sync, pushed snapshot streams, and SOS delivery
//! under reachable and unreachable hosts.

use std::sync::Arc;

use wrl_core::harness::{HostSim, LoopbackTransport};
use wrl_core::session::{SessionController, SessionState, SosOutcome};

fn wearable(host: &Arc<HostSim>) -> SessionController<LoopbackTransport> {
    SessionController::new(LoopbackTransport::new(host.clone()))
}

/// Test: activation against a reachable host syncs the flag immediately.
#[tokio::test]
async fn activation_syncs_initial_state() {
    let host = HostSim::new(true);
    let controller = wearable(&host);

    assert!(!controller.is_system_enabled());
    controller.activate().await.expect("activation should succeed");

    assert_eq!(controller.session_state(), SessionState::Active);
    assert!(controller.is_system_enabled());
    assert_eq!(controller.stats().state_queries, 1);
}

/// Test: the full user journey from disabled to a delivered SOS.
#[tokio::test]
async fn end_to_end_sos_delivery() {
    let host = HostSim::new(false);
    let controller = wearable(&host);
    controller.activate().await.unwrap();
    assert!(!controller.is_system_enabled());

    // SOS is gated off while the system is disabled.
    assert_eq!(controller.trigger_sos().await, SosOutcome::Ignored);
    assert_eq!(host.sos_received(), 0);

    // Host enables the system and broadcasts.
    host.set_enabled(true);
    controller.handle_push(host.snapshot());
    assert!(controller.is_system_enabled());

    let outcome = controller.trigger_sos().await;
    assert!(outcome.is_delivered());
    assert_eq!(host.sos_received(), 1);

    match outcome {
        SosOutcome::Delivered { ack: Some(ack) } => assert!(ack.accepted),
        other => panic!("expected decoded ack, got {other:?}"),
    }
}

/// Test: pushed snapshots keep overwriting the mirror, last one wins.
#[tokio::test]
async fn push_stream_converges_on_latest_value() {
    let host = HostSim::new(false);
    let controller = wearable(&host);
    controller.activate().await.unwrap();

    let mut rx = controller.subscribe();
    for enabled in [true, false, false, true, false] {
        host.set_enabled(enabled);
        controller.handle_push(host.snapshot());
    }

    assert!(!controller.is_system_enabled());
    assert!(!*rx.borrow_and_update());
    assert_eq!(controller.stats().snapshots_applied, 5);
}

/// Test: a host that is unreachable at activation time is not queried;
/// a later manual refresh picks the value up.
#[tokio::test]
async fn unreachable_at_activation_then_manual_refresh() {
    let host = HostSim::new(true);
    host.set_reachable(false);
    let controller = wearable(&host);

    controller.activate().await.unwrap();
    assert_eq!(controller.session_state(), SessionState::Active);
    assert!(!controller.is_system_enabled());
    assert_eq!(controller.stats().state_queries, 0);

    host.set_reachable(true);
    let value = controller.refresh().await.expect("refresh should succeed");
    assert!(value);
    assert!(controller.is_system_enabled());
}

/// Test: losing reachability after activation turns SOS into a clean,
/// sendless failure, and the affordance gating stays flag-driven.
#[tokio::test]
async fn sos_against_unreachable_host() {
    let host = HostSim::new(true);
    let controller = wearable(&host);
    controller.activate().await.unwrap();
    assert!(controller.is_system_enabled());

    host.set_reachable(false);
    let outcome = controller.trigger_sos().await;

    assert_eq!(outcome, SosOutcome::Unreachable);
    assert_eq!(outcome.failure_reason().as_deref(), Some("host not reachable"));
    assert_eq!(host.sos_received(), 0);
    // The flag, and with it the UI gate, is untouched by the failure.
    assert!(controller.is_system_enabled());
}

/// Test: a transport loss signal fails the session and blocks requests
/// until a fresh activation.
#[tokio::test]
async fn transport_loss_requires_reactivation() {
    let host = HostSim::new(true);
    let controller = wearable(&host);
    controller.activate().await.unwrap();

    controller.handle_transport_lost();
    assert_eq!(controller.session_state(), SessionState::Failed);

    let outcome = controller.trigger_sos().await;
    assert_eq!(outcome, SosOutcome::NotActive);
    assert_eq!(host.sos_received(), 0);

    controller.activate().await.unwrap();
    assert_eq!(controller.session_state(), SessionState::Active);
    assert!(controller.trigger_sos().await.is_delivered());
}

/// Test: pushes that race activation still apply.
#[tokio::test]
async fn pushes_before_activation_apply() {
    let host = HostSim::new(true);
    let controller = wearable(&host);

    controller.handle_push(host.snapshot());
    assert!(controller.is_system_enabled());
    assert_eq!(controller.session_state(), SessionState::Inactive);
}
