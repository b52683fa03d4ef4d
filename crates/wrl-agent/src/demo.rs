//! Scripted demo scenario: a simulated phone host and a wearable session
//! controller joined by the in-process loopback transport.

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use wrl_core::harness::{HostSim, LoopbackTransport};
use wrl_core::session::SessionController;

use crate::config::AgentConfig;

pub async fn run(config: AgentConfig) -> anyhow::Result<()> {
    let host = HostSim::new(config.host_enabled_at_start);
    host.set_reachable(config.host_reachable);

    let controller = Arc::new(SessionController::new(LoopbackTransport::new(host.clone())));

    // Stand-in for the presentation layer: observe every flag overwrite.
    let mut rx = controller.subscribe();
    let observer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let enabled = *rx.borrow_and_update();
            info!(enabled, "presentation observed flag");
        }
    });

    controller.activate().await?;
    info!(
        state = ?controller.session_state(),
        enabled = controller.is_system_enabled(),
        "wearable session up"
    );

    for round in 0..config.push_toggles {
        sleep(Duration::from_millis(config.toggle_interval_ms)).await;
        host.set_enabled(!host.is_enabled());
        controller.handle_push(host.snapshot());
        info!(round, enabled = controller.is_system_enabled(), "host broadcast applied");
    }

    if config.send_sos {
        if !controller.is_system_enabled() {
            host.set_enabled(true);
            controller.handle_push(host.snapshot());
        }
        let outcome = controller.trigger_sos().await;
        match outcome.failure_reason() {
            None => info!(outcome = ?outcome, "sos attempt finished"),
            Some(reason) => warn!(reason = %reason, "sos attempt failed"),
        }
    }

    let stats = controller.stats();
    info!(
        pushes = stats.pushes_received,
        applied = stats.snapshots_applied,
        queries = stats.state_queries,
        sos_sent = stats.sos_sent,
        sos_failed = stats.sos_failed,
        host_sos = host.sos_received(),
        "scenario complete"
    );

    drop(controller);
    let _ = observer.await;
    Ok(())
}
