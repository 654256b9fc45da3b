//! Structured health reporting for bridge lifecycle events.

use std::net::SocketAddr;

use livewire_config::Endpoint;

use crate::bridge::BridgeError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before the listener is bound.
    fn bridge_starting(&self, endpoint: &Endpoint);

    /// Invoked once the accept loop is running.
    fn bridge_listening(&self, addr: Option<SocketAddr>, actions: usize);

    /// Invoked when startup fails.
    fn bridge_failed(&self, error: &BridgeError);

    /// Invoked after the listener has been stopped.
    fn bridge_stopped(&self);
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bridge_starting(&self, endpoint: &Endpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bridge_starting",
            endpoint = %endpoint,
            "starting command bridge"
        );
    }

    fn bridge_listening(&self, addr: Option<SocketAddr>, actions: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bridge_listening",
            addr = ?addr,
            actions,
            "command bridge listening"
        );
    }

    fn bridge_failed(&self, error: &BridgeError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bridge_failed",
            error = %error,
            "command bridge failed to start"
        );
    }

    fn bridge_stopped(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bridge_stopped",
            "command bridge stopped"
        );
    }
}
