//! Command consumer invoked from the host's periodic callback.

use std::sync::Arc;

use tracing::{debug, warn};

use livewire_types::Response;

use crate::dispatch::Dispatcher;
use crate::queue::CommandReceiver;
use crate::registry::ResponseRegistry;

const TICK_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::tick");

/// Counters for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Commands popped and executed.
    pub executed: usize,
    /// Responses handed to a waiting worker.
    pub delivered: usize,
}

/// The only code path that invokes action handlers.
///
/// The host calls [`TickDrain::drain`] from its own thread on every tick.
/// Each call empties the queue as it stands, never waits for more, and
/// fulfils exactly one registry slot per executed command.
pub struct TickDrain<H> {
    commands: CommandReceiver,
    dispatcher: Dispatcher<H>,
    registry: Arc<ResponseRegistry>,
}

impl<H> TickDrain<H> {
    /// Assembles a drain from its collaborators.
    pub fn new(
        commands: CommandReceiver,
        dispatcher: Dispatcher<H>,
        registry: Arc<ResponseRegistry>,
    ) -> Self {
        Self {
            commands,
            dispatcher,
            registry,
        }
    }

    /// Executes every queued command against `host` in FIFO order.
    pub fn drain(&self, host: &mut H) -> DrainReport {
        let mut report = DrainReport::default();
        while let Some(command) = self.commands.try_next() {
            let outcome = self
                .dispatcher
                .dispatch(host, &command.action, &command.params);
            report.executed += 1;

            let response = Response::new(command.id.clone(), outcome);
            match self.registry.fulfill(&command.id, response) {
                Ok(true) => report.delivered += 1,
                Ok(false) => debug!(
                    target: TICK_TARGET,
                    id = %command.id,
                    action = %command.action,
                    "waiter gone; response dropped"
                ),
                Err(error) => warn!(
                    target: TICK_TARGET,
                    id = %command.id,
                    %error,
                    "failed to deliver response"
                ),
            }
        }
        if report.executed > 0 {
            debug!(
                target: TICK_TARGET,
                executed = report.executed,
                delivered = report.delivered,
                "drain pass complete"
            );
        }
        report
    }

    /// Number of commands waiting for the next pass.
    pub fn pending(&self) -> usize {
        self.commands.len()
    }
}
