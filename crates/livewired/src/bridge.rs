//! Bridge bootstrap: wires the listener, workers, queue, and registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;

use livewire_config::{Config, Endpoint};

use crate::dispatch::Dispatcher;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::queue::command_queue;
use crate::registry::ResponseRegistry;
use crate::tick::TickDrain;
use crate::transport::{CommandWorker, ListenerError, ListenerHandle, SocketListener};

/// Upper bound on waiting for the accept loop during shutdown.
pub const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors surfaced while starting or stopping the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The listener could not be bound or started.
    #[error("failed to start command bridge: {source}")]
    Start {
        #[source]
        source: ListenerError,
    },
    /// The accept loop did not stop cleanly.
    #[error("failed to stop command bridge: {source}")]
    Stop {
        #[source]
        source: ListenerError,
    },
}

/// Running bridge. The matching [`TickDrain`] is handed back to the host.
pub struct Bridge {
    endpoint: Endpoint,
    local_addr: Option<SocketAddr>,
    shutdown: Arc<AtomicBool>,
    listener: Option<ListenerHandle>,
    reporter: Arc<dyn HealthReporter>,
}

impl Bridge {
    /// Starts the bridge with the default structured health reporter.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Start`] when the endpoint cannot be resolved or
    /// bound; the host keeps running without a bridge in that case.
    pub fn start<H>(
        config: &Config,
        dispatcher: Dispatcher<H>,
    ) -> Result<(Self, TickDrain<H>), BridgeError> {
        Self::start_with(config, dispatcher, Arc::new(StructuredHealthReporter::new()))
    }

    /// Starts the bridge, reporting lifecycle events to `reporter`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Start`] when the listener cannot be started.
    pub fn start_with<H>(
        config: &Config,
        dispatcher: Dispatcher<H>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Result<(Self, TickDrain<H>), BridgeError> {
        let endpoint = config.endpoint();
        reporter.bridge_starting(&endpoint);

        let listener = match SocketListener::bind(&endpoint) {
            Ok(listener) => listener,
            Err(source) => return Err(fail(reporter.as_ref(), source)),
        };
        let local_addr = listener.local_addr();

        let (sender, receiver) = command_queue();
        let registry = Arc::new(ResponseRegistry::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker = CommandWorker::new(sender, Arc::clone(&registry), Arc::clone(&shutdown));
        let handle = match listener.start(Arc::new(worker), Arc::clone(&shutdown)) {
            Ok(handle) => handle,
            Err(source) => return Err(fail(reporter.as_ref(), source)),
        };

        let actions = dispatcher.table().len();
        reporter.bridge_listening(local_addr, actions);
        let drain = TickDrain::new(receiver, dispatcher, registry);
        let bridge = Self {
            endpoint,
            local_addr,
            shutdown,
            listener: Some(handle),
            reporter,
        };
        Ok((bridge, drain))
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Returns `true` until [`Bridge::shutdown`] has been called.
    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    /// Stops accepting, closes the listening socket, and tells workers to
    /// close their connections. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stop`] when the accept loop does not exit within
    /// [`SHUTDOWN_JOIN_TIMEOUT`].
    pub fn shutdown(&mut self) -> Result<(), BridgeError> {
        self.shutdown.store(true, Ordering::SeqCst);
        let Some(handle) = self.listener.take() else {
            return Ok(());
        };
        let joined = handle.join_timeout(SHUTDOWN_JOIN_TIMEOUT);
        self.reporter.bridge_stopped();
        joined.map_err(|source| BridgeError::Stop { source })
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("endpoint", &self.endpoint)
            .field("local_addr", &self.local_addr)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn fail(reporter: &dyn HealthReporter, source: ListenerError) -> BridgeError {
    let error = BridgeError::Start { source };
    reporter.bridge_failed(&error);
    error
}
