//! Command bridge between TCP clients and a single-threaded host.
//!
//! Clients send newline-delimited JSON commands over TCP. Each connection is
//! served by its own worker thread, but no worker ever touches host state:
//! commands are queued and executed by [`TickDrain::drain`], which the host
//! calls from the one thread allowed to mutate its state. Responses travel
//! back through the [`ResponseRegistry`], keyed by request id, and each worker
//! waits at most [`RESPONSE_TIMEOUT`] before answering `TIMEOUT` itself.
//!
//! ```no_run
//! use livewire_config::Config;
//! use livewired::{Bridge, Dispatcher, HandlerGroup};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! struct Host {
//!     tempo: f64,
//! }
//!
//! let group = HandlerGroup::new("session").with_action("get_tempo", |host: &mut Host, _| {
//!     Ok(json!({ "tempo": host.tempo }))
//! });
//! let (mut bridge, drain) = Bridge::start(&Config::default(), Dispatcher::new([group])?)?;
//! let mut host = Host { tempo: 120.0 };
//! drain.drain(&mut host);
//! bridge.shutdown()?;
//! # Ok(())
//! # }
//! ```

mod bridge;
pub mod dispatch;
mod health;
mod host;
mod queue;
mod registry;
pub mod telemetry;
mod tick;
mod transport;

pub use bridge::{Bridge, BridgeError, SHUTDOWN_JOIN_TIMEOUT};
pub use dispatch::{
    ActionTable, DispatchError, Dispatcher, Handler, HandlerError, HandlerGroup, HandlerResult,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use host::{DemoHost, HostError, SystemAction, TICK_INTERVAL, run_host, system_group};
pub use queue::{CommandReceiver, CommandSender, PendingCommand, QueueClosed, command_queue};
pub use registry::{RegistryError, ResponseRegistry, ResponseSlot};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use tick::{DrainReport, TickDrain};
pub use transport::{
    CommandWorker, ConnectionHandler, ListenerError, ListenerHandle, RESPONSE_TIMEOUT,
    SocketListener, TIMEOUT_MESSAGE,
};

#[cfg(test)]
mod tests;
