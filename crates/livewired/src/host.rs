//! Demo host used by the `livewired` binary.
//!
//! The host owns a little in-memory state and exposes it through the `system`
//! handler group. Its main thread is the single owner of that state: it runs
//! the tick loop and is the only thread that ever calls [`TickDrain::drain`].

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use signal_hook::consts::{SIGINT, SIGTERM};
use strum::{AsRefStr, EnumIter};
use thiserror::Error;
use tracing::info;

use livewire_config::{Config, ConfigError};
use livewire_types::Params;

use crate::bridge::{Bridge, BridgeError};
use crate::dispatch::{DispatchError, Dispatcher, HandlerGroup, HandlerResult};
use crate::telemetry::{self, TelemetryError};
use crate::tick::TickDrain;

/// Interval between drain passes.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// Errors that stop the demo host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("failed to install signal handler: {source}")]
    Signal {
        #[source]
        source: io::Error,
    },
}

/// Actions served by the `system` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SystemAction {
    Ping,
    Noop,
    Echo,
    BridgeInfo,
}

/// State owned by the host thread.
#[derive(Debug)]
pub struct DemoHost {
    started: Instant,
    ticks: u64,
    actions: Vec<String>,
}

impl DemoHost {
    /// Creates a host that advertises `actions` through `bridge_info`.
    pub fn new(actions: Vec<String>) -> Self {
        Self {
            started: Instant::now(),
            ticks: 0,
            actions,
        }
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one drain pass and advances the tick counter.
    pub fn tick(&mut self, drain: &TickDrain<Self>) {
        drain.drain(self);
        self.ticks += 1;
    }

    fn handle(&mut self, action: SystemAction, params: &Params) -> HandlerResult {
        Ok(match action {
            SystemAction::Ping => json!({ "pong": true, "ticks": self.ticks }),
            SystemAction::Noop => json!({}),
            SystemAction::Echo => Value::Object(params.clone()),
            SystemAction::BridgeInfo => json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "uptime_ms": u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "ticks": self.ticks,
                "actions": self.actions,
            }),
        })
    }
}

/// Handler group for [`SystemAction`].
pub fn system_group() -> HandlerGroup<DemoHost> {
    HandlerGroup::from_actions(
        "system",
        |host: &mut DemoHost, action: SystemAction, params: &Params| host.handle(action, params),
    )
}

/// Loads configuration, installs telemetry, and runs until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns [`HostError`] if any startup step fails.
pub fn run_host() -> Result<(), HostError> {
    let config = Config::load()?;
    telemetry::initialise(&config)?;

    let terminate = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&terminate))
            .map_err(|source| HostError::Signal { source })?;
    }
    run(&config, &terminate)
}

/// Runs the tick loop on the calling thread until `terminate` is set.
///
/// # Errors
///
/// Returns [`HostError`] if the action table or bridge cannot be built.
pub fn run(config: &Config, terminate: &AtomicBool) -> Result<(), HostError> {
    let dispatcher = Dispatcher::new([system_group()])?;
    let actions = dispatcher
        .actions()
        .into_iter()
        .map(str::to_owned)
        .collect();
    let mut host = DemoHost::new(actions);
    let (mut bridge, drain) = Bridge::start(config, dispatcher)?;

    while !terminate.load(Ordering::SeqCst) {
        host.tick(&drain);
        thread::sleep(TICK_INTERVAL);
    }

    info!(target: HOST_TARGET, ticks = host.ticks(), "termination requested");
    bridge.shutdown()?;
    Ok(())
}
