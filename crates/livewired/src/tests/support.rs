//! Shared harness: a live bridge drained by a dedicated host thread.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::{Value, json};

use livewire_client::Connector;
use livewire_config::{Config, Endpoint};
use livewire_types::Params;

use crate::bridge::{Bridge, BridgeError};
use crate::dispatch::{Dispatcher, HandlerError, HandlerGroup};

const DRAIN_INTERVAL: Duration = Duration::from_millis(10);

/// Host state owned by the drain thread.
#[derive(Debug, Default)]
pub(crate) struct SessionHost {
    pub(crate) tempo: f64,
    pub(crate) executed: usize,
}

pub(crate) fn session_group() -> HandlerGroup<SessionHost> {
    HandlerGroup::new("session")
        .with_action("noop", |host: &mut SessionHost, _: &Params| {
            host.executed += 1;
            Ok(json!({}))
        })
        .with_action("get_tempo", |host: &mut SessionHost, _: &Params| {
            host.executed += 1;
            Ok(json!({ "tempo": host.tempo }))
        })
        .with_action("set_tempo", |host: &mut SessionHost, params: &Params| {
            host.executed += 1;
            let tempo = params
                .get("tempo")
                .and_then(Value::as_f64)
                .ok_or_else(|| HandlerError::missing_param("tempo"))?;
            host.tempo = tempo;
            Ok(json!({ "tempo": tempo }))
        })
        .with_action("dump", |_: &mut SessionHost, params: &Params| {
            let bytes = params
                .get("bytes")
                .and_then(Value::as_u64)
                .and_then(|bytes| usize::try_from(bytes).ok())
                .ok_or_else(|| HandlerError::missing_param("bytes"))?;
            Ok(json!({ "blob": "x".repeat(bytes) }))
        })
        .with_action("explode", |_: &mut SessionHost, _: &Params| -> Result<Value, HandlerError> {
            panic!("device chain vanished")
        })
}

/// Config binding an ephemeral loopback port.
pub(crate) fn loopback_config() -> Config {
    Config {
        host: "127.0.0.1".to_owned(),
        port: 0,
        ..Config::default()
    }
}

/// Running bridge plus the thread that drains it.
pub(crate) struct LiveBridge {
    bridge: Bridge,
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    host: Option<JoinHandle<SessionHost>>,
}

impl LiveBridge {
    pub(crate) fn start() -> Result<Self, BridgeError> {
        Self::start_with(&loopback_config())
    }

    pub(crate) fn start_with(config: &Config) -> Result<Self, BridgeError> {
        let dispatcher = Dispatcher::new([session_group()]).expect("session group builds");
        let (bridge, drain) = Bridge::start(config, dispatcher)?;
        let addr = bridge.local_addr().expect("bridge reports its address");
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let host = thread::spawn(move || {
            let mut host = SessionHost::default();
            while !flag.load(Ordering::SeqCst) {
                drain.drain(&mut host);
                thread::sleep(DRAIN_INTERVAL);
            }
            host
        });
        Ok(Self {
            bridge,
            addr,
            stop,
            host: Some(host),
        })
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub(crate) fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", self.addr.port())
    }

    pub(crate) fn connector(&self) -> Connector {
        Connector::new(self.endpoint())
    }

    pub(crate) fn bridge_mut(&mut self) -> &mut Bridge {
        &mut self.bridge
    }

    /// Stops the bridge and the host thread, returning the final host state.
    pub(crate) fn finish(mut self) -> SessionHost {
        self.stop_all()
    }

    fn stop_all(&mut self) -> SessionHost {
        self.bridge.shutdown().expect("bridge shuts down");
        self.stop.store(true, Ordering::SeqCst);
        self.host
            .take()
            .map(|host| host.join().expect("host thread"))
            .unwrap_or_default()
    }
}

impl Drop for LiveBridge {
    fn drop(&mut self) {
        if self.host.is_some() {
            self.stop_all();
        }
    }
}
