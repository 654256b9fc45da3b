//! Behavioural tests for the command bridge.

use std::cell::RefCell;
use std::net::TcpListener;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use livewire_client::{Connector, ConnectorError};
use livewire_config::Config;
use livewire_types::{ErrorCode, Params};

use super::support::{LiveBridge, loopback_config};

struct BridgeWorld {
    config: Config,
    bridge: Option<LiveBridge>,
    connector: Option<Connector>,
    last: Option<Result<serde_json::Value, ConnectorError>>,
    start_error: Option<String>,
    reserved: Option<TcpListener>,
}

impl BridgeWorld {
    fn new() -> Self {
        Self {
            config: loopback_config(),
            bridge: None,
            connector: None,
            last: None,
            start_error: None,
            reserved: None,
        }
    }

    fn start(&mut self) {
        match LiveBridge::start_with(&self.config) {
            Ok(bridge) => {
                self.connector = Some(bridge.connector());
                self.bridge = Some(bridge);
            }
            Err(error) => self.start_error = Some(error.to_string()),
        }
    }

    fn reserve_port(&mut self) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("reserve port");
        self.config.port = listener.local_addr().expect("reserved addr").port();
        self.reserved = Some(listener);
    }

    fn send(&mut self, action: &str) {
        let connector = self.connector.as_mut().expect("bridge should be running");
        self.last = Some(connector.send(action, Params::new()));
    }
}

#[fixture]
fn world() -> RefCell<BridgeWorld> {
    RefCell::new(BridgeWorld::new())
}

#[given("a running command bridge")]
fn given_running_bridge(world: &RefCell<BridgeWorld>) {
    world.borrow_mut().start();
    assert!(
        world.borrow().start_error.is_none(),
        "bridge failed to start: {:?}",
        world.borrow().start_error
    );
}

#[given("the bridge port is already in use")]
fn given_port_in_use(world: &RefCell<BridgeWorld>) {
    world.borrow_mut().reserve_port();
}

#[when("a client sends the action \"{action}\"")]
fn when_client_sends(world: &RefCell<BridgeWorld>, action: String) {
    world.borrow_mut().send(&action);
}

#[when("the command bridge starts")]
fn when_bridge_starts(world: &RefCell<BridgeWorld>) {
    world.borrow_mut().start();
}

#[then("the client receives a successful response")]
fn then_success(world: &RefCell<BridgeWorld>) {
    let world = world.borrow();
    match world.last.as_ref() {
        Some(Ok(_)) => {}
        other => panic!("expected a successful response, got {other:?}"),
    }
}

#[then("the client receives the error code \"{code}\"")]
fn then_error_code(world: &RefCell<BridgeWorld>, code: String) {
    let world = world.borrow();
    let Some(Err(error)) = world.last.as_ref() else {
        panic!("expected an error response, got {:?}", world.last);
    };
    let expected: ErrorCode =
        serde_json::from_value(serde_json::Value::String(code)).expect("known error code");
    assert_eq!(error.code(), Some(expected));
}

#[then("starting the bridge fails")]
fn then_start_fails(world: &RefCell<BridgeWorld>) {
    assert!(
        world.borrow().start_error.is_some(),
        "expected bridge start to fail"
    );
}

#[scenario(
    path = "tests/features/command_bridge.feature",
    name = "A client runs a registered action"
)]
fn registered_action(#[from(world)] world: RefCell<BridgeWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_bridge.feature",
    name = "A client asks for an action nobody registered"
)]
fn unknown_action(#[from(world)] world: RefCell<BridgeWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_bridge.feature",
    name = "A failing handler leaves the bridge usable"
)]
fn failing_handler(#[from(world)] world: RefCell<BridgeWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_bridge.feature",
    name = "The bridge port is already taken"
)]
fn port_in_use(#[from(world)] world: RefCell<BridgeWorld>) {
    drop(world);
}
