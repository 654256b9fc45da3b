//! Tests for the socket listener.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rstest::{fixture, rstest};

use livewire_config::Endpoint;

use super::listener::SocketListener;
use super::{ConnectionHandler, CountingHandler, ListenerError};

struct CountingFixture {
    count: Arc<AtomicUsize>,
    handler: Arc<CountingHandler>,
}

#[fixture]
fn counting_fixture() -> CountingFixture {
    let (count, handler) = CountingHandler::new();
    CountingFixture { count, handler }
}

#[fixture]
fn tcp_endpoint() -> Endpoint {
    Endpoint::new("127.0.0.1", 0)
}

fn wait_for_count(count: &AtomicUsize, expected: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if count.load(Ordering::SeqCst) >= expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[rstest]
fn tcp_listener_accepts_connections(tcp_endpoint: Endpoint, counting_fixture: CountingFixture) {
    let listener = SocketListener::bind(&tcp_endpoint).expect("bind tcp listener");
    let addr = listener
        .local_addr()
        .expect("listener should report local address");
    let CountingFixture { count, handler } = counting_fixture;
    let handler: Arc<dyn ConnectionHandler> = handler;
    let handle = listener
        .start(handler, Arc::new(AtomicBool::new(false)))
        .expect("start listener");

    TcpStream::connect(addr).expect("connect first client");
    TcpStream::connect(addr).expect("connect second client");

    assert!(wait_for_count(&count, 2), "expected two connections");
    handle.shutdown();
    handle.join().expect("join listener");
}

#[rstest]
fn shutdown_flag_stops_loop_and_closes_socket(
    tcp_endpoint: Endpoint,
    counting_fixture: CountingFixture,
) {
    let listener = SocketListener::bind(&tcp_endpoint).expect("bind tcp listener");
    let addr = listener.local_addr().expect("local address");
    let shutdown = Arc::new(AtomicBool::new(false));
    let handle = listener
        .start(counting_fixture.handler, Arc::clone(&shutdown))
        .expect("start listener");

    shutdown.store(true, Ordering::SeqCst);
    handle
        .join_timeout(Duration::from_secs(2))
        .expect("accept loop should stop promptly");

    let rebound = TcpListener::bind(addr);
    assert!(rebound.is_ok(), "listening socket should be released");
}

#[rstest]
fn bind_fails_when_port_is_taken() {
    let reserved = TcpListener::bind(("127.0.0.1", 0)).expect("reserve port");
    let port = reserved.local_addr().expect("reserved addr").port();

    let error = SocketListener::bind(&Endpoint::new("127.0.0.1", port))
        .expect_err("bind should fail on an occupied port");
    assert!(matches!(error, ListenerError::BindTcp { .. }));
}

#[rstest]
fn bind_fails_for_unresolvable_host() {
    let error = SocketListener::bind(&Endpoint::new("host.invalid", 9877))
        .expect_err("resolution should fail");
    assert!(matches!(error, ListenerError::Resolve(_)));
}
