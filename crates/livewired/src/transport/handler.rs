//! Connection handling abstraction for the bridge listener.

use std::net::TcpStream;

/// Handles accepted socket connections.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection until it closes. Implementations should
    /// avoid panicking; the listener does not supervise handler threads.
    fn handle(&self, stream: TcpStream);
}
