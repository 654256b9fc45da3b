//! TCP transport for the command bridge.
//!
//! The listener accepts connections on a background thread and hands each one
//! to a [`ConnectionHandler`] on its own thread. [`CommandWorker`] is the
//! production handler: it frames JSONL commands, queues them for the tick
//! drain, and writes each response back before reading the next line.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod listener_tests;
#[cfg(test)]
mod test_utils;
mod worker;

pub use self::errors::ListenerError;
pub use self::handler::ConnectionHandler;
pub use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;
pub use self::worker::{CommandWorker, RESPONSE_TIMEOUT, TIMEOUT_MESSAGE};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
