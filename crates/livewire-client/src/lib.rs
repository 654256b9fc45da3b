//! Client-side connector for the livewire command bridge.
//!
//! [`Connector`] holds at most one TCP connection to the bridge, opening it
//! lazily on the first [`Connector::send`]. Every call writes one JSONL
//! command, then reads until the response with the matching id arrives;
//! anything else on the wire is logged and skipped. Transport failures drop
//! the connection so the next call starts from a clean socket.

mod connector;
mod errors;

pub use connector::{CONNECT_TIMEOUT, Connector, READ_TIMEOUT};
pub use errors::ConnectorError;
