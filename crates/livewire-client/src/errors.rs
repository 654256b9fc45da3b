//! Errors reported by the connector.

use std::io;

use thiserror::Error;

use livewire_config::ResolveError;
use livewire_types::{CodecError, ErrorCode};

/// Failures surfaced by [`Connector`](crate::Connector).
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The bridge endpoint could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The TCP connection could not be established.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Writing the command failed.
    #[error("failed to send command: {source}")]
    Send {
        #[source]
        source: io::Error,
    },
    /// The bridge closed the connection before answering.
    #[error("connection closed by bridge")]
    Closed,
    /// No matching response arrived in time.
    #[error("no response within {waited_ms} ms")]
    Timeout { waited_ms: u128 },
    /// Reading from the socket failed.
    #[error("failed to read response: {source}")]
    Read {
        #[source]
        source: io::Error,
    },
    /// A message could not be framed or serialised.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The bridge answered with a failure envelope.
    #[error("[{code}] {message}")]
    Remote { code: ErrorCode, message: String },
}

impl ConnectorError {
    /// Returns `true` when the failure leaves the connection unusable.
    ///
    /// Only [`ConnectorError::Remote`] keeps the connection: the exchange
    /// completed and the stream is still in sync.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Remote { .. })
    }

    /// Structured code of a remote failure.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}
