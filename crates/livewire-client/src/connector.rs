//! Connection management and request/response correlation.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use livewire_config::{Config, Endpoint};
use livewire_types::{Command, LineBuffer, Outcome, Params, Response, decode_line, encode_line};

use crate::errors::ConnectorError;

/// Bound on establishing the TCP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on waiting for the matching response. One second longer than the
/// bridge's own wait so its `TIMEOUT` envelope arrives first.
pub const READ_TIMEOUT: Duration = Duration::from_secs(16);

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::connector");
const READ_CHUNK: usize = 64 * 1024;

struct Connection {
    stream: TcpStream,
    buffer: LineBuffer,
}

/// Single-connection client for the bridge.
pub struct Connector {
    endpoint: Endpoint,
    connection: Option<Connection>,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Connector {
    /// Creates a disconnected connector for `endpoint`.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            connection: None,
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
        }
    }

    /// Creates a connector for the endpoint described by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.endpoint())
    }

    /// Overrides the response wait bound.
    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Returns `true` while a connection is cached.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Opens the connection unless one is already cached.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Resolve`] or [`ConnectorError::Connect`].
    pub fn connect(&mut self) -> Result<(), ConnectorError> {
        if self.connection.is_some() {
            return Ok(());
        }
        let addr = self.endpoint.resolve()?;
        let stream = TcpStream::connect_timeout(&addr, self.connect_timeout).map_err(|source| {
            ConnectorError::Connect {
                endpoint: self.endpoint.to_string(),
                source,
            }
        })?;
        let _ = stream.set_nodelay(true);
        debug!(target: CLIENT_TARGET, endpoint = %self.endpoint, "connected to bridge");
        self.connection = Some(Connection {
            stream,
            buffer: LineBuffer::unbounded(),
        });
        Ok(())
    }

    /// Closes the cached connection, if any.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            let _ = connection.stream.shutdown(Shutdown::Both);
            debug!(target: CLIENT_TARGET, endpoint = %self.endpoint, "disconnected from bridge");
        }
    }

    /// Sends `action` with `params` and waits for the correlated response.
    ///
    /// Connects first when needed. A failure envelope from the bridge comes
    /// back as [`ConnectorError::Remote`] and leaves the connection open;
    /// every other error closes it.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] describing the transport or remote failure.
    pub fn send(&mut self, action: &str, params: Params) -> Result<Value, ConnectorError> {
        let id = new_request_id();
        let command = Command::new(id.as_str(), action, params);
        let result = self
            .connect()
            .and_then(|()| self.exchange(&command, &id))
            .and_then(|response| match response.outcome {
                Outcome::Success(value) => Ok(value),
                Outcome::Failure { error, code } => Err(ConnectorError::Remote {
                    code,
                    message: error,
                }),
            });
        if let Err(error) = &result {
            if error.is_transport() {
                warn!(target: CLIENT_TARGET, %id, action, %error, "bridge exchange failed");
                self.disconnect();
            }
        }
        result
    }

    fn exchange(&mut self, command: &Command, id: &str) -> Result<Response, ConnectorError> {
        let bytes = encode_line(command)?;
        let read_timeout = self.read_timeout;
        let Some(connection) = self.connection.as_mut() else {
            return Err(ConnectorError::Closed);
        };
        connection
            .stream
            .write_all(&bytes)
            .and_then(|()| connection.stream.flush())
            .map_err(|source| ConnectorError::Send { source })?;

        let deadline = Instant::now() + read_timeout;
        let mut chunk = vec![0_u8; READ_CHUNK];
        loop {
            while let Some(line) = connection.buffer.next_line() {
                match decode_line::<Response>(&line) {
                    Ok(response) if response.id == id => return Ok(response),
                    Ok(response) => debug!(
                        target: CLIENT_TARGET,
                        expected = id,
                        received = %response.id,
                        "discarding response for another request"
                    ),
                    Err(error) => warn!(
                        target: CLIENT_TARGET,
                        %error,
                        "discarding malformed response line"
                    ),
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timeout(read_timeout));
            }
            connection
                .stream
                .set_read_timeout(Some(remaining))
                .map_err(|source| ConnectorError::Read { source })?;
            match connection.stream.read(&mut chunk) {
                Ok(0) => return Err(ConnectorError::Closed),
                Ok(read) => connection
                    .buffer
                    .extend(chunk.get(..read).unwrap_or_default())?,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(timeout(read_timeout));
                }
                Err(source) => return Err(ConnectorError::Read { source }),
            }
        }
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn timeout(limit: Duration) -> ConnectorError {
    ConnectorError::Timeout {
        waited_ms: limit.as_millis(),
    }
}

fn new_request_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("req_{}", uuid.get(..8).unwrap_or(&uuid))
}
