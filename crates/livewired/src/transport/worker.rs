//! Per-connection command worker.
//!
//! A worker owns one client stream. It reads JSONL commands, hands each one
//! to the tick drain through the command queue, then blocks on the response
//! registry until the host answers or [`RESPONSE_TIMEOUT`] elapses. Commands
//! on one connection are therefore answered strictly in order.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use livewire_types::{
    CodecError, Command, ErrorCode, LineBuffer, Response, decode_line, encode_line,
};

use super::{ConnectionHandler, LISTENER_TARGET};
use crate::queue::{CommandSender, PendingCommand};
use crate::registry::{RegistryError, ResponseRegistry};

/// Upper bound on how long a worker waits for the host to answer.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(15);

/// Error text sent with a `TIMEOUT` response.
pub const TIMEOUT_MESSAGE: &str = "Timeout waiting for host to process command";

const READ_POLL_INTERVAL: Duration = Duration::from_millis(250);
const READ_CHUNK: usize = 64 * 1024;

/// Production [`ConnectionHandler`] that bridges a client to the host.
#[derive(Debug, Clone)]
pub struct CommandWorker {
    queue: CommandSender,
    registry: Arc<ResponseRegistry>,
    shutdown: Arc<AtomicBool>,
    response_timeout: Duration,
}

enum ReadOutcome {
    Data(usize),
    Idle,
    Closed,
}

impl CommandWorker {
    /// Creates a worker sharing the bridge queue, registry, and stop flag.
    pub fn new(
        queue: CommandSender,
        registry: Arc<ResponseRegistry>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            queue,
            registry,
            shutdown,
            response_timeout: RESPONSE_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    fn serve(&self, mut stream: TcpStream, peer: Option<SocketAddr>) -> io::Result<()> {
        stream.set_read_timeout(Some(READ_POLL_INTERVAL))?;
        let mut buffer = LineBuffer::new();
        let mut chunk = vec![0_u8; READ_CHUNK];
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                debug!(target: LISTENER_TARGET, ?peer, "bridge stopping; closing connection");
                return Ok(());
            }
            let read = match read_chunk(&mut stream, &mut chunk)? {
                ReadOutcome::Data(read) => read,
                ReadOutcome::Idle => continue,
                ReadOutcome::Closed => return Ok(()),
            };
            if let Err(error) = buffer.extend(chunk.get(..read).unwrap_or_default()) {
                warn!(target: LISTENER_TARGET, ?peer, %error, "dropping connection");
                return Ok(());
            }
            while let Some(line) = buffer.next_line() {
                let Some(response) = self.process_line(&line, peer) else {
                    continue;
                };
                let bytes = match encode_line(&response) {
                    Ok(bytes) => bytes,
                    Err(error) => {
                        warn!(target: LISTENER_TARGET, ?peer, %error, "failed to encode response");
                        continue;
                    }
                };
                stream.write_all(&bytes)?;
                stream.flush()?;
            }
        }
    }

    fn process_line(&self, line: &[u8], peer: Option<SocketAddr>) -> Option<Response> {
        let command: Command = match decode_line(line) {
            Ok(command) => command,
            Err(CodecError::Malformed(error)) => {
                warn!(target: LISTENER_TARGET, ?peer, %error, "skipping malformed command line");
                return None;
            }
            Err(error) => {
                warn!(target: LISTENER_TARGET, ?peer, %error, "skipping command line");
                return None;
            }
        };
        let Command { id, action, params } = command;
        let id = id.unwrap_or_else(generate_request_id);
        Some(self.execute(PendingCommand { id, action, params }))
    }

    fn execute(&self, command: PendingCommand) -> Response {
        let id = command.id.clone();
        let slot = match self.registry.register(&id) {
            Ok(slot) => slot,
            Err(error @ RegistryError::Duplicate { .. }) => {
                warn!(target: LISTENER_TARGET, %id, "rejecting duplicate in-flight id");
                return Response::failure(id, ErrorCode::ExecutionError, error.to_string());
            }
            Err(error) => {
                return Response::failure(id, ErrorCode::ExecutionError, error.to_string());
            }
        };

        debug!(target: LISTENER_TARGET, %id, action = %command.action, "queueing command");
        if let Err(error) = self.queue.push(command) {
            self.release(&id);
            return Response::failure(id, ErrorCode::ExecutionError, error.to_string());
        }

        let response = slot.wait(self.response_timeout);
        self.release(&id);
        response.unwrap_or_else(|| {
            info!(
                target: LISTENER_TARGET,
                %id,
                timeout_ms = self.response_timeout.as_millis(),
                "host did not answer in time"
            );
            Response::failure(id, ErrorCode::Timeout, TIMEOUT_MESSAGE)
        })
    }

    fn release(&self, id: &str) {
        if let Err(error) = self.registry.remove(id) {
            warn!(target: LISTENER_TARGET, id, %error, "failed to release response slot");
        }
    }
}

impl ConnectionHandler for CommandWorker {
    fn handle(&self, stream: TcpStream) {
        let peer = stream.peer_addr().ok();
        if let Err(error) = self.serve(stream, peer) {
            debug!(target: LISTENER_TARGET, ?peer, %error, "connection closed with error");
        }
        debug!(target: LISTENER_TARGET, ?peer, "client disconnected");
    }
}

fn generate_request_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("req_{}", uuid.get(..8).unwrap_or(&uuid))
}

fn read_chunk(stream: &mut TcpStream, chunk: &mut [u8]) -> io::Result<ReadOutcome> {
    loop {
        match stream.read(chunk) {
            Ok(0) => {
                let _ = stream.shutdown(Shutdown::Both);
                return Ok(ReadOutcome::Closed);
            }
            Ok(read) => return Ok(ReadOutcome::Data(read)),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                return Ok(ReadOutcome::Idle);
            }
            Err(error) => return Err(error),
        }
    }
}
