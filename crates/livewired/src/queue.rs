//! FIFO hand-off from connection workers to the tick drain.

use crossbeam::channel::{self, Receiver, Sender};
use thiserror::Error;

use livewire_types::Params;

/// A command with its identifier resolved, ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    /// Correlation identifier.
    pub id: String,
    /// Action name.
    pub action: String,
    /// Action parameters.
    pub params: Params,
}

/// Raised when the consuming side of the queue is gone.
#[derive(Debug, Error)]
#[error("command queue closed; host is not draining commands")]
pub struct QueueClosed;

/// Producer handle. Cloned into every connection worker.
#[derive(Debug, Clone)]
pub struct CommandSender {
    inner: Sender<PendingCommand>,
}

/// Consumer handle, held only by the tick drain.
#[derive(Debug)]
pub struct CommandReceiver {
    inner: Receiver<PendingCommand>,
}

/// Creates an unbounded multi-producer, single-consumer command queue.
pub fn command_queue() -> (CommandSender, CommandReceiver) {
    let (sender, receiver) = channel::unbounded();
    (
        CommandSender { inner: sender },
        CommandReceiver { inner: receiver },
    )
}

impl CommandSender {
    /// Appends a command to the tail of the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] if the receiver has been dropped.
    pub fn push(&self, command: PendingCommand) -> Result<(), QueueClosed> {
        self.inner.send(command).map_err(|_| QueueClosed)
    }
}

impl CommandReceiver {
    /// Pops the head of the queue without blocking.
    pub fn try_next(&self) -> Option<PendingCommand> {
        self.inner.try_recv().ok()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
