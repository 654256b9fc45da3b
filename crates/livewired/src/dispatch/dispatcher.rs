//! Request-time action dispatch.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use livewire_types::{ErrorCode, Outcome, Params};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::group::HandlerGroup;
use super::table::ActionTable;

/// Routes actions to handlers and converts every failure into an [`Outcome`].
///
/// Nothing a handler does, including panicking, escapes `dispatch`; callers
/// can keep draining the queue regardless of what the previous command did.
#[derive(Debug)]
pub struct Dispatcher<H> {
    table: ActionTable<H>,
}

impl<H> Dispatcher<H> {
    /// Builds a dispatcher from handler groups.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateAction`] if two handlers claim the
    /// same action name.
    pub fn new(groups: impl IntoIterator<Item = HandlerGroup<H>>) -> Result<Self, DispatchError> {
        ActionTable::build(groups).map(Self::from_table)
    }

    /// Wraps an already built table.
    pub fn from_table(table: ActionTable<H>) -> Self {
        Self { table }
    }

    /// Action table backing this dispatcher.
    pub fn table(&self) -> &ActionTable<H> {
        &self.table
    }

    /// Registered action names, sorted.
    pub fn actions(&self) -> Vec<&str> {
        self.table.actions()
    }

    /// Executes `action` against `host`.
    pub fn dispatch(&self, host: &mut H, action: &str, params: &Params) -> Outcome {
        let Some(entry) = self.table.get(action) else {
            debug!(target: DISPATCH_TARGET, action, "unknown action");
            return Outcome::failure(ErrorCode::UnknownAction, format!("Unknown action: {action}"));
        };

        debug!(
            target: DISPATCH_TARGET,
            action,
            group = entry.group,
            "dispatching action"
        );

        match panic::catch_unwind(AssertUnwindSafe(|| (entry.handler)(host, params))) {
            Ok(Ok(result)) => Outcome::Success(result),
            Ok(Err(failure)) => {
                warn!(
                    target: DISPATCH_TARGET,
                    action,
                    group = entry.group,
                    error = %failure,
                    "handler failed"
                );
                Outcome::failure(ErrorCode::ExecutionError, failure.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    target: DISPATCH_TARGET,
                    action,
                    group = entry.group,
                    panic = %message,
                    "handler panicked"
                );
                Outcome::failure(ErrorCode::HandlerError, message)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_owned()
    }
}
