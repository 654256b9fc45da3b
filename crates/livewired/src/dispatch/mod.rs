//! Action dispatch for host commands.
//!
//! Each host domain contributes a [`HandlerGroup`] mapping action names to
//! handlers. Groups are merged once at startup into an [`ActionTable`]; a name
//! claimed twice is a configuration error, never a silent overwrite. The
//! [`Dispatcher`] then resolves actions at request time and turns unknown
//! actions, handler errors, and handler panics into structured outcomes:
//!
//! | Situation | Code |
//! |---|---|
//! | Action not registered | `UNKNOWN_ACTION` |
//! | Handler returned [`HandlerError`] | `EXECUTION_ERROR` |
//! | Handler panicked | `HANDLER_ERROR` |
//!
//! Handlers receive `&mut H`, the host state owned by the thread that calls
//! the tick drain, so they can only ever run there.

mod dispatcher;
mod errors;
mod group;
mod table;

pub use self::dispatcher::Dispatcher;
pub use self::errors::{DispatchError, HandlerError};
pub use self::group::{Handler, HandlerGroup, HandlerResult};
pub use self::table::ActionTable;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
