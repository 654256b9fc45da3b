//! Handler groups contributed by each host domain.

use std::sync::Arc;

use serde_json::Value;
use strum::IntoEnumIterator;

use livewire_types::Params;

use super::errors::HandlerError;

/// Result returned by every action handler.
pub type HandlerResult = Result<Value, HandlerError>;

/// Type-erased action handler. `H` is the host state owned by the tick thread.
pub type Handler<H> = Box<dyn Fn(&mut H, &Params) -> HandlerResult + Send + Sync>;

/// Named set of actions supplied by one domain (session, track, clip, ...).
pub struct HandlerGroup<H> {
    name: &'static str,
    handlers: Vec<(String, Handler<H>)>,
}

impl<H: 'static> HandlerGroup<H> {
    /// Creates an empty group.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: Vec::new(),
        }
    }

    /// Adds a handler for `action`.
    ///
    /// Duplicates are not rejected here; [`ActionTable::build`] reports them
    /// together with collisions across groups.
    ///
    /// [`ActionTable::build`]: super::ActionTable::build
    #[must_use]
    pub fn with_action<F>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut H, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.push((action.into(), Box::new(handler)));
        self
    }

    /// Builds a group from an enumeration of actions.
    ///
    /// Every variant of `A` is registered under its string form, and `handler`
    /// receives the parsed variant so it can match on it exhaustively. Adding
    /// a variant without handling it is then a compile error rather than an
    /// unknown action at runtime.
    pub fn from_actions<A, F>(name: &'static str, handler: F) -> Self
    where
        A: IntoEnumIterator + AsRef<str> + Copy + Send + Sync + 'static,
        F: Fn(&mut H, A, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        A::iter().fold(Self::new(name), |group, action| {
            let handler = Arc::clone(&handler);
            let wire_name = action.as_ref().to_owned();
            group.with_action(wire_name, move |host: &mut H, params: &Params| {
                handler(host, action, params)
            })
        })
    }
}

impl<H> HandlerGroup<H> {
    /// Name of the contributing domain.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Action names in registration order.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|(action, _)| action.as_str())
    }

    pub(super) fn into_handlers(self) -> impl Iterator<Item = (String, Handler<H>)> {
        self.handlers.into_iter()
    }
}

impl<H> std::fmt::Debug for HandlerGroup<H> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HandlerGroup")
            .field("name", &self.name)
            .field("actions", &self.action_names().collect::<Vec<_>>())
            .finish()
    }
}
