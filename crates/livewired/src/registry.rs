//! Correlation of in-flight request identifiers with their waiters.
//!
//! Each connection worker registers a one-shot slot before it enqueues a
//! command and blocks on that slot until the tick drain fulfils it or the wait
//! bound elapses. The whole map sits behind a single lock; every operation is
//! O(1) and never blocks while the lock is held.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use thiserror::Error;
use tracing::debug;

use livewire_types::Response;

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Errors raised by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A live slot already exists for the identifier.
    #[error("request id '{id}' is already in flight")]
    Duplicate { id: String },
    /// Another thread panicked while holding the registry lock.
    #[error("response registry lock poisoned")]
    Poisoned,
}

/// Shared map from request id to one-shot delivery slot.
#[derive(Debug, Default)]
pub struct ResponseRegistry {
    slots: Mutex<HashMap<String, Sender<Response>>>,
}

/// Receiving half of a registered slot, owned by the waiting worker.
#[derive(Debug)]
pub struct ResponseSlot {
    receiver: Receiver<Response>,
}

impl ResponseSlot {
    /// Blocks until the slot is fulfilled or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Option<Response> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

impl ResponseRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and stores a fresh slot for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if `id` already has a live slot.
    pub fn register(&self, id: &str) -> Result<ResponseSlot, RegistryError> {
        let mut slots = self.lock()?;
        match slots.entry(id.to_owned()) {
            Entry::Occupied(_) => Err(RegistryError::Duplicate { id: id.to_owned() }),
            Entry::Vacant(vacant) => {
                let (sender, receiver) = channel::bounded(1);
                vacant.insert(sender);
                Ok(ResponseSlot { receiver })
            }
        }
    }

    /// Delivers `response` to the live slot for `id`.
    ///
    /// Returns `Ok(false)` when nothing was delivered: the waiter already gave
    /// up and removed its slot, or the slot was fulfilled before. Neither case
    /// is an error and the entry is never recreated.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the lock is poisoned.
    pub fn fulfill(&self, id: &str, response: Response) -> Result<bool, RegistryError> {
        let slots = self.lock()?;
        let Some(sender) = slots.get(id) else {
            debug!(target: REGISTRY_TARGET, id, "no waiter for response; dropping");
            return Ok(false);
        };
        match sender.try_send(response) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                debug!(target: REGISTRY_TARGET, id, "slot already fulfilled; dropping");
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(target: REGISTRY_TARGET, id, "waiter dropped its slot; dropping");
                Ok(false)
            }
        }
    }

    /// Removes the entry for `id`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the lock is poisoned.
    pub fn remove(&self, id: &str) -> Result<bool, RegistryError> {
        Ok(self.lock()?.remove(id).is_some())
    }

    /// Returns `true` when `id` has a live slot.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the lock is poisoned.
    pub fn contains(&self, id: &str) -> Result<bool, RegistryError> {
        Ok(self.lock()?.contains_key(id))
    }

    /// Number of live slots.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Sender<Response>>>, RegistryError> {
        self.slots.lock().map_err(|_| RegistryError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    const SHORT: Duration = Duration::from_millis(20);

    #[fixture]
    fn registry() -> ResponseRegistry {
        ResponseRegistry::new()
    }

    #[rstest]
    fn fulfilled_slot_wakes_waiter(registry: ResponseRegistry) {
        let slot = registry.register("r1").expect("register");
        let delivered = registry
            .fulfill("r1", Response::success("r1", json!({})))
            .expect("fulfill");
        assert!(delivered);
        let response = slot.wait(SHORT).expect("response delivered");
        assert_eq!(response.id, "r1");
        assert!(registry.remove("r1").expect("remove"));
        assert_eq!(registry.len().expect("len"), 0);
    }

    #[rstest]
    fn duplicate_registration_fails(registry: ResponseRegistry) {
        let _slot = registry.register("r1").expect("register");
        let error = registry.register("r1").expect_err("duplicate must fail");
        assert!(matches!(error, RegistryError::Duplicate { .. }));
    }

    #[rstest]
    fn id_is_reusable_after_removal(registry: ResponseRegistry) {
        drop(registry.register("r1").expect("register"));
        registry.remove("r1").expect("remove");
        assert!(registry.register("r1").is_ok());
    }

    #[rstest]
    fn fulfill_after_remove_is_silent_and_does_not_resurrect(registry: ResponseRegistry) {
        let slot = registry.register("r1").expect("register");
        assert!(slot.wait(SHORT).is_none(), "nothing fulfilled yet");
        registry.remove("r1").expect("remove");

        let delivered = registry
            .fulfill("r1", Response::success("r1", json!(null)))
            .expect("late fulfill must not fail");
        assert!(!delivered);
        assert!(!registry.contains("r1").expect("contains"));
    }

    #[rstest]
    fn slot_is_fulfilled_at_most_once(registry: ResponseRegistry) {
        let slot = registry.register("r1").expect("register");
        assert!(registry
            .fulfill("r1", Response::success("r1", json!(1)))
            .expect("first"));
        assert!(!registry
            .fulfill("r1", Response::success("r1", json!(2)))
            .expect("second"));
        let response = slot.wait(SHORT).expect("first response");
        assert_eq!(response, Response::success("r1", json!(1)));
        assert!(slot.wait(SHORT).is_none());
    }
}
