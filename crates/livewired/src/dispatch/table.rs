//! Flat action-name lookup built once at startup.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::group::{Handler, HandlerGroup};

pub(super) struct ActionEntry<H> {
    pub(super) group: &'static str,
    pub(super) handler: Handler<H>,
}

/// Read-only mapping from action name to handler.
///
/// Every action name maps to exactly one handler. A name claimed twice, in
/// the same group or across groups, fails construction.
pub struct ActionTable<H> {
    entries: HashMap<String, ActionEntry<H>>,
}

impl<H> ActionTable<H> {
    /// Merges handler groups, in order, into one table.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateAction`] naming both groups when an
    /// action name is registered twice.
    pub fn build(
        groups: impl IntoIterator<Item = HandlerGroup<H>>,
    ) -> Result<Self, DispatchError> {
        let mut entries: HashMap<String, ActionEntry<H>> = HashMap::new();
        for group in groups {
            let group_name = group.name();
            for (action, handler) in group.into_handlers() {
                match entries.entry(action) {
                    Entry::Occupied(existing) => {
                        return Err(DispatchError::duplicate_action(
                            existing.key().clone(),
                            existing.get().group,
                            group_name,
                        ));
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(ActionEntry {
                            group: group_name,
                            handler,
                        });
                    }
                }
            }
        }
        debug!(
            target: DISPATCH_TARGET,
            actions = entries.len(),
            "action table built"
        );
        Ok(Self { entries })
    }

    pub(super) fn get(&self, action: &str) -> Option<&ActionEntry<H>> {
        self.entries.get(action)
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no actions are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered action names in sorted order.
    pub fn actions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<H> std::fmt::Debug for ActionTable<H> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ActionTable")
            .field("actions", &self.actions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(name: &'static str, actions: &[&str]) -> HandlerGroup<()> {
        actions.iter().fold(HandlerGroup::new(name), |group, action| {
            group.with_action(*action, |_: &mut (), _: &livewire_types::Params| Ok(json!({})))
        })
    }

    #[test]
    fn merges_disjoint_groups() {
        let table = ActionTable::build([
            group("session", &["get_session_info", "set_tempo"]),
            group("track", &["create_midi_track"]),
        ])
        .expect("disjoint groups build");
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.actions(),
            ["create_midi_track", "get_session_info", "set_tempo"]
        );
    }

    #[test]
    fn rejects_duplicates_across_groups() {
        let error = ActionTable::build([
            group("session", &["get_session_info", "fire"]),
            group("clip", &["fire"]),
        ])
        .expect_err("collision must fail");
        match error {
            DispatchError::DuplicateAction {
                action,
                first_group,
                second_group,
            } => {
                assert_eq!(action, "fire");
                assert_eq!(first_group, "session");
                assert_eq!(second_group, "clip");
            }
        }
    }

    #[test]
    fn rejects_duplicates_within_a_group() {
        let result = ActionTable::build([group("scene", &["fire_scene", "fire_scene"])]);
        assert!(matches!(result, Err(DispatchError::DuplicateAction { .. })));
    }
}
