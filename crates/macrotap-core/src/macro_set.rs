//! Committed, ordered actions and the shared handle to them

use crate::action::{Action, ActionId};
use crate::geometry::AbsolutePoint;
use parking_lot::RwLock;
use std::sync::Arc;

/// Ordered, id-unique list of committed actions.
///
/// Ids come from a monotonically increasing counter that only [`MacroSet::clear`]
/// and [`MacroSet::load`] reset; deleting an action never frees its id.
#[derive(Debug, Clone)]
pub struct MacroSet {
    actions: Vec<Action>,
    next_id: ActionId,
}

impl Default for MacroSet {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroSet {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn next_id(&self) -> ActionId {
        self.next_id
    }

    pub fn get(&self, id: ActionId) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn snapshot(&self) -> Vec<Action> {
        self.actions.clone()
    }

    /// Append `action` under a freshly allocated id.
    pub fn push(&mut self, mut action: Action) -> ActionId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        action.id = id;
        self.actions.push(action);
        id
    }

    /// Swap in `action` at the position of the action with the same id.
    /// Returns false when that id is gone.
    pub fn replace(&mut self, action: Action) -> bool {
        match self.actions.iter().position(|a| a.id == action.id) {
            Some(index) => {
                self.actions[index] = action;
                true
            }
            None => false,
        }
    }

    pub fn update_point(&mut self, id: ActionId, index: usize, point: AbsolutePoint) -> bool {
        let Some(updated) = self.get(id).and_then(|a| a.with_point(index, point)) else {
            return false;
        };
        self.replace(updated)
    }

    pub fn remove(&mut self, id: ActionId) -> Option<Action> {
        let index = self.actions.iter().position(|a| a.id == id)?;
        Some(self.actions.remove(index))
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.next_id = 1;
    }

    /// Replace the contents, keeping the given ids. Actions whose point count
    /// does not match their kind, whose id repeats, or whose id leaves no room
    /// for a successor are dropped.
    pub fn load(&mut self, actions: Vec<Action>) -> usize {
        self.clear();
        for action in actions {
            if let Err(e) = action.validate() {
                tracing::warn!("skipping malformed action: {}", e);
                continue;
            }
            if action.id.checked_add(1).is_none() {
                tracing::warn!("skipping action with out-of-range id {}", action.id);
                continue;
            }
            if self.get(action.id).is_some() {
                tracing::warn!("skipping duplicate action id {}", action.id);
                continue;
            }
            self.actions.push(action);
        }
        self.next_id = self
            .actions
            .iter()
            .filter_map(|a| a.id.checked_add(1))
            .max()
            .unwrap_or(1);
        self.actions.len()
    }
}

/// Shared handle: the authoring session writes, playback reads snapshots.
#[derive(Debug, Clone, Default)]
pub struct MacroHandle(Arc<RwLock<MacroSet>>);

impl MacroHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_actions(actions: Vec<Action>) -> Self {
        let mut set = MacroSet::new();
        set.load(actions);
        Self(Arc::new(RwLock::new(set)))
    }

    pub fn snapshot(&self) -> Vec<Action> {
        self.0.read().snapshot()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, id: ActionId) -> Option<Action> {
        self.0.read().get(id).cloned()
    }

    pub fn read<R>(&self, f: impl FnOnce(&MacroSet) -> R) -> R {
        f(&self.0.read())
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut MacroSet) -> R) -> R {
        f(&mut self.0.write())
    }
}
