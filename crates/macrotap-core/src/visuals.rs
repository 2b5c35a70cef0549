//! Markers and connector lines projected from committed actions
//!
//! A [`VisualBinding`] never owns data: it is rebuilt from the macro set and
//! the surface's current offset, and is dropped together with its action.

use crate::action::{Action, ActionId};
use crate::geometry::{to_local, LocalPoint};
use crate::surface::{HostSurface, MarkerSpec, VisualId};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualBinding {
    pub action_id: ActionId,
    pub markers: Vec<VisualId>,
    pub line: Option<VisualId>,
}

/// Where a marker's drags go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkerRoute {
    /// Point `index` of the pending action.
    Pending { index: usize },
    /// Point `index` of a committed action.
    Committed { action_id: ActionId, index: usize },
    /// Left behind by a cleared action; ignores input until released.
    Detached,
}

#[derive(Debug, Clone, Copy)]
struct MarkerState {
    center: LocalPoint,
    route: MarkerRoute,
}

#[derive(Debug, Default)]
pub(crate) struct VisualLayer {
    bindings: Vec<VisualBinding>,
    detached: Vec<VisualBinding>,
    markers: HashMap<VisualId, MarkerState>,
    recreate_armed: bool,
}

impl VisualLayer {
    pub fn bindings(&self) -> &[VisualBinding] {
        &self.bindings
    }

    pub fn binding(&self, action_id: ActionId) -> Option<&VisualBinding> {
        self.bindings.iter().find(|b| b.action_id == action_id)
    }

    /// Visuals kept on the surface after their actions were cleared.
    pub fn detached(&self) -> &[VisualBinding] {
        &self.detached
    }

    /// Move every binding aside so its action id can be handed out again.
    /// The visuals stay on the surface until [`release_all`](Self::release_all).
    pub fn detach_all(&mut self) {
        for binding in std::mem::take(&mut self.bindings) {
            for marker in &binding.markers {
                self.set_route(*marker, MarkerRoute::Detached);
            }
            self.detached.push(binding);
        }
    }

    pub fn insert_binding(&mut self, binding: VisualBinding) {
        self.bindings.push(binding);
    }

    pub fn route(&self, marker: VisualId) -> Option<MarkerRoute> {
        self.markers.get(&marker).map(|m| m.route)
    }

    pub fn set_route(&mut self, marker: VisualId, route: MarkerRoute) {
        if let Some(state) = self.markers.get_mut(&marker) {
            state.route = route;
        }
    }

    pub fn center(&self, marker: VisualId) -> Option<LocalPoint> {
        self.markers.get(&marker).map(|m| m.center)
    }

    pub fn spawn_marker(
        &mut self,
        surface: &mut dyn HostSurface,
        label: String,
        center: LocalPoint,
        visible: bool,
        route: MarkerRoute,
    ) -> VisualId {
        let id = surface.add_marker(MarkerSpec {
            label,
            center,
            visible,
        });
        self.markers.insert(id, MarkerState { center, route });
        id
    }

    /// Connector between the current centers of `from` and `to`.
    pub fn spawn_line(
        &mut self,
        surface: &mut dyn HostSurface,
        from: VisualId,
        to: VisualId,
        visible: bool,
    ) -> Option<VisualId> {
        let (a, b) = (self.center(from)?, self.center(to)?);
        Some(surface.add_line(a, b, visible))
    }

    pub fn refresh_line(
        &self,
        surface: &mut dyn HostSurface,
        line: Option<VisualId>,
        markers: &[VisualId],
    ) {
        let (Some(line), [from, to, ..]) = (line, markers) else {
            return;
        };
        if let (Some(a), Some(b)) = (self.center(*from), self.center(*to)) {
            surface.update_line(line, a, b);
        }
    }

    /// Refresh the connector of `action_id`'s binding.
    pub fn refresh_binding_line(&self, surface: &mut dyn HostSurface, action_id: ActionId) {
        if let Some(binding) = self.binding(action_id) {
            self.refresh_line(surface, binding.line, &binding.markers);
        }
    }

    /// Apply a drag delta; returns the marker's route and new center.
    pub fn drag(
        &mut self,
        surface: &mut dyn HostSurface,
        marker: VisualId,
        dx: f32,
        dy: f32,
    ) -> Option<(MarkerRoute, LocalPoint)> {
        let state = self.markers.get_mut(&marker)?;
        state.center = state.center.translate(dx, dy);
        surface.move_marker(marker, state.center);
        Some((state.route, state.center))
    }

    pub fn place(&mut self, surface: &mut dyn HostSurface, marker: VisualId, center: LocalPoint) {
        if let Some(state) = self.markers.get_mut(&marker) {
            state.center = center;
            surface.move_marker(marker, center);
        }
    }

    /// Remove visuals this layer knows about; unknown ids are skipped.
    pub fn remove(&mut self, surface: &mut dyn HostSurface, markers: &[VisualId], line: Option<VisualId>) {
        for marker in markers {
            if self.markers.remove(marker).is_some() {
                surface.remove_visual(*marker);
            }
        }
        if let Some(line) = line {
            surface.remove_visual(line);
        }
    }

    pub fn remove_binding(&mut self, surface: &mut dyn HostSurface, action_id: ActionId) -> bool {
        let Some(index) = self.bindings.iter().position(|b| b.action_id == action_id) else {
            return false;
        };
        let binding = self.bindings.remove(index);
        self.remove(surface, &binding.markers, binding.line);
        true
    }

    pub fn set_visible(&mut self, surface: &mut dyn HostSurface, visible: bool) {
        for binding in self.bindings.iter().chain(&self.detached) {
            for marker in &binding.markers {
                surface.set_visible(*marker, visible);
            }
            if let Some(line) = binding.line {
                surface.set_visible(line, visible);
            }
        }
    }

    /// Build a binding per action that has none yet, points converted into
    /// the surface's current local frame.
    pub fn materialize(&mut self, surface: &mut dyn HostSurface, actions: &[Action], visible: bool) {
        let missing: Vec<&Action> = actions
            .iter()
            .filter(|a| self.binding(a.id).is_none())
            .collect();
        debug!(
            "recreating visuals for {} of {} actions",
            missing.len(),
            actions.len()
        );
        for action in missing {
            let mut markers = Vec::with_capacity(action.points.len());
            for (index, point) in action.points.iter().enumerate() {
                let local = to_local(*point, surface.offset());
                debug!(
                    "action {} point {}: ({}, {}) -> local ({}, {})",
                    action.id, index, point.x, point.y, local.x, local.y
                );
                let marker = self.spawn_marker(
                    surface,
                    action.kind.marker_label(action.id, index),
                    local,
                    visible,
                    MarkerRoute::Committed {
                        action_id: action.id,
                        index,
                    },
                );
                markers.push(marker);
            }
            let line = match markers.as_slice() {
                [from, to] => self.spawn_line(surface, *from, *to, visible),
                _ => None,
            };
            self.bindings.push(VisualBinding {
                action_id: action.id,
                markers,
                line,
            });
        }
    }

    pub fn release_all(&mut self, surface: &mut dyn HostSurface) {
        let mut all = std::mem::take(&mut self.bindings);
        all.append(&mut self.detached);
        for binding in all {
            self.remove(surface, &binding.markers, binding.line);
        }
    }

    pub fn arm_recreate(&mut self) {
        self.recreate_armed = true;
    }

    /// True once per arming.
    pub fn take_recreate(&mut self) -> bool {
        std::mem::replace(&mut self.recreate_armed, false)
    }
}
