//! Authoring state machine
//!
//! Turns marker placement into committed actions. At most one action is
//! pending at a time; starting another creation or edit cancels it first.
//!
//! ```text
//! Idle -> CreatingStep1 -> [CreatingStep2] -> AwaitingConfirm -> Idle
//! Idle -> Editing -> AwaitingConfirm -> Idle
//! ```
//!
//! Every operation runs on the host's UI thread and returns without blocking.
//! Stale ids and concurrent starts are absorbed silently, never reported as
//! errors.

use crate::action::{defaults, Action, ActionId, ActionKind};
use crate::geometry::{to_absolute, to_local, AbsolutePoint, LocalPoint, Offset};
use crate::macro_set::MacroHandle;
use crate::notify::{Notification, Notifier};
use crate::surface::{
    ConfirmationPrompt, FocusLease, HostSurface, InputFocus, NoFocus, PromptRequest, PromptValues,
    SurfaceEvent, VisualId,
};
use crate::visuals::{MarkerRoute, VisualBinding, VisualLayer};
use std::sync::Arc;
use tracing::{debug, info};

/// Authoring configuration
#[derive(Debug, Clone)]
pub struct AuthoringConfig {
    /// Where the end marker of a swipe starts, relative to the start marker
    pub second_marker_offset: (f32, f32),
}

impl Default for AuthoringConfig {
    fn default() -> Self {
        Self {
            second_marker_offset: (200.0, 200.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOrigin {
    Create,
    Edit(ActionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoringState {
    Idle,
    CreatingStep1,
    CreatingStep2,
    Editing,
    AwaitingConfirm(PendingOrigin),
}

/// A pending point stays local until the surface can tell where it is.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DraftPoint {
    Provisional(LocalPoint),
    Settled(AbsolutePoint),
}

impl DraftPoint {
    fn settle(self, offset: Offset) -> AbsolutePoint {
        match self {
            DraftPoint::Provisional(local) => to_absolute(local, offset),
            DraftPoint::Settled(abs) => abs,
        }
    }
}

#[derive(Debug)]
struct Pending {
    origin: PendingOrigin,
    draft: Action,
    points: Vec<DraftPoint>,
    markers: Vec<VisualId>,
    line: Option<VisualId>,
    _focus: FocusLease,
}

pub struct AuthoringSession<S, P> {
    surface: S,
    prompt: P,
    focus: Arc<dyn InputFocus>,
    macros: MacroHandle,
    notifier: Notifier,
    config: AuthoringConfig,
    visuals: VisualLayer,
    pending: Option<Pending>,
    state: AuthoringState,
    setup_mode: bool,
}

impl<S: HostSurface, P: ConfirmationPrompt> AuthoringSession<S, P> {
    pub fn new(surface: S, prompt: P) -> Self {
        Self {
            surface,
            prompt,
            focus: Arc::new(NoFocus),
            macros: MacroHandle::new(),
            notifier: Notifier::disabled(),
            config: AuthoringConfig::default(),
            visuals: VisualLayer::default(),
            pending: None,
            state: AuthoringState::Idle,
            setup_mode: false,
        }
    }

    pub fn with_focus(mut self, focus: Arc<dyn InputFocus>) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_macros(mut self, macros: MacroHandle) -> Self {
        self.macros = macros;
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_config(mut self, config: AuthoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> AuthoringState {
        self.state
    }

    pub fn is_setup_mode(&self) -> bool {
        self.setup_mode
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn macros(&self) -> &MacroHandle {
        &self.macros
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn prompt_mut(&mut self) -> &mut P {
        &mut self.prompt
    }

    pub fn bindings(&self) -> &[VisualBinding] {
        self.visuals.bindings()
    }

    /// Visuals of cleared actions still waiting for
    /// [`release_visuals`](Self::release_visuals).
    pub fn detached_bindings(&self) -> &[VisualBinding] {
        self.visuals.detached()
    }

    /// Ordered copy of the committed actions.
    pub fn actions(&self) -> Vec<Action> {
        self.macros.snapshot()
    }

    /// The action under construction, provisional points resolved against
    /// the current offset.
    pub fn pending_action(&self) -> Option<Action> {
        let pending = self.pending.as_ref()?;
        let offset = self.surface.offset();
        let mut action = pending.draft.clone();
        action.points = pending.points.iter().map(|p| p.settle(offset)).collect();
        Some(action)
    }

    // Creation and editing

    pub fn begin_create(&mut self, kind: ActionKind) {
        if self.pending.is_some() {
            debug!("begin_create({}) cancels the pending operation", kind);
            self.cancel();
        }
        self.toggle_setup_mode(true);
        let focus = FocusLease::acquire(self.focus.clone());
        let label_id = self.macros.read(|m| m.next_id());

        self.state = AuthoringState::CreatingStep1;
        let mut points = Vec::with_capacity(kind.arity());
        let mut markers = Vec::with_capacity(kind.arity());
        let mut line = None;

        if kind.arity() >= 1 {
            let start = self.surface.size().center();
            let marker = self.visuals.spawn_marker(
                &mut self.surface,
                kind.marker_label(label_id, 0),
                start,
                true,
                MarkerRoute::Pending { index: 0 },
            );
            debug!("first marker {:?} at local ({}, {})", marker, start.x, start.y);
            points.push(DraftPoint::Provisional(start));
            markers.push(marker);
        }

        if kind.arity() == 2 {
            self.state = AuthoringState::CreatingStep2;
            let (dx, dy) = self.config.second_marker_offset;
            let end = self.visuals.center(markers[0]).unwrap_or_default().translate(dx, dy);
            let marker = self.visuals.spawn_marker(
                &mut self.surface,
                kind.marker_label(label_id, 1),
                end,
                true,
                MarkerRoute::Pending { index: 1 },
            );
            points.push(DraftPoint::Provisional(end));
            markers.push(marker);
            line = self.visuals.spawn_line(&mut self.surface, markers[0], markers[1], true);
        }

        let draft = Action::new(0, kind, Vec::new());
        self.prompt.show(PromptRequest::for_action(&draft));
        self.pending = Some(Pending {
            origin: PendingOrigin::Create,
            draft,
            points,
            markers,
            line,
            _focus: focus,
        });
        self.state = AuthoringState::AwaitingConfirm(PendingOrigin::Create);
    }

    /// Start editing a committed action. Returns false if it has no action
    /// or no visuals to edit.
    pub fn begin_edit(&mut self, id: ActionId) -> bool {
        let Some(action) = self.macros.get(id) else {
            return false;
        };
        if self.visuals.binding(id).is_none() {
            return false;
        }
        if self.pending.is_some() {
            debug!("begin_edit({}) cancels the pending operation", id);
            self.cancel();
        }
        let Some(binding) = self.visuals.binding(id).cloned() else {
            return false;
        };
        self.toggle_setup_mode(true);
        self.state = AuthoringState::Editing;
        let focus = FocusLease::acquire(self.focus.clone());

        for (index, marker) in binding.markers.iter().enumerate() {
            self.visuals.set_route(*marker, MarkerRoute::Pending { index });
        }
        self.prompt.show(PromptRequest::for_action(&action));
        info!("editing action {}", id);

        self.pending = Some(Pending {
            origin: PendingOrigin::Edit(id),
            points: action.points.iter().copied().map(DraftPoint::Settled).collect(),
            draft: action,
            markers: binding.markers,
            line: binding.line,
            _focus: focus,
        });
        self.state = AuthoringState::AwaitingConfirm(PendingOrigin::Edit(id));
        true
    }

    /// Commit the pending action with the prompt's timing. Returns the id of
    /// the committed action, or `None` if nothing was committed.
    pub fn confirm(&mut self) -> Option<ActionId> {
        let pending = self.pending.take()?;
        let values = self.prompt.values();
        self.prompt.dismiss();
        self.state = AuthoringState::Idle;

        let offset = self.surface.offset();
        let mut action = pending.draft.clone();
        action.points = pending.points.iter().map(|p| p.settle(offset)).collect();
        apply_timing(&mut action, &values);

        match pending.origin {
            PendingOrigin::Create => {
                let id = self.macros.write(|m| m.push(action));
                for (index, marker) in pending.markers.iter().enumerate() {
                    self.visuals.set_route(
                        *marker,
                        MarkerRoute::Committed {
                            action_id: id,
                            index,
                        },
                    );
                }
                self.visuals.insert_binding(VisualBinding {
                    action_id: id,
                    markers: pending.markers.clone(),
                    line: pending.line,
                });
                info!("action {} added", id);
                self.notify_count();
                Some(id)
            }
            PendingOrigin::Edit(id) => {
                action.id = id;
                if self.macros.write(|m| m.replace(action)) {
                    self.rebind_committed(id);
                    info!("action {} updated", id);
                    Some(id)
                } else {
                    debug!("action {} vanished while editing, edit dropped", id);
                    self.visuals.remove_binding(&mut self.surface, id);
                    None
                }
            }
        }
    }

    /// Drop the pending operation. Creation visuals disappear; an edited
    /// action keeps its committed state and its markers move back to it.
    pub fn cancel(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.prompt.dismiss();
        self.state = AuthoringState::Idle;
        match pending.origin {
            PendingOrigin::Create => {
                self.visuals.remove(&mut self.surface, &pending.markers, pending.line);
                debug!("creation cancelled");
            }
            PendingOrigin::Edit(id) => {
                self.restore_binding(id);
                debug!("edit of action {} cancelled", id);
            }
        }
    }

    /// Show or hide all markers. Leaving setup mode cancels whatever is pending.
    pub fn toggle_setup_mode(&mut self, on: bool) {
        let changed = self.setup_mode != on;
        self.setup_mode = on;
        self.visuals.set_visible(&mut self.surface, on);
        if !on && self.pending.is_some() {
            self.cancel();
        }
        if changed {
            self.notifier.send(Notification::SetupModeChanged(on));
        }
    }

    // Macro-level operations

    /// Empty the macro set and restart ids at 1. Visuals stay until
    /// [`release_visuals`](Self::release_visuals) but no longer react to input.
    pub fn clear_all(&mut self) {
        if matches!(self.pending.as_ref().map(|p| p.origin), Some(PendingOrigin::Edit(_))) {
            self.cancel();
        }
        self.macros.write(|m| m.clear());
        self.visuals.detach_all();
        self.notify_count();
    }

    /// Replace the macro set with `actions`. Visuals come back on the next
    /// [`SurfaceEvent::Ready`].
    pub fn load_actions(&mut self, actions: Vec<Action>) -> usize {
        self.release_visuals();
        let loaded = self.macros.write(|m| m.load(actions));
        self.visuals.arm_recreate();
        self.notify_count();
        loaded
    }

    pub fn delete_action(&mut self, id: ActionId) -> Option<Action> {
        let removed = self.macros.write(|m| m.remove(id))?;
        if !matches!(self.pending.as_ref().map(|p| p.origin), Some(PendingOrigin::Edit(e)) if e == id)
        {
            self.visuals.remove_binding(&mut self.surface, id);
        }
        self.notify_count();
        Some(removed)
    }

    pub fn set_enabled(&mut self, id: ActionId, enabled: bool) -> bool {
        let Some(action) = self.macros.get(id) else {
            return false;
        };
        self.macros.write(|m| m.replace(action.with_enabled(enabled)))
    }

    // Visual synchronization

    /// Materialize visuals once the surface reports its next layout.
    pub fn recreate_visuals(&mut self) {
        self.visuals.arm_recreate();
    }

    /// Remove every binding from the surface and cancel any pending work.
    pub fn release_visuals(&mut self) {
        self.cancel();
        self.prompt.dismiss();
        self.visuals.release_all(&mut self.surface);
    }

    pub fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Ready => {
                if self.visuals.take_recreate() {
                    self.sync_visuals();
                }
            }
            SurfaceEvent::MarkerLaidOut(marker) => self.settle_marker(marker),
            SurfaceEvent::Drag { marker, dx, dy } => self.drag_marker(marker, dx, dy),
            SurfaceEvent::Click(marker) => self.click_marker(marker),
        }
    }

    /// Give every committed action its visuals; bound actions only follow
    /// setup mode.
    fn sync_visuals(&mut self) {
        let actions = self.macros.snapshot();
        self.visuals
            .materialize(&mut self.surface, &actions, self.setup_mode);
        self.visuals.set_visible(&mut self.surface, self.setup_mode);
    }

    fn settle_marker(&mut self, marker: VisualId) {
        let Some(MarkerRoute::Pending { index }) = self.visuals.route(marker) else {
            return;
        };
        let Some(center) = self.visuals.center(marker) else {
            return;
        };
        let offset = self.surface.offset();
        if let Some(pending) = self.pending.as_mut() {
            if let Some(point) = pending.points.get_mut(index) {
                if !matches!(point, DraftPoint::Provisional(_)) {
                    return;
                }
                let abs = to_absolute(center, offset);
                *point = DraftPoint::Settled(abs);
                debug!("marker {:?} settled at ({}, {})", marker, abs.x, abs.y);
            }
        }
    }

    fn drag_marker(&mut self, marker: VisualId, dx: f32, dy: f32) {
        if !self.setup_mode {
            return;
        }
        match self.visuals.route(marker) {
            Some(MarkerRoute::Detached) | None => return,
            Some(MarkerRoute::Committed { action_id, .. }) if self.macros.get(action_id).is_none() => {
                return
            }
            _ => {}
        }
        let Some((route, center)) = self.visuals.drag(&mut self.surface, marker, dx, dy) else {
            return;
        };
        let abs = to_absolute(center, self.surface.offset());
        match route {
            MarkerRoute::Pending { index } => {
                let Some(pending) = self.pending.as_mut() else {
                    return;
                };
                if let Some(point) = pending.points.get_mut(index) {
                    *point = DraftPoint::Settled(abs);
                }
                self.visuals
                    .refresh_line(&mut self.surface, pending.line, &pending.markers);
            }
            MarkerRoute::Committed { action_id, index } => {
                self.macros.write(|m| m.update_point(action_id, index, abs));
                self.visuals.refresh_binding_line(&mut self.surface, action_id);
            }
            MarkerRoute::Detached => {}
        }
    }

    fn click_marker(&mut self, marker: VisualId) {
        if !self.setup_mode || self.pending.is_some() {
            return;
        }
        if let Some(MarkerRoute::Committed { action_id, .. }) = self.visuals.route(marker) {
            self.begin_edit(action_id);
        }
    }

    fn rebind_committed(&mut self, id: ActionId) {
        let Some(binding) = self.visuals.binding(id).cloned() else {
            return;
        };
        for (index, marker) in binding.markers.iter().enumerate() {
            self.visuals.set_route(*marker, MarkerRoute::Committed { action_id: id, index });
        }
    }

    fn restore_binding(&mut self, id: ActionId) {
        let Some(action) = self.macros.get(id) else {
            self.visuals.remove_binding(&mut self.surface, id);
            return;
        };
        self.rebind_committed(id);
        let Some(binding) = self.visuals.binding(id).cloned() else {
            return;
        };
        for (marker, point) in binding.markers.iter().zip(&action.points) {
            let local = to_local(*point, self.surface.offset());
            self.visuals.place(&mut self.surface, *marker, local);
        }
        self.visuals.refresh_binding_line(&mut self.surface, id);
    }

    fn notify_count(&self) {
        self.notifier
            .send(Notification::ActionCountChanged(self.macros.len()));
    }
}

/// Fold prompt input into `action`; unparsable fields take the defaults.
fn apply_timing(action: &mut Action, values: &PromptValues) {
    action.delay_after = parse_ms(&values.delay_after).unwrap_or(defaults::DELAY_AFTER_MS);
    if action.kind.prompts_for_duration() {
        action.duration = values
            .duration
            .as_deref()
            .and_then(parse_ms)
            .unwrap_or_else(|| action.kind.default_duration_ms());
    }
}

fn parse_ms(text: &str) -> Option<u64> {
    text.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_falls_back_per_kind() {
        let mut long = Action::new(0, ActionKind::LongClick, Vec::new());
        apply_timing(
            &mut long,
            &PromptValues {
                delay_after: "soon".into(),
                duration: Some("".into()),
            },
        );
        assert_eq!((long.duration, long.delay_after), (1500, 500));

        let mut click = Action::new(0, ActionKind::Click, Vec::new());
        apply_timing(
            &mut click,
            &PromptValues {
                delay_after: " 750 ".into(),
                duration: Some("9000".into()),
            },
        );
        assert_eq!((click.duration, click.delay_after), (100, 750));
    }

    #[test]
    fn provisional_points_settle_with_offset() {
        let p = DraftPoint::Provisional(LocalPoint::new(10.0, 20.0));
        assert_eq!(p.settle(Offset::new(5.0, 5.0)), AbsolutePoint::new(15.0, 25.0));
        let s = DraftPoint::Settled(AbsolutePoint::new(1.0, 1.0));
        assert_eq!(s.settle(Offset::new(5.0, 5.0)), AbsolutePoint::new(1.0, 1.0));
    }
}
