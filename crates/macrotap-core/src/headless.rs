//! In-memory surface, prompt and focus
//!
//! Used by the CLI to author actions without a display, and by tests to
//! drive the state machine and inspect what would be on screen.

use crate::geometry::{LocalPoint, Offset, Size};
use crate::surface::{
    ConfirmationPrompt, HostSurface, InputFocus, MarkerSpec, PromptRequest, PromptValues, VisualId,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    Marker {
        label: String,
        center: LocalPoint,
        visible: bool,
    },
    Line {
        from: LocalPoint,
        to: LocalPoint,
        visible: bool,
    },
}

impl Visual {
    pub fn is_visible(&self) -> bool {
        match self {
            Visual::Marker { visible, .. } | Visual::Line { visible, .. } => *visible,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    offset: Offset,
    size: Size,
    visuals: BTreeMap<VisualId, Visual>,
    next_id: u64,
}

impl HeadlessSurface {
    pub fn new(size: Size) -> Self {
        Self {
            offset: Offset::default(),
            size,
            visuals: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    /// Move the whole surface on screen, as when the user drags the overlay.
    pub fn set_offset(&mut self, offset: Offset) {
        self.offset = offset;
    }

    pub fn visual(&self, id: VisualId) -> Option<&Visual> {
        self.visuals.get(&id)
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn marker_ids(&self) -> Vec<VisualId> {
        self.visuals
            .iter()
            .filter(|(_, v)| matches!(v, Visual::Marker { .. }))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn line_ids(&self) -> Vec<VisualId> {
        self.visuals
            .iter()
            .filter(|(_, v)| matches!(v, Visual::Line { .. }))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn marker_center(&self, id: VisualId) -> Option<LocalPoint> {
        match self.visuals.get(&id)? {
            Visual::Marker { center, .. } => Some(*center),
            Visual::Line { .. } => None,
        }
    }

    pub fn marker_label(&self, id: VisualId) -> Option<&str> {
        match self.visuals.get(&id)? {
            Visual::Marker { label, .. } => Some(label),
            Visual::Line { .. } => None,
        }
    }

    pub fn line_ends(&self, id: VisualId) -> Option<(LocalPoint, LocalPoint)> {
        match self.visuals.get(&id)? {
            Visual::Line { from, to, .. } => Some((*from, *to)),
            Visual::Marker { .. } => None,
        }
    }
}

impl HostSurface for HeadlessSurface {
    fn offset(&self) -> Offset {
        self.offset
    }

    fn size(&self) -> Size {
        self.size
    }

    fn add_marker(&mut self, spec: MarkerSpec) -> VisualId {
        let id = VisualId(self.next_id);
        self.next_id += 1;
        self.visuals.insert(
            id,
            Visual::Marker {
                label: spec.label,
                center: spec.center,
                visible: spec.visible,
            },
        );
        id
    }

    fn add_line(&mut self, from: LocalPoint, to: LocalPoint, visible: bool) -> VisualId {
        let id = VisualId(self.next_id);
        self.next_id += 1;
        self.visuals.insert(id, Visual::Line { from, to, visible });
        id
    }

    fn move_marker(&mut self, id: VisualId, to: LocalPoint) {
        if let Some(Visual::Marker { center, .. }) = self.visuals.get_mut(&id) {
            *center = to;
        }
    }

    fn update_line(&mut self, id: VisualId, new_from: LocalPoint, new_to: LocalPoint) {
        if let Some(Visual::Line { from, to, .. }) = self.visuals.get_mut(&id) {
            *from = new_from;
            *to = new_to;
        }
    }

    fn set_visible(&mut self, id: VisualId, on: bool) {
        match self.visuals.get_mut(&id) {
            Some(Visual::Marker { visible, .. }) | Some(Visual::Line { visible, .. }) => *visible = on,
            None => {}
        }
    }

    fn remove_visual(&mut self, id: VisualId) {
        self.visuals.remove(&id);
    }
}

/// Prompt whose fields are filled in programmatically.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPrompt {
    request: Option<PromptRequest>,
    fields: PromptValues,
    shown: usize,
}

impl HeadlessPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_showing(&self) -> bool {
        self.request.is_some()
    }

    pub fn request(&self) -> Option<&PromptRequest> {
        self.request.as_ref()
    }

    /// How many times a prompt was shown.
    pub fn times_shown(&self) -> usize {
        self.shown
    }

    pub fn type_delay_after(&mut self, text: &str) {
        self.fields.delay_after = text.to_string();
    }

    pub fn type_duration(&mut self, text: &str) {
        self.fields.duration = Some(text.to_string());
    }
}

impl ConfirmationPrompt for HeadlessPrompt {
    fn show(&mut self, request: PromptRequest) {
        self.fields = PromptValues {
            delay_after: request.delay_after.to_string(),
            duration: request.duration.map(|d| d.to_string()),
        };
        self.request = Some(request);
        self.shown += 1;
    }

    fn values(&self) -> PromptValues {
        self.fields.clone()
    }

    fn dismiss(&mut self) {
        self.request = None;
    }
}

/// Focus that counts outstanding holds.
#[derive(Debug, Default)]
pub struct CountingFocus {
    held: AtomicI64,
}

impl CountingFocus {
    pub fn held(&self) -> i64 {
        self.held.load(Ordering::SeqCst)
    }
}

impl InputFocus for CountingFocus {
    fn acquire(&self) {
        self.held.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.held.fetch_sub(1, Ordering::SeqCst);
    }
}
