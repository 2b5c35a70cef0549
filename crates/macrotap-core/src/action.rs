//! Gesture steps
//!
//! An [`Action`] is a value: edits build a new one and replace the old one by
//! id. Serialized field names match the preset JSON format.

use crate::error::{Error, Result};
use crate::geometry::AbsolutePoint;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ActionId = u32;

/// Default timings, also the fallbacks for unparsable prompt input.
pub mod defaults {
    pub const CLICK_DURATION_MS: u64 = 100;
    pub const LONG_CLICK_DURATION_MS: u64 = 1500;
    pub const SWIPE_DURATION_MS: u64 = 100;
    pub const WAIT_DURATION_MS: u64 = 1000;
    pub const DELAY_BEFORE_MS: u64 = 0;
    pub const DELAY_AFTER_MS: u64 = 500;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Click,
    Swipe,
    LongClick,
    Wait,
}

impl ActionKind {
    /// Number of points an action of this kind carries.
    pub fn arity(self) -> usize {
        match self {
            ActionKind::Wait => 0,
            ActionKind::Click | ActionKind::LongClick => 1,
            ActionKind::Swipe => 2,
        }
    }

    pub fn default_duration_ms(self) -> u64 {
        match self {
            ActionKind::Click => defaults::CLICK_DURATION_MS,
            ActionKind::LongClick => defaults::LONG_CLICK_DURATION_MS,
            ActionKind::Swipe => defaults::SWIPE_DURATION_MS,
            ActionKind::Wait => defaults::WAIT_DURATION_MS,
        }
    }

    /// Whether the confirmation prompt asks for a duration.
    pub fn prompts_for_duration(self) -> bool {
        match self {
            ActionKind::LongClick | ActionKind::Wait => true,
            ActionKind::Click | ActionKind::Swipe => false,
        }
    }

    /// Marker caption for point `index` of action `id`.
    pub fn marker_label(self, id: ActionId, index: usize) -> String {
        match self {
            ActionKind::Click => format!("Click {}", id),
            ActionKind::LongClick => format!("Long press {}", id),
            ActionKind::Swipe if index == 0 => format!("Swipe {} start", id),
            ActionKind::Swipe => format!("Swipe {} end", id),
            ActionKind::Wait => format!("Wait {}", id),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Click => "click",
            ActionKind::Swipe => "swipe",
            ActionKind::LongClick => "long-click",
            ActionKind::Wait => "wait",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: ActionId,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub points: Vec<AbsolutePoint>,
    /// Press/hold/swipe time, or the pause itself for `Wait` (ms)
    #[serde(default = "default_duration")]
    pub duration: u64,
    #[serde(default)]
    pub delay_before: u64,
    #[serde(default = "default_delay_after")]
    pub delay_after: u64,
    #[serde(default = "default_enabled", rename = "isEnabled")]
    pub enabled: bool,
}

fn default_duration() -> u64 {
    defaults::CLICK_DURATION_MS
}

fn default_delay_after() -> u64 {
    defaults::DELAY_AFTER_MS
}

fn default_enabled() -> bool {
    true
}

impl Action {
    /// New enabled action with the kind's default timing.
    pub fn new(id: ActionId, kind: ActionKind, points: Vec<AbsolutePoint>) -> Self {
        Self {
            id,
            kind,
            points,
            duration: kind.default_duration_ms(),
            delay_before: defaults::DELAY_BEFORE_MS,
            delay_after: defaults::DELAY_AFTER_MS,
            enabled: true,
        }
    }

    pub fn click(id: ActionId, at: AbsolutePoint) -> Self {
        Self::new(id, ActionKind::Click, vec![at])
    }

    pub fn long_click(id: ActionId, at: AbsolutePoint) -> Self {
        Self::new(id, ActionKind::LongClick, vec![at])
    }

    pub fn swipe(id: ActionId, from: AbsolutePoint, to: AbsolutePoint) -> Self {
        Self::new(id, ActionKind::Swipe, vec![from, to])
    }

    pub fn wait(id: ActionId, duration_ms: u64) -> Self {
        Self {
            duration: duration_ms,
            ..Self::new(id, ActionKind::Wait, Vec::new())
        }
    }

    pub fn with_timing(mut self, duration: u64, delay_after: u64) -> Self {
        self.duration = duration;
        self.delay_after = delay_after;
        self
    }

    pub fn with_delay_before(mut self, delay_before: u64) -> Self {
        self.delay_before = delay_before;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Copy with point `index` replaced; `None` if the index is out of range.
    pub fn with_point(&self, index: usize, point: AbsolutePoint) -> Option<Self> {
        if index >= self.points.len() {
            return None;
        }
        let mut next = self.clone();
        next.points[index] = point;
        Some(next)
    }

    pub fn validate(&self) -> Result<()> {
        let expected = self.kind.arity();
        if self.points.len() != expected {
            return Err(Error::invalid_action(format!(
                "{} action {} has {} points, expected {}",
                self.kind,
                self.id,
                self.points.len(),
                expected
            )));
        }
        Ok(())
    }
}
