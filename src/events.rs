//! Gesture event stream
//!
//! The typed output surface of the pipeline. Events are tagged variants so
//! the external action executor (and the replay tooling) can consume them
//! as JSON without string matching.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One user-intent event emitted by the pipeline.
///
/// Coordinates are in pixels of the source camera frame; mapping to screen
/// space belongs to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GestureEvent {
    CursorMove { x: f64, y: f64 },
    Click,
    DoubleClick,
    DragStart,
    DragMove { x: f64, y: f64 },
    DragEnd,
    /// Positive delta scrolls content up (hand moving up).
    Scroll { delta: f64 },
    PauseToggle,
    Confirm,
    Cancel,
    /// `factor` is the separation ratio relative to the last baseline, >= 1.
    ZoomIn { factor: f64 },
    ZoomOut { factor: f64 },
    RotateCw { degrees: f64 },
    RotateCcw { degrees: f64 },
    SwipeLeft,
    SwipeRight,
}

impl GestureEvent {
    /// The cooldown/classification key for this event.
    pub fn kind(&self) -> GestureKind {
        match self {
            GestureEvent::CursorMove { .. } => GestureKind::CursorMove,
            GestureEvent::Click => GestureKind::Click,
            GestureEvent::DoubleClick => GestureKind::DoubleClick,
            GestureEvent::DragStart => GestureKind::DragStart,
            GestureEvent::DragMove { .. } => GestureKind::DragMove,
            GestureEvent::DragEnd => GestureKind::DragEnd,
            GestureEvent::Scroll { .. } => GestureKind::Scroll,
            GestureEvent::PauseToggle => GestureKind::PauseToggle,
            GestureEvent::Confirm => GestureKind::Confirm,
            GestureEvent::Cancel => GestureKind::Cancel,
            GestureEvent::ZoomIn { .. } => GestureKind::ZoomIn,
            GestureEvent::ZoomOut { .. } => GestureKind::ZoomOut,
            GestureEvent::RotateCw { .. } => GestureKind::RotateCw,
            GestureEvent::RotateCcw { .. } => GestureKind::RotateCcw,
            GestureEvent::SwipeLeft => GestureKind::SwipeLeft,
            GestureEvent::SwipeRight => GestureKind::SwipeRight,
        }
    }
}

/// Payload-free classification of gesture events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    CursorMove,
    Click,
    DoubleClick,
    DragStart,
    DragMove,
    DragEnd,
    Scroll,
    PauseToggle,
    Confirm,
    Cancel,
    ZoomIn,
    ZoomOut,
    RotateCw,
    RotateCcw,
    SwipeLeft,
    SwipeRight,
}

impl GestureKind {
    /// Discrete kinds fire once and are cooldown-gated. Continuous kinds
    /// repeat every qualifying tick. Drag start/end are session delimiters
    /// and belong to neither bucket.
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            GestureKind::Click
                | GestureKind::DoubleClick
                | GestureKind::PauseToggle
                | GestureKind::Confirm
                | GestureKind::Cancel
                | GestureKind::RotateCw
                | GestureKind::RotateCcw
                | GestureKind::SwipeLeft
                | GestureKind::SwipeRight
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::CursorMove => "cursorMove",
            GestureKind::Click => "click",
            GestureKind::DoubleClick => "doubleClick",
            GestureKind::DragStart => "dragStart",
            GestureKind::DragMove => "dragMove",
            GestureKind::DragEnd => "dragEnd",
            GestureKind::Scroll => "scroll",
            GestureKind::PauseToggle => "pauseToggle",
            GestureKind::Confirm => "confirm",
            GestureKind::Cancel => "cancel",
            GestureKind::ZoomIn => "zoomIn",
            GestureKind::ZoomOut => "zoomOut",
            GestureKind::RotateCw => "rotateCw",
            GestureKind::RotateCcw => "rotateCcw",
            GestureKind::SwipeLeft => "swipeLeft",
            GestureKind::SwipeRight => "swipeRight",
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
