//! Input model: interaction modes, mouse buttons, keys, and the drag state machine.
//!
//! `InteractionMode` decides what a pointer-down on empty map space does.
//! `DragState` is the gesture tracked between pointer-down and pointer-up;
//! it is the only thing that makes pointer-move mutate state.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::{AnnotationId, VertexRef};
use crate::hit::Hit;

/// What a pointer-down on empty map space does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Drag to pan the view (default).
    #[default]
    Pan,
    /// Click to place a marker.
    PlaceMarker,
    /// Click to add polygon vertices; double-click finishes.
    DrawPolygon,
}

impl InteractionMode {
    /// Parse a host-supplied mode name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pan" => Some(Self::Pan),
            "marker" => Some(Self::PlaceMarker),
            "polygon" => Some(Self::DrawPolygon),
            _ => None,
        }
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button; always pans.
    Middle,
    /// Right mouse button; ignored.
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// A keyboard key as reported by the browser (e.g. `"Escape"`, `"Delete"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiState {
    pub mode: InteractionMode,
    /// The annotation last picked by a pointer-down, if any.
    pub selected: Option<Hit>,
}

/// Gesture in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Moving a marker.
    DraggingMarker { id: AnnotationId },
    /// Moving one polygon vertex.
    DraggingVertex { vertex: VertexRef },
    /// Panning the view.
    Panning {
        /// Screen position at pointer-down.
        start_screen: Point,
        /// Viewport offset at pointer-down.
        start_offset: Point,
    },
}

impl DragState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}
