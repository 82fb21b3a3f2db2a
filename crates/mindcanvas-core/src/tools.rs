//! Interaction modes and transient interaction state.

use crate::entities::StrokeId;

/// Available editing modes. Only the handlers for the active mode receive
/// pointer input, so dragging and drawing never interleave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pen,
    Eraser,
}

impl ToolKind {
    /// Keyboard shortcut for switching to a mode.
    pub fn from_shortcut(key: &str) -> Option<Self> {
        match key {
            "v" | "V" => Some(ToolKind::Select),
            "p" | "P" => Some(ToolKind::Pen),
            "e" | "E" => Some(ToolKind::Eraser),
            _ => None,
        }
    }
}

/// Runtime interaction state. Never part of a persisted snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    /// Current editing mode.
    pub mode: ToolKind,
    /// Stroke currently being captured, if any.
    pub drawing: Option<StrokeId>,
    /// Whether the background is being panned.
    pub is_panning: bool,
}
