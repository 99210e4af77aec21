//! Stage view port - the retained DOM the renderer drives.
//!
//! The renderer never reads the view back except for [`StageView::is_mounted`]
//! and [`StageView::measure`]; it keeps its own model of every wrapper and
//! only sends a [`DomMutation`] when that model actually changes.

use serde::{Deserialize, Serialize};
use speaker_stage_domain::{ActorId, StageSlot};

/// Sidebar width assumed when the host sidebar cannot be measured
pub const DEFAULT_SIDEBAR_WIDTH: f64 = 300.0;

/// Measured host layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    pub viewport_width: f64,
    /// `None` when the host sidebar is not rendered
    pub sidebar_width: Option<f64>,
}

impl LayoutMetrics {
    pub fn new(viewport_width: f64, sidebar_width: Option<f64>) -> Self {
        Self {
            viewport_width,
            sidebar_width,
        }
    }

    /// Viewport width minus the sidebar
    pub fn stage_width(&self) -> f64 {
        (self.viewport_width - self.sidebar_width.unwrap_or(DEFAULT_SIDEBAR_WIDTH)).max(0.0)
    }

    /// Dialogue boxes never exceed half the stage
    pub fn max_dialogue_width(&self) -> f64 {
        self.stage_width() / 2.0
    }
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self::new(1920.0, Some(DEFAULT_SIDEBAR_WIDTH))
    }
}

/// Animation phase of a stage wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperPhase {
    /// Mounted at zero width
    Preparing,
    /// Claiming width from its neighbours
    Expanding,
    /// Sliding in
    Entering,
    Steady,
    /// Sliding out
    Leaving,
    /// Giving its width back
    Shrinking,
}

impl WrapperPhase {
    /// Whether the wrapper is on its way out
    pub fn is_removing(&self) -> bool {
        matches!(self, WrapperPhase::Leaving | WrapperPhase::Shrinking)
    }
}

/// One change to the rendered stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomMutation {
    ShowOverlay,
    HideOverlay,
    /// Append a wrapper (portrait, name and empty dialogue box)
    MountWrapper {
        actor_id: ActorId,
        slot: StageSlot,
        phase: WrapperPhase,
        image: String,
        name: String,
        max_dialogue_width: f64,
    },
    /// Force a synchronous layout so the next phase change animates
    FlushLayout { actor_id: ActorId },
    SetPhase {
        actor_id: ActorId,
        phase: WrapperPhase,
    },
    SetSlot { actor_id: ActorId, slot: StageSlot },
    SetImage { actor_id: ActorId, image: String },
    SetDialogueMaxWidth { actor_id: ActorId, width: f64 },
    Detach { actor_id: ActorId },
    SetDialogueHtml { actor_id: ActorId, html: String },
    /// Opacity change, animated over `transition_ms`
    SetDialogueOpacity {
        actor_id: ActorId,
        opacity: f32,
        transition_ms: u64,
    },
}

impl DomMutation {
    /// The wrapper this mutation touches, if any
    pub fn actor_id(&self) -> Option<&ActorId> {
        match self {
            DomMutation::ShowOverlay | DomMutation::HideOverlay => None,
            DomMutation::MountWrapper { actor_id, .. }
            | DomMutation::FlushLayout { actor_id }
            | DomMutation::SetPhase { actor_id, .. }
            | DomMutation::SetSlot { actor_id, .. }
            | DomMutation::SetImage { actor_id, .. }
            | DomMutation::SetDialogueMaxWidth { actor_id, .. }
            | DomMutation::Detach { actor_id }
            | DomMutation::SetDialogueHtml { actor_id, .. }
            | DomMutation::SetDialogueOpacity { actor_id, .. } => Some(actor_id),
        }
    }
}

/// The rendered stage
pub trait StageView: Send {
    /// Whether the overlay attachment point exists yet
    fn is_mounted(&self) -> bool;

    fn measure(&self) -> LayoutMetrics;

    fn apply(&mut self, mutation: DomMutation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialogue_width_is_half_the_stage() {
        let metrics = LayoutMetrics::new(1300.0, Some(300.0));
        assert_eq!(metrics.stage_width(), 1000.0);
        assert_eq!(metrics.max_dialogue_width(), 500.0);
    }

    #[test]
    fn test_missing_sidebar_uses_default_width() {
        let metrics = LayoutMetrics::new(900.0, None);
        assert_eq!(metrics.max_dialogue_width(), 300.0);
    }

    #[test]
    fn test_narrow_viewport_never_goes_negative() {
        let metrics = LayoutMetrics::new(100.0, Some(300.0));
        assert_eq!(metrics.max_dialogue_width(), 0.0);
    }

    #[test]
    fn test_removal_phases() {
        assert!(WrapperPhase::Leaving.is_removing());
        assert!(WrapperPhase::Shrinking.is_removing());
        assert!(!WrapperPhase::Preparing.is_removing());
        assert!(!WrapperPhase::Steady.is_removing());
    }
}
