//! Desktop adapters
//!
//! There is no DOM, speaker or toast on a terminal, so every side effect
//! becomes a tracing event. The stage view still keeps enough state to
//! report what is on screen.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use speaker_stage_domain::ActorId;

use crate::ports::outbound::{
    DomMutation, LayoutMetrics, Notifier, PortError, SoundPlayer, SpeakerSelector, StageView,
};

/// Stage view that logs mutations and remembers dialogue per actor
#[derive(Debug, Clone, Default)]
pub struct DesktopStageView {
    metrics: LayoutMetrics,
    dialogue: Arc<RwLock<HashMap<ActorId, String>>>,
}

impl DesktopStageView {
    pub fn new(metrics: LayoutMetrics) -> Self {
        Self {
            metrics,
            dialogue: Arc::default(),
        }
    }

    /// Dialogue html currently shown for an actor
    pub fn dialogue(&self, actor_id: &ActorId) -> Option<String> {
        self.dialogue
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(actor_id)
            .cloned()
    }
}

impl StageView for DesktopStageView {
    fn is_mounted(&self) -> bool {
        true
    }

    fn measure(&self) -> LayoutMetrics {
        self.metrics
    }

    fn apply(&mut self, mutation: DomMutation) {
        match &mutation {
            DomMutation::SetDialogueHtml { actor_id, html } => {
                self.dialogue
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(actor_id.clone(), html.clone());
                tracing::trace!(actor_id = %actor_id, html = %html, "Dialogue");
            }
            DomMutation::Detach { actor_id } => {
                self.dialogue
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(actor_id);
                tracing::debug!(actor_id = %actor_id, "Detach wrapper");
            }
            other => tracing::debug!(mutation = ?other, "Stage mutation"),
        }
    }
}

/// Sound player that logs instead of playing
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopSoundPlayer;

impl SoundPlayer for DesktopSoundPlayer {
    fn play(&self, sound: &str, volume: f32) -> Result<(), PortError> {
        tracing::trace!(sound, volume, "Typing sound");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn warn(&self, message: &str) {
        tracing::warn!(notice = message, "User notice");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopSpeakerSelector;

impl SpeakerSelector for DesktopSpeakerSelector {
    fn select(&self, actor_id: &ActorId) {
        tracing::info!(actor_id = %actor_id, "Speaker selected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_tracks_dialogue_until_detach() {
        let mut view = DesktopStageView::default();
        let actor = ActorId::new("a");

        view.apply(DomMutation::SetDialogueHtml {
            actor_id: actor.clone(),
            html: "<em>hi</em>".into(),
        });
        assert_eq!(view.dialogue(&actor).as_deref(), Some("<em>hi</em>"));

        view.apply(DomMutation::Detach {
            actor_id: actor.clone(),
        });
        assert_eq!(view.dialogue(&actor), None);
    }
}
