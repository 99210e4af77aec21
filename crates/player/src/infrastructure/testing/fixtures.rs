//! Recording collaborators
//!
//! Each fixture is a cheap handle: clone it, hand one clone to a controller
//! and keep the other to inspect what happened.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use speaker_stage_domain::ActorId;

use crate::ports::outbound::{
    BroadcastChannel, DomMutation, LayoutMetrics, Notifier, PortError, SoundPlayer,
    SpeakerSelector, StageView, WrapperPhase,
};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Stage View
// =============================================================================

#[derive(Debug)]
struct ViewState {
    mounted: bool,
    metrics: LayoutMetrics,
    mutations: Vec<DomMutation>,
}

/// Stage view that records every mutation
#[derive(Debug, Clone)]
pub struct RecordingView {
    state: Arc<Mutex<ViewState>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState {
                mounted: true,
                metrics: LayoutMetrics::default(),
                mutations: Vec::new(),
            })),
        }
    }

    pub fn set_mounted(&self, mounted: bool) {
        locked(&self.state).mounted = mounted;
    }

    pub fn set_metrics(&self, metrics: LayoutMetrics) {
        locked(&self.state).metrics = metrics;
    }

    /// Everything applied so far
    pub fn mutations(&self) -> Vec<DomMutation> {
        locked(&self.state).mutations.clone()
    }

    /// Everything applied so far, clearing the log
    pub fn take(&self) -> Vec<DomMutation> {
        std::mem::take(&mut locked(&self.state).mutations)
    }

    pub fn len(&self) -> usize {
        locked(&self.state).mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutations touching one actor's wrapper
    pub fn for_actor(&self, actor_id: &ActorId) -> Vec<DomMutation> {
        locked(&self.state)
            .mutations
            .iter()
            .filter(|m| m.actor_id() == Some(actor_id))
            .cloned()
            .collect()
    }

    /// Phases an actor's wrapper went through, mount phase included
    pub fn phases(&self, actor_id: &ActorId) -> Vec<WrapperPhase> {
        self.for_actor(actor_id)
            .into_iter()
            .filter_map(|m| match m {
                DomMutation::MountWrapper { phase, .. } | DomMutation::SetPhase { phase, .. } => {
                    Some(phase)
                }
                _ => None,
            })
            .collect()
    }

    /// Every dialogue html written for an actor, oldest first
    pub fn dialogue_history(&self, actor_id: &ActorId) -> Vec<String> {
        self.for_actor(actor_id)
            .into_iter()
            .filter_map(|m| match m {
                DomMutation::SetDialogueHtml { html, .. } => Some(html),
                _ => None,
            })
            .collect()
    }

    pub fn dialogue_html(&self, actor_id: &ActorId) -> Option<String> {
        self.dialogue_history(actor_id).pop()
    }

    pub fn dialogue_opacity(&self, actor_id: &ActorId) -> Option<f32> {
        self.for_actor(actor_id)
            .into_iter()
            .filter_map(|m| match m {
                DomMutation::SetDialogueOpacity { opacity, .. } => Some(opacity),
                _ => None,
            })
            .last()
    }

    /// Whether the overlay is currently shown
    pub fn overlay_shown(&self) -> bool {
        locked(&self.state)
            .mutations
            .iter()
            .rev()
            .find_map(|m| match m {
                DomMutation::ShowOverlay => Some(true),
                DomMutation::HideOverlay => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Actors whose wrappers are mounted and not yet detached
    pub fn mounted_actors(&self) -> Vec<ActorId> {
        let mut mounted: Vec<ActorId> = Vec::new();
        for mutation in locked(&self.state).mutations.iter() {
            match mutation {
                DomMutation::MountWrapper { actor_id, .. } => mounted.push(actor_id.clone()),
                DomMutation::Detach { actor_id } => mounted.retain(|id| id != actor_id),
                _ => {}
            }
        }
        mounted
    }
}

impl Default for RecordingView {
    fn default() -> Self {
        Self::new()
    }
}

impl StageView for RecordingView {
    fn is_mounted(&self) -> bool {
        locked(&self.state).mounted
    }

    fn measure(&self) -> LayoutMetrics {
        locked(&self.state).metrics
    }

    fn apply(&mut self, mutation: DomMutation) {
        locked(&self.state).mutations.push(mutation);
    }
}

// =============================================================================
// Broadcast Channel
// =============================================================================

/// Broadcast channel that keeps what was sent
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    sent: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later send fail
    pub fn fail_sends(&self, failing: bool) {
        *locked(&self.failing) = failing;
    }

    pub fn sent(&self) -> Vec<(String, serde_json::Value)> {
        locked(&self.sent).clone()
    }

    pub fn take(&self) -> Vec<(String, serde_json::Value)> {
        std::mem::take(&mut *locked(&self.sent))
    }

    pub fn count(&self) -> usize {
        locked(&self.sent).len()
    }
}

impl BroadcastChannel for RecordingChannel {
    fn send(&self, topic: &str, payload: serde_json::Value) -> Result<(), PortError> {
        if *locked(&self.failing) {
            return Err(PortError::broadcast(topic, "channel unavailable"));
        }
        locked(&self.sent).push((topic.to_string(), payload));
        Ok(())
    }
}

// =============================================================================
// Side Effects
// =============================================================================

/// Sound player that counts plays per sound
#[derive(Debug, Clone, Default)]
pub struct RecordingSoundPlayer {
    plays: Arc<Mutex<HashMap<String, usize>>>,
}

impl RecordingSoundPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plays(&self, sound: &str) -> usize {
        locked(&self.plays).get(sound).copied().unwrap_or(0)
    }
}

impl SoundPlayer for RecordingSoundPlayer {
    fn play(&self, sound: &str, _volume: f32) -> Result<(), PortError> {
        *locked(&self.plays).entry(sound.to_string()).or_default() += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSelector {
    selected: Arc<Mutex<Vec<ActorId>>>,
}

impl RecordingSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Vec<ActorId> {
        locked(&self.selected).clone()
    }
}

impl SpeakerSelector for RecordingSelector {
    fn select(&self, actor_id: &ActorId) {
        locked(&self.selected).push(actor_id.clone());
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    warnings: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        locked(&self.warnings).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn warn(&self, message: &str) {
        locked(&self.warnings).push(message.to_string());
    }
}
