//! Stage controller - one per client
//!
//! Owns the store, the synchronizer, the typing animator, the renderer and
//! the timer queue they share, and turns host events into calls on them.
//! Every mutation of stage membership reconciles the local stage and then
//! publishes the roster; nothing here ever fails the caller.

use std::time::Duration;

use speaker_stage_domain::{ActorId, ActorStageEntry, StageSettings};

use super::broadcast_sync::{BroadcastSync, SyncOutcome};
use super::scheduler::TimerId;
use super::stage_renderer::StageRenderer;
use super::stage_store::StageStore;
use super::tasks::{StageTask, StageTimers};
use super::typing_animator::{DialogueLine, TypingAnimator, TypingContext};
use crate::application::dto::{BackstagePortrait, LocalUser};
use crate::ports::outbound::{ChatMessage, DomMutation, StagePorts};

/// Shown when a player without a character asks to go on stage
pub const NO_CHARACTER_WARNING: &str = "You have no character assigned.";

/// Quiet period before a viewport resize is applied
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Host events a controller reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum StageCommand {
    ToggleStage,
    BackstageLeftClick(ActorId),
    BackstageRightClick(ActorId),
    PlayerActorClick,
    PlayerActorRemove,
    Chat(ChatMessage),
    EmotionsChanged,
    ViewportResized,
}

pub struct StageController {
    user: LocalUser,
    ports: StagePorts,
    store: StageStore,
    sync: BroadcastSync,
    animator: TypingAnimator,
    renderer: StageRenderer,
    timers: StageTimers,
    stage_visible: bool,
    resize_timer: Option<TimerId>,
}

impl StageController {
    pub fn new(user: LocalUser, ports: StagePorts) -> Self {
        let sync = BroadcastSync::new(user.id.clone());
        Self {
            user,
            ports,
            store: StageStore::new(),
            sync,
            animator: TypingAnimator::new(),
            renderer: StageRenderer::new(),
            timers: StageTimers::new(),
            stage_visible: false,
            resize_timer: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn user(&self) -> &LocalUser {
        &self.user
    }

    pub fn store(&self) -> &StageStore {
        &self.store
    }

    pub fn renderer(&self) -> &StageRenderer {
        &self.renderer
    }

    pub fn animator(&self) -> &TypingAnimator {
        &self.animator
    }

    pub fn is_stage_visible(&self) -> bool {
        self.stage_visible
    }

    // =========================================================================
    // Time
    // =========================================================================

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// When the next scheduled task is due
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Run everything due up to `now_ms`
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some((_, task)) = self.timers.pop_due(now_ms) {
            self.run_task(task);
        }
        self.timers.settle(now_ms);
    }

    pub fn advance_by(&mut self, elapsed: Duration) {
        let target = self.now_ms().saturating_add(elapsed.as_millis() as u64);
        self.advance_to(target);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn execute(&mut self, command: StageCommand) {
        match command {
            StageCommand::ToggleStage => {
                self.toggle_stage();
            }
            StageCommand::BackstageLeftClick(actor_id) => self.backstage_left_click(&actor_id),
            StageCommand::BackstageRightClick(actor_id) => self.backstage_right_click(&actor_id),
            StageCommand::PlayerActorClick => self.player_actor_click(),
            StageCommand::PlayerActorRemove => self.player_actor_remove(),
            StageCommand::Chat(message) => self.on_chat_message(&message),
            StageCommand::EmotionsChanged => self.refresh_emotions(),
            StageCommand::ViewportResized => self.on_viewport_resize(),
        }
    }

    /// Show or hide the stage on this client only
    pub fn toggle_stage(&mut self) -> bool {
        self.stage_visible = !self.stage_visible;
        if self.stage_visible {
            self.ports.view.apply(DomMutation::ShowOverlay);
            self.reconcile();
        } else {
            self.ports.view.apply(DomMutation::HideOverlay);
        }
        tracing::info!(visible = self.stage_visible, "Stage toggled");
        self.stage_visible
    }

    /// Registered speakers for the GM backstage
    pub fn backstage_roster(&self) -> Vec<BackstagePortrait> {
        if !self.user.is_gm {
            return Vec::new();
        }
        self.ports
            .directory
            .registered_speakers()
            .into_iter()
            .filter_map(|actor_id| {
                let record = self.ports.directory.lookup(&actor_id)?;
                let portrait = self
                    .ports
                    .emotions
                    .saved_emotion(&actor_id)
                    .and_then(|e| e.emotion_portrait)
                    .unwrap_or(record.portrait);
                Some(BackstagePortrait {
                    on_stage: self.store.has(&actor_id),
                    actor_id,
                    name: record.name,
                    portrait,
                })
            })
            .collect()
    }

    /// Select an on-stage actor, or bring it on stage and select it
    pub fn backstage_left_click(&mut self, actor_id: &ActorId) {
        if self.ports.directory.lookup(actor_id).is_none() {
            return;
        }
        if self.store.has(actor_id) {
            self.ports.selector.select(actor_id);
            return;
        }
        if self.place_on_stage(actor_id) {
            self.ports.selector.select(actor_id);
            self.commit();
        }
    }

    /// Toggle an actor on or off stage
    pub fn backstage_right_click(&mut self, actor_id: &ActorId) {
        if self.ports.directory.lookup(actor_id).is_none() {
            return;
        }
        if self.store.remove(actor_id).is_none() {
            if !self.place_on_stage(actor_id) {
                return;
            }
            self.ports.selector.select(actor_id);
        }
        self.commit();
    }

    /// Bring the player's own character on stage, or select it if already there
    pub fn player_actor_click(&mut self) {
        let Some(character) = self.user.character.clone() else {
            self.ports.notifier.warn(NO_CHARACTER_WARNING);
            return;
        };
        if self.ports.directory.lookup(&character).is_none() {
            return;
        }
        if !self.store.has(&character) && self.place_on_stage(&character) {
            self.commit();
        }
        self.ports.selector.select(&character);
    }

    /// Take the player's own character off stage
    pub fn player_actor_remove(&mut self) {
        let Some(character) = self.user.character.clone() else {
            return;
        };
        if self.store.remove(&character).is_some() {
            self.commit();
        }
    }

    /// Type an in-character line into the speaker's dialogue box
    pub fn on_chat_message(&mut self, message: &ChatMessage) {
        if !self.ports.chat_filter.is_in_character(message)
            || message.has_roll
            || message.has_flavor
            || message.is_whisper
        {
            return;
        }
        let Some(actor_id) = message.actor_id.as_ref() else {
            return;
        };
        if !self.store.has(actor_id) {
            return;
        }
        if !self.ports.view.is_mounted() || !self.renderer.has_wrapper(actor_id) {
            tracing::debug!(actor_id = %actor_id, "No dialogue box for speaker");
            return;
        }

        let settings = self.ports.settings.stage_settings();
        let line = DialogueLine::parse(&message.content);
        let mut ctx = TypingContext {
            view: self.ports.view.as_mut(),
            timers: &mut self.timers,
            sound: self.ports.sound.as_ref(),
            settings: &settings,
        };
        self.animator
            .start(actor_id.clone(), line, settings.typing_speed_ms, &mut ctx);
    }

    /// Re-read saved emotions for entries this client may change
    pub fn refresh_emotions(&mut self) {
        let mut changed = false;

        for entry in self.store.iter_mut() {
            if !entry.emotion_writable_by(&self.user.id) {
                continue;
            }
            let emotion = self.ports.emotions.saved_emotion(&entry.actor_id);
            let portrait = emotion.as_ref().and_then(|e| e.emotion_portrait.clone());
            if entry.emotion_portrait == portrait {
                continue;
            }

            changed = true;
            entry.emotion_id = emotion.and_then(|e| e.emotion_id);
            entry.image = portrait
                .clone()
                .or_else(|| {
                    self.ports
                        .directory
                        .lookup(&entry.actor_id)
                        .map(|record| record.portrait)
                })
                .unwrap_or_else(|| entry.image.clone());
            entry.emotion_portrait = portrait;
            entry.emotion_owner_user_id = Some(self.user.id.clone());
            tracing::debug!(actor_id = %entry.actor_id, image = %entry.image, "Emotion changed");
        }

        for entry in self.store.all() {
            self.renderer
                .refresh_image(&entry.actor_id, &entry.image, self.ports.view.as_mut());
        }

        if changed {
            self.publish();
        }
    }

    /// Apply a payload from the broadcast channel
    pub fn on_broadcast(&mut self, topic: &str, payload: &serde_json::Value) -> SyncOutcome {
        let outcome = self.sync.receive(topic, payload, &mut self.store);
        if outcome.is_applied() {
            self.cancel_absent();
            if self.stage_visible {
                self.reconcile();
            } else {
                tracing::debug!("Stage hidden; deferring reconcile until shown");
            }
        }
        outcome
    }

    /// Recompute dialogue widths once resizing settles
    pub fn on_viewport_resize(&mut self) {
        if let Some(pending) = self.resize_timer.take() {
            self.timers.cancel(pending);
        }
        self.resize_timer = Some(self.timers.schedule(RESIZE_DEBOUNCE, StageTask::ApplyResize));
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn place_on_stage(&mut self, actor_id: &ActorId) -> bool {
        let Some(record) = self.ports.directory.lookup(actor_id) else {
            return false;
        };
        let emotion = self.ports.emotions.saved_emotion(actor_id);
        let entry = ActorStageEntry::placed_by(
            record.id,
            record.name,
            record.portrait,
            emotion,
            self.user.id.clone(),
        );
        self.store.put(entry);
        true
    }

    /// Reconcile and publish after a local change
    fn commit(&mut self) {
        self.cancel_absent();
        self.reconcile();
        self.publish();
    }

    fn reconcile(&mut self) {
        self.renderer
            .reconcile(self.store.all(), self.ports.view.as_mut(), &mut self.timers);
    }

    /// Stop typing for actors that left the store, rendered or not
    fn cancel_absent(&mut self) {
        let store = &self.store;
        let stopped = self
            .animator
            .retain(|actor_id| store.has(actor_id), &mut self.timers);
        if !stopped.is_empty() {
            tracing::debug!(actors = stopped.len(), "Typing stopped for departed actors");
        }
    }

    fn publish(&mut self) {
        if let Err(e) = self.sync.publish(&mut self.store, self.ports.channel.as_ref()) {
            tracing::warn!(error = %e, "Stage roster not published");
        }
    }

    fn run_task(&mut self, task: StageTask) {
        match task {
            StageTask::Typing(task) => {
                let settings: StageSettings = self.ports.settings.stage_settings();
                let mut ctx = TypingContext {
                    view: self.ports.view.as_mut(),
                    timers: &mut self.timers,
                    sound: self.ports.sound.as_ref(),
                    settings: &settings,
                };
                self.animator.handle(task, &mut ctx);
            }
            StageTask::Render(task) => {
                self.renderer.handle(
                    task,
                    self.store.all(),
                    self.ports.view.as_mut(),
                    &mut self.timers,
                );
            }
            StageTask::ApplyResize => {
                self.resize_timer = None;
                if self.stage_visible {
                    self.reconcile();
                }
            }
        }
    }
}
