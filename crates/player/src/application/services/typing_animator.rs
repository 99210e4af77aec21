//! Typing Animator - reveals dialogue one character at a time
//!
//! Each actor has at most one typing session and at most one auto-clear
//! timer. Starting a new line cancels both before anything is written, so
//! two timer chains never write the same dialogue box.
//!
//! ## Timeline for one line
//!
//! - `start`: box emptied, opacity restored, first character shown
//! - every `ms_per_char`: next character, rendered from the parsed markup
//! - one tick after the last character: the full line's final html
//! - `text_clear_delay_secs` later (if enabled): fade to transparent
//! - [`FADE_DURATION`] after that: box emptied, opacity restored

use std::collections::HashMap;
use std::time::Duration;

use speaker_stage_domain::{ActorId, Markup, StageSettings};

use super::scheduler::TimerId;
use super::tasks::{StageTimers, TypingTask};
use crate::ports::outbound::{DomMutation, SoundPlayer, StageView};

/// Opacity transition when auto-clearing a dialogue box
pub const FADE_DURATION: Duration = Duration::from_millis(500);

/// One chat line, parsed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueLine {
    markup: Markup,
    plain: Vec<char>,
    final_html: String,
}

impl DialogueLine {
    pub fn parse(raw: &str) -> Self {
        Self::from_markup(Markup::parse(raw))
    }

    pub fn from_markup(markup: Markup) -> Self {
        let plain = markup.plain_text().chars().collect();
        let final_html = markup.to_html();
        Self {
            markup,
            plain,
            final_html,
        }
    }

    /// Visible characters, ruby annotations excluded
    pub fn len(&self) -> usize {
        self.plain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.plain.iter().collect()
    }

    pub fn final_html(&self) -> &str {
        &self.final_html
    }

    /// Html for the first `revealed` characters
    pub fn html_at(&self, revealed: usize) -> String {
        self.markup.partial_html(revealed)
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.plain.get(index).copied()
    }
}

/// What the animator touches while it runs
pub struct TypingContext<'a> {
    pub view: &'a mut dyn StageView,
    pub timers: &'a mut StageTimers,
    pub sound: &'a dyn SoundPlayer,
    pub settings: &'a StageSettings,
}

#[derive(Debug)]
struct TypingSession {
    line: DialogueLine,
    revealed: usize,
    ms_per_char: u64,
    tick: Option<TimerId>,
}

#[derive(Debug, Default)]
pub struct TypingAnimator {
    sessions: HashMap<ActorId, TypingSession>,
    /// Pending auto-clear (delay or fade) per actor
    clears: HashMap<ActorId, TimerId>,
}

impl TypingAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type `line` into `actor_id`'s dialogue box
    pub fn start(
        &mut self,
        actor_id: ActorId,
        line: DialogueLine,
        ms_per_char: u64,
        ctx: &mut TypingContext<'_>,
    ) {
        self.cancel(&actor_id, ctx.timers);

        ctx.view.apply(DomMutation::SetDialogueHtml {
            actor_id: actor_id.clone(),
            html: String::new(),
        });
        ctx.view.apply(DomMutation::SetDialogueOpacity {
            actor_id: actor_id.clone(),
            opacity: 1.0,
            transition_ms: 0,
        });

        tracing::debug!(
            actor_id = %actor_id,
            chars = line.len(),
            ms_per_char,
            "Typing started"
        );
        self.sessions.insert(
            actor_id.clone(),
            TypingSession {
                line,
                revealed: 0,
                ms_per_char,
                tick: None,
            },
        );
        self.advance(&actor_id, ctx);
    }

    pub fn handle(&mut self, task: TypingTask, ctx: &mut TypingContext<'_>) {
        match task {
            TypingTask::Tick { actor_id } => {
                if let Some(session) = self.sessions.get_mut(&actor_id) {
                    session.tick = None;
                }
                self.advance(&actor_id, ctx);
            }
            TypingTask::FadeOut { actor_id } => {
                if self.clears.remove(&actor_id).is_none() {
                    return;
                }
                ctx.view.apply(DomMutation::SetDialogueOpacity {
                    actor_id: actor_id.clone(),
                    opacity: 0.0,
                    transition_ms: FADE_DURATION.as_millis() as u64,
                });
                let id = ctx.timers.schedule(
                    FADE_DURATION,
                    TypingTask::Clear {
                        actor_id: actor_id.clone(),
                    }
                    .into(),
                );
                self.clears.insert(actor_id, id);
            }
            TypingTask::Clear { actor_id } => {
                if self.clears.remove(&actor_id).is_none() {
                    return;
                }
                ctx.view.apply(DomMutation::SetDialogueHtml {
                    actor_id: actor_id.clone(),
                    html: String::new(),
                });
                ctx.view.apply(DomMutation::SetDialogueOpacity {
                    actor_id: actor_id.clone(),
                    opacity: 1.0,
                    transition_ms: 0,
                });
                tracing::debug!(actor_id = %actor_id, "Dialogue cleared");
            }
        }
    }

    /// Stop typing and any pending auto-clear for an actor
    pub fn cancel(&mut self, actor_id: &ActorId, timers: &mut StageTimers) -> bool {
        let mut cancelled = false;
        if let Some(session) = self.sessions.remove(actor_id) {
            if let Some(tick) = session.tick {
                timers.cancel(tick);
            }
            cancelled = true;
        }
        if let Some(clear) = self.clears.remove(actor_id) {
            timers.cancel(clear);
            cancelled = true;
        }
        if cancelled {
            tracing::debug!(actor_id = %actor_id, "Typing cancelled");
        }
        cancelled
    }

    /// Cancel every actor with pending work that `keep` rejects
    pub fn retain(
        &mut self,
        keep: impl Fn(&ActorId) -> bool,
        timers: &mut StageTimers,
    ) -> Vec<ActorId> {
        let mut dropped: Vec<ActorId> = self
            .sessions
            .keys()
            .chain(self.clears.keys())
            .filter(|actor_id| !keep(actor_id))
            .cloned()
            .collect();
        dropped.sort();
        dropped.dedup();
        for actor_id in &dropped {
            self.cancel(actor_id, timers);
        }
        dropped
    }

    pub fn is_typing(&self, actor_id: &ActorId) -> bool {
        self.sessions.contains_key(actor_id)
    }

    pub fn has_pending_clear(&self, actor_id: &ActorId) -> bool {
        self.clears.contains_key(actor_id)
    }

    /// Characters revealed so far in an actor's current line
    pub fn revealed(&self, actor_id: &ActorId) -> Option<usize> {
        self.sessions.get(actor_id).map(|s| s.revealed)
    }

    fn advance(&mut self, actor_id: &ActorId, ctx: &mut TypingContext<'_>) {
        let Some(session) = self.sessions.get_mut(actor_id) else {
            return;
        };

        if let Some(ch) = session.line.char_at(session.revealed) {
            session.revealed += 1;
            if !ch.is_whitespace() {
                play_tick(ctx);
            }
            ctx.view.apply(DomMutation::SetDialogueHtml {
                actor_id: actor_id.clone(),
                html: session.line.html_at(session.revealed),
            });
            session.tick = Some(ctx.timers.schedule(
                Duration::from_millis(session.ms_per_char),
                TypingTask::Tick {
                    actor_id: actor_id.clone(),
                }
                .into(),
            ));
            return;
        }

        let Some(session) = self.sessions.remove(actor_id) else {
            return;
        };
        ctx.view.apply(DomMutation::SetDialogueHtml {
            actor_id: actor_id.clone(),
            html: session.line.final_html,
        });
        tracing::debug!(actor_id = %actor_id, "Typing complete");

        if ctx.settings.auto_clear_enabled() {
            let id = ctx.timers.schedule(
                Duration::from_secs(ctx.settings.text_clear_delay_secs),
                TypingTask::FadeOut {
                    actor_id: actor_id.clone(),
                }
                .into(),
            );
            self.clears.insert(actor_id.clone(), id);
        }
    }
}

fn play_tick(ctx: &TypingContext<'_>) {
    let Some(sound) = ctx.settings.typing_sound() else {
        return;
    };
    if let Err(e) = ctx.sound.play(sound, ctx.settings.typing_sound_volume) {
        tracing::warn!(error = %e, "Typing sound failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::tasks::StageTask;
    use crate::infrastructure::testing::RecordingView;
    use crate::ports::outbound::{MockSoundPlayer, PortError};

    struct Harness {
        animator: TypingAnimator,
        view: RecordingView,
        timers: StageTimers,
        sound: MockSoundPlayer,
        settings: StageSettings,
    }

    impl Harness {
        fn new(settings: StageSettings) -> Self {
            let mut sound = MockSoundPlayer::new();
            sound.expect_play().returning(|_, _| Ok(()));
            Self {
                animator: TypingAnimator::new(),
                view: RecordingView::new(),
                timers: StageTimers::new(),
                sound,
                settings,
            }
        }

        fn start(&mut self, actor: &str, raw: &str, ms_per_char: u64) {
            let mut view = self.view.clone();
            let mut ctx = TypingContext {
                view: &mut view,
                timers: &mut self.timers,
                sound: &self.sound,
                settings: &self.settings,
            };
            self.animator
                .start(ActorId::new(actor), DialogueLine::parse(raw), ms_per_char, &mut ctx);
        }

        fn advance_to(&mut self, now_ms: u64) {
            let mut view = self.view.clone();
            while let Some((_, task)) = self.timers.pop_due(now_ms) {
                let StageTask::Typing(task) = task else {
                    panic!("only typing tasks are scheduled here");
                };
                let mut ctx = TypingContext {
                    view: &mut view,
                    timers: &mut self.timers,
                    sound: &self.sound,
                    settings: &self.settings,
                };
                self.animator.handle(task, &mut ctx);
            }
            self.timers.settle(now_ms);
        }

        fn html(&self, actor: &str) -> Option<String> {
            self.view.dialogue_html(&ActorId::new(actor))
        }
    }

    #[test]
    fn test_dialogue_line_counts_visible_chars() {
        let line = DialogueLine::parse("[[東京|とうきょう]] **desu**");
        assert_eq!(line.plain_text(), "東京 desu");
        assert_eq!(line.len(), 7);
        assert!(!line.is_empty());
    }

    #[test]
    fn test_first_character_shows_immediately() {
        let mut harness = Harness::new(StageSettings::default());
        harness.start("a", "Hello", 100);

        assert_eq!(harness.html("a").as_deref(), Some("H"));
        assert_eq!(harness.animator.revealed(&ActorId::new("a")), Some(1));
        assert_eq!(harness.timers.next_deadline(), Some(100));
    }

    #[test]
    fn test_reveals_one_character_per_tick_then_final_markup() {
        let mut harness = Harness::new(StageSettings::default());
        harness.start("a", "Hello **world**!", 100);

        harness.advance_to(600);
        assert_eq!(harness.html("a").as_deref(), Some("Hello w"));

        harness.advance_to(1000);
        assert_eq!(harness.html("a").as_deref(), Some("Hello <strong>world</strong>"));

        harness.advance_to(1100);
        assert_eq!(harness.html("a").as_deref(), Some("Hello <strong>world</strong>!"));
        assert!(harness.animator.is_typing(&ActorId::new("a")));

        harness.advance_to(1200);
        assert!(!harness.animator.is_typing(&ActorId::new("a")));
        assert_eq!(harness.html("a").as_deref(), Some("Hello <strong>world</strong>!"));
        assert!(harness.timers.is_empty());
    }

    #[test]
    fn test_restart_cancels_previous_chain() {
        let mut harness = Harness::new(StageSettings::default());
        harness.start("a", "first line", 100);
        harness.advance_to(300);
        harness.start("a", "two", 100);

        assert_eq!(harness.timers.len(), 1);
        harness.advance_to(5000);

        let htmls = harness.view.dialogue_history(&ActorId::new("a"));
        let restart = htmls.iter().rposition(|html| html.is_empty()).unwrap();
        assert_eq!(htmls[restart..], ["", "t", "tw", "two", "two"]);
        assert_eq!(harness.html("a").as_deref(), Some("two"));
    }

    #[test]
    fn test_auto_clear_fades_then_empties() {
        let mut harness = Harness::new(StageSettings {
            text_clear_delay_secs: 2,
            ..StageSettings::default()
        });
        harness.start("a", "ok", 100);
        harness.advance_to(200);
        assert!(harness.animator.has_pending_clear(&ActorId::new("a")));

        harness.advance_to(2199);
        assert_eq!(harness.view.dialogue_opacity(&ActorId::new("a")), Some(1.0));

        harness.advance_to(2200);
        assert_eq!(harness.view.dialogue_opacity(&ActorId::new("a")), Some(0.0));
        assert_eq!(harness.html("a").as_deref(), Some("ok"));

        harness.advance_to(2700);
        assert_eq!(harness.html("a").as_deref(), Some(""));
        assert_eq!(harness.view.dialogue_opacity(&ActorId::new("a")), Some(1.0));
        assert!(!harness.animator.has_pending_clear(&ActorId::new("a")));
    }

    #[test]
    fn test_new_line_cancels_pending_fade() {
        let mut harness = Harness::new(StageSettings {
            text_clear_delay_secs: 1,
            ..StageSettings::default()
        });
        harness.start("a", "x", 100);
        harness.advance_to(100);
        assert!(harness.animator.has_pending_clear(&ActorId::new("a")));

        harness.start("a", "yz", 100);
        assert!(!harness.animator.has_pending_clear(&ActorId::new("a")));
        harness.advance_to(1150);
        assert_eq!(harness.view.dialogue_opacity(&ActorId::new("a")), Some(1.0));
        assert_eq!(harness.html("a").as_deref(), Some("yz"));
    }

    #[test]
    fn test_cancel_leaves_no_pending_work() {
        let mut harness = Harness::new(StageSettings::default());
        harness.start("a", "long line", 100);
        harness.start("b", "other", 100);

        assert!(harness.animator.cancel(&ActorId::new("a"), &mut harness.timers));
        assert!(!harness.animator.cancel(&ActorId::new("a"), &mut harness.timers));
        let before = harness.view.dialogue_history(&ActorId::new("a")).len();

        harness.advance_to(5000);
        assert_eq!(harness.view.dialogue_history(&ActorId::new("a")).len(), before);
        assert_eq!(harness.html("b").as_deref(), Some("other"));
    }

    #[test]
    fn test_retain_cancels_rejected_actors_only() {
        let mut harness = Harness::new(StageSettings {
            text_clear_delay_secs: 1,
            ..StageSettings::default()
        });
        harness.start("a", "long line", 100);
        harness.start("b", "hi", 10);
        harness.advance_to(100);
        assert!(harness.animator.has_pending_clear(&ActorId::new("b")));

        let dropped = harness
            .animator
            .retain(|actor_id| actor_id.as_str() == "a", &mut harness.timers);

        assert_eq!(dropped, vec![ActorId::new("b")]);
        assert!(harness.animator.is_typing(&ActorId::new("a")));
        assert!(!harness.animator.has_pending_clear(&ActorId::new("b")));
        harness.advance_to(60_000);
        assert_eq!(harness.html("b").as_deref(), Some("hi"));
    }

    #[test]
    fn test_sound_plays_for_non_whitespace_only() {
        let settings = StageSettings {
            typing_sound_path: "sounds/tick.ogg".into(),
            typing_sound_volume: 0.3,
            ..StageSettings::default()
        };
        let mut harness = Harness::new(settings);
        let mut sound = MockSoundPlayer::new();
        sound
            .expect_play()
            .withf(|sound, volume| sound.to_string() == "sounds/tick.ogg" && *volume == 0.3)
            .times(3)
            .returning(|_, _| Ok(()));
        harness.sound = sound;

        harness.start("a", "a b c", 50);
        harness.advance_to(1000);
    }

    #[test]
    fn test_sound_failure_does_not_stop_typing() {
        let mut harness = Harness::new(StageSettings {
            typing_sound_path: "missing.ogg".into(),
            ..StageSettings::default()
        });
        let mut sound = MockSoundPlayer::new();
        sound
            .expect_play()
            .returning(|sound, _| Err(PortError::sound(sound, "not found")));
        harness.sound = sound;

        harness.start("a", "hi", 50);
        harness.advance_to(500);
        assert_eq!(harness.html("a").as_deref(), Some("hi"));
    }

    #[test]
    fn test_silent_without_sound_path() {
        let mut harness = Harness::new(StageSettings::default());
        let mut sound = MockSoundPlayer::new();
        sound.expect_play().never();
        harness.sound = sound;

        harness.start("a", "quiet", 50);
        harness.advance_to(1000);
    }
}
