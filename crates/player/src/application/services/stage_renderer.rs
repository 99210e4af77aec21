//! Stage Renderer / Diff Engine
//!
//! Keeps a model of every wrapper on the rendered stage and reconciles it
//! against the store after each mutation. Only differences reach the
//! [`StageView`], so reconciling an unchanged store emits nothing.
//!
//! ## Wrapper lifecycle
//!
//! ```text
//! added:   Preparing --frame--> Expanding --600ms--> Entering --500ms--> Steady
//! removed: Leaving --650ms--> Shrinking --600ms--> detached
//! ```
//!
//! When removals are in flight the layout pass (slots, images, new
//! wrappers) waits for the leaving phase so survivors only move once the
//! departing portrait is out of the way. A deferred pass plans from the
//! store as it is when the pass runs, so portraits swapped in the
//! meantime are kept. At most one deferred pass is pending; a reconcile
//! that arrives meanwhile replaces it, keeping the later due time and the
//! earlier pass's additions. A wrapper still on its
//! way out that is added back is detached at once and starts again from
//! `Preparing`.

use std::time::Duration;

use speaker_stage_domain::{ActorId, ActorStageEntry, StageSlot, MAX_RENDERED_ACTORS};

use super::scheduler::TimerId;
use super::tasks::{RenderTask, StageTimers};
use crate::ports::outbound::{DomMutation, StageView, WrapperPhase};

/// One animation frame
pub const ANIMATION_FRAME: Duration = Duration::from_millis(16);
pub const EXPAND_DURATION: Duration = Duration::from_millis(600);
pub const ENTER_DURATION: Duration = Duration::from_millis(500);
pub const LEAVE_DURATION: Duration = Duration::from_millis(650);
pub const SHRINK_DURATION: Duration = Duration::from_millis(600);
/// Delay of the layout pass when a reconcile removed actors
pub const DEFERRED_LAYOUT_DELAY: Duration = LEAVE_DURATION;

/// A mounted wrapper as the renderer last drew it
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperState {
    pub actor_id: ActorId,
    pub slot: StageSlot,
    pub phase: WrapperPhase,
    pub image: String,
    pub name: String,
    pub max_dialogue_width: f64,
    pending: Option<TimerId>,
}

/// Id-set difference found by one reconcile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub added: Vec<ActorId>,
    pub removed: Vec<ActorId>,
    /// False when the view was not mounted and nothing happened
    pub rendered: bool,
}

/// Where one store entry goes on the next layout pass
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedWrapper {
    actor_id: ActorId,
    slot: StageSlot,
    image: String,
    name: String,
}

#[derive(Debug)]
struct DeferredLayout {
    timer: TimerId,
    added: Vec<ActorId>,
}

#[derive(Debug, Default)]
pub struct StageRenderer {
    /// Mounted wrappers in DOM order
    wrappers: Vec<WrapperState>,
    /// Actor ids seen by the last reconcile, in store order
    tracked: Vec<ActorId>,
    deferred: Option<DeferredLayout>,
}

impl StageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the stage in line with `entries` (store order)
    pub fn reconcile(
        &mut self,
        entries: &[ActorStageEntry],
        view: &mut dyn StageView,
        timers: &mut StageTimers,
    ) -> ReconcileOutcome {
        if !view.is_mounted() {
            tracing::debug!("Stage overlay not mounted; skipping reconcile");
            return ReconcileOutcome::default();
        }

        let current: Vec<ActorId> = entries.iter().map(|e| e.actor_id.clone()).collect();
        let added: Vec<ActorId> = current
            .iter()
            .filter(|id| !self.tracked.contains(id))
            .cloned()
            .collect();
        let removed: Vec<ActorId> = self
            .tracked
            .iter()
            .filter(|id| !current.contains(id))
            .cloned()
            .collect();

        for actor_id in &removed {
            self.begin_removal(actor_id, view, timers);
        }

        let mut pass_added = added.clone();
        let mut due = None;
        if let Some(deferred) = self.deferred.take() {
            due = timers.deadline(deferred.timer);
            timers.cancel(deferred.timer);
            for actor_id in deferred.added {
                if current.contains(&actor_id) && !pass_added.contains(&actor_id) {
                    pass_added.push(actor_id);
                }
            }
        }
        if !removed.is_empty() {
            let leave_done = timers.now_ms() + DEFERRED_LAYOUT_DELAY.as_millis() as u64;
            due = Some(due.map_or(leave_done, |d| d.max(leave_done)));
        }

        self.tracked = current;

        match due {
            None => self.apply_layout(entries, &pass_added, view, timers),
            Some(due) => {
                let timer = timers.schedule_at(
                    due,
                    RenderTask::Layout {
                        added: pass_added.clone(),
                    }
                    .into(),
                );
                self.deferred = Some(DeferredLayout {
                    timer,
                    added: pass_added,
                });
            }
        }

        if !added.is_empty() || !removed.is_empty() {
            tracing::info!(
                added = added.len(),
                removed = removed.len(),
                on_stage = self.tracked.len(),
                "Stage membership changed"
            );
        }

        ReconcileOutcome {
            added,
            removed,
            rendered: true,
        }
    }

    /// Run a phase transition or deferred layout pass against the current
    /// store `entries`
    pub fn handle(
        &mut self,
        task: RenderTask,
        entries: &[ActorStageEntry],
        view: &mut dyn StageView,
        timers: &mut StageTimers,
    ) {
        match task {
            RenderTask::BeginExpand { actor_id } => {
                self.step(&actor_id, WrapperPhase::Preparing, WrapperPhase::Expanding, view, timers)
            }
            RenderTask::BeginEnter { actor_id } => {
                self.step(&actor_id, WrapperPhase::Expanding, WrapperPhase::Entering, view, timers)
            }
            RenderTask::Settle { actor_id } => {
                self.step(&actor_id, WrapperPhase::Entering, WrapperPhase::Steady, view, timers)
            }
            RenderTask::Shrink { actor_id } => {
                self.step(&actor_id, WrapperPhase::Leaving, WrapperPhase::Shrinking, view, timers)
            }
            RenderTask::Detach { actor_id } => {
                let detachable = self
                    .wrapper(&actor_id)
                    .is_some_and(|w| w.phase == WrapperPhase::Shrinking);
                if !detachable {
                    return;
                }
                self.detach(&actor_id, view, timers);
                if entries.is_empty() && self.wrappers.is_empty() {
                    self.tracked.clear();
                }
            }
            RenderTask::Layout { added } => {
                self.deferred = None;
                self.apply_layout(entries, &added, view, timers);
            }
        }
    }

    /// Swap a mounted portrait without a layout pass
    pub fn refresh_image(&mut self, actor_id: &ActorId, image: &str, view: &mut dyn StageView) {
        if image.is_empty() {
            return;
        }
        let Some(wrapper) = self.wrapper_mut(actor_id) else {
            return;
        };
        if wrapper.image == image {
            return;
        }
        wrapper.image = image.to_string();
        view.apply(DomMutation::SetImage {
            actor_id: actor_id.clone(),
            image: image.to_string(),
        });
    }

    /// Whether an actor has a wrapper that is not on its way out
    pub fn has_wrapper(&self, actor_id: &ActorId) -> bool {
        self.wrapper(actor_id).is_some_and(|w| !w.phase.is_removing())
    }

    pub fn wrapper(&self, actor_id: &ActorId) -> Option<&WrapperState> {
        self.wrappers.iter().find(|w| &w.actor_id == actor_id)
    }

    /// Mounted wrappers in DOM order
    pub fn wrappers(&self) -> &[WrapperState] {
        &self.wrappers
    }

    pub fn tracked_ids(&self) -> &[ActorId] {
        &self.tracked
    }

    fn wrapper_mut(&mut self, actor_id: &ActorId) -> Option<&mut WrapperState> {
        self.wrappers.iter_mut().find(|w| &w.actor_id == actor_id)
    }

    fn begin_removal(
        &mut self,
        actor_id: &ActorId,
        view: &mut dyn StageView,
        timers: &mut StageTimers,
    ) {
        let Some(wrapper) = self.wrapper_mut(actor_id) else {
            return;
        };
        if wrapper.phase.is_removing() {
            return;
        }
        if let Some(pending) = wrapper.pending.take() {
            timers.cancel(pending);
        }
        wrapper.phase = WrapperPhase::Leaving;
        wrapper.pending = Some(timers.schedule(
            LEAVE_DURATION,
            RenderTask::Shrink {
                actor_id: actor_id.clone(),
            }
            .into(),
        ));
        view.apply(DomMutation::SetPhase {
            actor_id: actor_id.clone(),
            phase: WrapperPhase::Leaving,
        });
        tracing::debug!(actor_id = %actor_id, "Wrapper leaving");
    }

    fn step(
        &mut self,
        actor_id: &ActorId,
        from: WrapperPhase,
        to: WrapperPhase,
        view: &mut dyn StageView,
        timers: &mut StageTimers,
    ) {
        let Some(wrapper) = self.wrapper_mut(actor_id) else {
            return;
        };
        if wrapper.phase != from {
            return;
        }
        wrapper.phase = to;
        wrapper.pending = next_step(to, actor_id)
            .map(|(delay, task)| timers.schedule(delay, task.into()));
        view.apply(DomMutation::SetPhase {
            actor_id: actor_id.clone(),
            phase: to,
        });
        tracing::debug!(actor_id = %actor_id, phase = ?to, "Wrapper phase");
    }

    fn detach(&mut self, actor_id: &ActorId, view: &mut dyn StageView, timers: &mut StageTimers) {
        let Some(index) = self.wrappers.iter().position(|w| &w.actor_id == actor_id) else {
            return;
        };
        let wrapper = self.wrappers.remove(index);
        if let Some(pending) = wrapper.pending {
            timers.cancel(pending);
        }
        view.apply(DomMutation::Detach {
            actor_id: actor_id.clone(),
        });
        tracing::debug!(actor_id = %actor_id, "Wrapper detached");
    }

    fn apply_layout(
        &mut self,
        entries: &[ActorStageEntry],
        added: &[ActorId],
        view: &mut dyn StageView,
        timers: &mut StageTimers,
    ) {
        let max_dialogue_width = view.measure().max_dialogue_width();

        for planned in self.plan_wrappers(entries) {
            let removing = match self.wrapper(&planned.actor_id) {
                Some(existing) => existing.phase.is_removing(),
                None => {
                    let animate = added.contains(&planned.actor_id);
                    self.mount(planned, max_dialogue_width, animate, view, timers);
                    continue;
                }
            };

            if removing {
                self.detach(&planned.actor_id, view, timers);
                self.mount(planned, max_dialogue_width, true, view, timers);
            } else {
                self.update_in_place(planned, max_dialogue_width, view);
            }
        }
    }

    fn mount(
        &mut self,
        planned: PlannedWrapper,
        max_dialogue_width: f64,
        animate: bool,
        view: &mut dyn StageView,
        timers: &mut StageTimers,
    ) {
        let PlannedWrapper {
            actor_id,
            slot,
            image,
            name,
        } = planned;
        let phase = if animate {
            WrapperPhase::Preparing
        } else {
            WrapperPhase::Steady
        };

        view.apply(DomMutation::MountWrapper {
            actor_id: actor_id.clone(),
            slot,
            phase,
            image: image.clone(),
            name: name.clone(),
            max_dialogue_width,
        });

        let pending = if animate {
            view.apply(DomMutation::FlushLayout {
                actor_id: actor_id.clone(),
            });
            Some(timers.schedule(
                ANIMATION_FRAME,
                RenderTask::BeginExpand {
                    actor_id: actor_id.clone(),
                }
                .into(),
            ))
        } else {
            None
        };

        tracing::debug!(actor_id = %actor_id, %slot, animate, "Wrapper mounted");
        self.wrappers.push(WrapperState {
            actor_id,
            slot,
            phase,
            image,
            name,
            max_dialogue_width,
            pending,
        });
    }

    fn update_in_place(
        &mut self,
        planned: PlannedWrapper,
        max_dialogue_width: f64,
        view: &mut dyn StageView,
    ) {
        let Some(wrapper) = self.wrapper_mut(&planned.actor_id) else {
            return;
        };

        if wrapper.slot != planned.slot {
            wrapper.slot = planned.slot;
            view.apply(DomMutation::SetSlot {
                actor_id: planned.actor_id.clone(),
                slot: planned.slot,
            });
        }
        if !planned.image.is_empty() && wrapper.image != planned.image {
            wrapper.image = planned.image.clone();
            view.apply(DomMutation::SetImage {
                actor_id: planned.actor_id.clone(),
                image: planned.image,
            });
        }
        if wrapper.max_dialogue_width != max_dialogue_width {
            wrapper.max_dialogue_width = max_dialogue_width;
            view.apply(DomMutation::SetDialogueMaxWidth {
                actor_id: planned.actor_id,
                width: max_dialogue_width,
            });
        }
    }

    /// The first rendered entries with their slots
    ///
    /// Only actors the last reconcile saw are planned; store changes that
    /// have not been reconciled yet wait for the next reconcile.
    fn plan_wrappers(&self, entries: &[ActorStageEntry]) -> Vec<PlannedWrapper> {
        let on_stage: Vec<&ActorStageEntry> = entries
            .iter()
            .filter(|entry| self.tracked.contains(&entry.actor_id))
            .collect();
        on_stage
            .iter()
            .take(MAX_RENDERED_ACTORS)
            .enumerate()
            .map(|(index, entry)| PlannedWrapper {
                actor_id: entry.actor_id.clone(),
                slot: StageSlot::for_index(index, on_stage.len()),
                image: entry.image.clone(),
                name: entry.display_name.clone(),
            })
            .collect()
    }
}

/// Timer that follows entering `phase`
fn next_step(phase: WrapperPhase, actor_id: &ActorId) -> Option<(Duration, RenderTask)> {
    let actor_id = actor_id.clone();
    match phase {
        WrapperPhase::Expanding => Some((EXPAND_DURATION, RenderTask::BeginEnter { actor_id })),
        WrapperPhase::Entering => Some((ENTER_DURATION, RenderTask::Settle { actor_id })),
        WrapperPhase::Shrinking => Some((SHRINK_DURATION, RenderTask::Detach { actor_id })),
        WrapperPhase::Preparing | WrapperPhase::Steady | WrapperPhase::Leaving => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::tasks::StageTask;
    use crate::infrastructure::testing::RecordingView;
    use crate::ports::outbound::LayoutMetrics;
    use speaker_stage_domain::UserId;
    use StageSlot::*;
    use WrapperPhase::*;

    fn entry(id: &str) -> ActorStageEntry {
        ActorStageEntry::placed_by(
            ActorId::new(id),
            id.to_uppercase(),
            format!("{id}.png"),
            None,
            UserId::new("gm"),
        )
    }

    fn id(value: &str) -> ActorId {
        ActorId::new(value)
    }

    struct Harness {
        renderer: StageRenderer,
        view: RecordingView,
        timers: StageTimers,
        entries: Vec<ActorStageEntry>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                renderer: StageRenderer::new(),
                view: RecordingView::new(),
                timers: StageTimers::new(),
                entries: Vec::new(),
            }
        }

        fn set(&mut self, ids: &[&str]) -> ReconcileOutcome {
            self.entries = ids.iter().map(|id| entry(id)).collect();
            let mut view = self.view.clone();
            self.renderer
                .reconcile(&self.entries, &mut view, &mut self.timers)
        }

        fn advance_to(&mut self, now_ms: u64) {
            let mut view = self.view.clone();
            while let Some((_, task)) = self.timers.pop_due(now_ms) {
                let StageTask::Render(task) = task else {
                    panic!("only render tasks are scheduled here");
                };
                self.renderer
                    .handle(task, &self.entries, &mut view, &mut self.timers);
            }
            self.timers.settle(now_ms);
        }

        fn phase(&self, actor: &str) -> Option<WrapperPhase> {
            self.renderer.wrapper(&id(actor)).map(|w| w.phase)
        }

        fn slot(&self, actor: &str) -> Option<StageSlot> {
            self.renderer.wrapper(&id(actor)).map(|w| w.slot)
        }
    }

    #[test]
    fn test_added_actor_animates_in() {
        let mut harness = Harness::new();
        let outcome = harness.set(&["a"]);

        assert_eq!(outcome.added, vec![id("a")]);
        assert_eq!(harness.phase("a"), Some(Preparing));
        assert!(harness.view.mutations().contains(&DomMutation::FlushLayout { actor_id: id("a") }));

        harness.advance_to(16);
        assert_eq!(harness.phase("a"), Some(Expanding));
        harness.advance_to(615);
        assert_eq!(harness.phase("a"), Some(Expanding));
        harness.advance_to(616);
        assert_eq!(harness.phase("a"), Some(Entering));
        harness.advance_to(1116);
        assert_eq!(harness.phase("a"), Some(Steady));
        assert!(harness.timers.is_empty());
        assert_eq!(
            harness.view.phases(&id("a")),
            vec![Preparing, Expanding, Entering, Steady]
        );
    }

    #[test]
    fn test_second_actor_joins_without_disturbing_first() {
        let mut harness = Harness::new();
        harness.set(&["a"]);
        harness.advance_to(2000);
        harness.view.take();

        let outcome = harness.set(&["a", "b"]);
        assert_eq!(outcome.added, vec![id("b")]);
        assert!(outcome.removed.is_empty());

        harness.advance_to(4000);
        assert!(harness.view.phases(&id("a")).is_empty());
        assert_eq!(harness.slot("a"), Some(Left));
        assert_eq!(harness.slot("b"), Some(Right));
        assert_eq!(
            harness.view.phases(&id("b")),
            vec![Preparing, Expanding, Entering, Steady]
        );
    }

    #[test]
    fn test_removed_actor_leaves_then_survivor_moves() {
        let mut harness = Harness::new();
        harness.set(&["a", "b"]);
        harness.advance_to(2000);
        assert_eq!(harness.slot("b"), Some(Right));
        harness.view.take();

        let outcome = harness.set(&["b"]);
        assert_eq!(outcome.removed, vec![id("a")]);
        assert_eq!(harness.phase("a"), Some(Leaving));
        assert_eq!(harness.slot("b"), Some(Right));

        harness.advance_to(2649);
        assert_eq!(harness.phase("a"), Some(Leaving));
        assert_eq!(harness.slot("b"), Some(Right));

        harness.advance_to(2650);
        assert_eq!(harness.phase("a"), Some(Shrinking));
        assert_eq!(harness.slot("b"), Some(Left));

        harness.advance_to(3249);
        assert_eq!(harness.phase("a"), Some(Shrinking));
        harness.advance_to(3250);
        assert_eq!(harness.phase("a"), None);

        assert_eq!(harness.view.phases(&id("a")), vec![Leaving, Shrinking]);
        assert_eq!(
            harness.view.mutations().last(),
            Some(&DomMutation::Detach { actor_id: id("a") })
        );
        assert!(harness.view.phases(&id("b")).is_empty());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut harness = Harness::new();
        harness.set(&["a", "b", "c"]);
        harness.advance_to(2000);
        let before = harness.view.len();

        let outcome = harness.set(&["a", "b", "c"]);
        assert!(outcome.added.is_empty() && outcome.removed.is_empty());
        assert_eq!(harness.view.len(), before);
        assert!(harness.timers.is_empty());
    }

    #[test]
    fn test_only_first_five_render() {
        let mut harness = Harness::new();
        harness.set(&["a", "b", "c", "d", "e", "f", "g"]);
        harness.advance_to(2000);

        let slots: Vec<StageSlot> = harness.renderer.wrappers().iter().map(|w| w.slot).collect();
        assert_eq!(slots, vec![Left, Center, Right, Center, Center]);
        assert!(harness.renderer.wrapper(&id("f")).is_none());
        assert_eq!(harness.renderer.tracked_ids().len(), 7);
    }

    #[test]
    fn test_readded_while_leaving_restarts_from_preparing() {
        let mut harness = Harness::new();
        harness.set(&["a", "b"]);
        harness.advance_to(2000);

        harness.set(&["b"]);
        harness.advance_to(2100);
        assert_eq!(harness.phase("a"), Some(Leaving));

        // Re-added while the leaving pass is still pending
        harness.set(&["b", "a"]);
        assert_eq!(harness.phase("a"), Some(Leaving));

        harness.advance_to(2650);
        assert_eq!(harness.phase("a"), Some(Preparing));
        assert_eq!(harness.slot("a"), Some(Right));
        assert_eq!(harness.slot("b"), Some(Left));

        harness.advance_to(5000);
        assert_eq!(harness.phase("a"), Some(Steady));
        assert_eq!(harness.slot("b"), Some(Left));
        assert_eq!(harness.renderer.wrappers().len(), 2);
    }

    #[test]
    fn test_removed_again_before_deferred_pass_is_not_remounted() {
        let mut harness = Harness::new();
        harness.set(&["a", "b"]);
        harness.advance_to(2000);

        harness.set(&["b"]);
        harness.advance_to(2100);
        harness.set(&[]);
        harness.advance_to(6000);

        assert!(harness.renderer.wrappers().is_empty());
        assert!(harness.renderer.tracked_ids().is_empty());
    }

    #[test]
    fn test_readded_after_pass_restarts_from_preparing() {
        let mut harness = Harness::new();
        harness.set(&["a", "b"]);
        harness.advance_to(2000);

        harness.set(&["b"]);
        harness.advance_to(2700);
        assert_eq!(harness.phase("a"), Some(Shrinking));

        harness.set(&["b", "a"]);
        assert_eq!(harness.phase("a"), Some(Preparing));
        assert_eq!(harness.slot("a"), Some(Right));
        assert_eq!(harness.renderer.wrappers().len(), 2);

        // The old detach timer died with the old wrapper
        harness.advance_to(5000);
        assert_eq!(harness.phase("a"), Some(Steady));
    }

    #[test]
    fn test_later_reconcile_replaces_deferred_pass() {
        let mut harness = Harness::new();
        harness.set(&["a", "b", "c"]);
        harness.advance_to(2000);

        harness.set(&["b", "c", "d"]);
        harness.advance_to(2300);
        assert!(harness.renderer.wrapper(&id("d")).is_none());

        harness.set(&["b", "c", "d", "e"]);
        harness.advance_to(2650);
        assert_eq!(harness.phase("d"), Some(Preparing));
        assert_eq!(harness.phase("e"), Some(Preparing));
        assert_eq!(harness.slot("b"), Some(Left));
        assert_eq!(harness.slot("c"), Some(Center));
        assert_eq!(harness.slot("d"), Some(Right));
        assert_eq!(harness.slot("e"), Some(Center));

        harness.advance_to(6000);
        let layout_moves = harness
            .view
            .mutations()
            .iter()
            .filter(|m| matches!(m, DomMutation::SetSlot { actor_id, .. } if actor_id == &id("c")))
            .count();
        assert_eq!(layout_moves, 1);
    }

    #[test]
    fn test_known_actor_without_wrapper_mounts_steady() {
        let mut harness = Harness::new();
        harness.set(&["a"]);
        // The overlay went away and came back empty
        harness.renderer.wrappers.clear();
        harness.timers = StageTimers::new();
        harness.view.take();

        harness.set(&["a"]);
        assert_eq!(harness.phase("a"), Some(Steady));
        assert!(harness.timers.is_empty());
    }

    #[test]
    fn test_unmounted_view_skips_reconcile() {
        let mut harness = Harness::new();
        harness.view.set_mounted(false);

        let outcome = harness.set(&["a"]);
        assert!(!outcome.rendered);
        assert!(harness.renderer.tracked_ids().is_empty());
        assert_eq!(harness.view.len(), 0);
    }

    #[test]
    fn test_image_and_width_update_in_place() {
        let mut harness = Harness::new();
        harness.set(&["a"]);
        harness.advance_to(2000);
        harness.view.take();

        harness.entries[0].image = "a-angry.png".into();
        harness.view.set_metrics(LayoutMetrics::new(1000.0, Some(200.0)));
        let entries = harness.entries.clone();
        let mut view = harness.view.clone();
        harness.renderer.reconcile(&entries, &mut view, &mut harness.timers);

        assert_eq!(
            harness.view.take(),
            vec![
                DomMutation::SetImage {
                    actor_id: id("a"),
                    image: "a-angry.png".into()
                },
                DomMutation::SetDialogueMaxWidth {
                    actor_id: id("a"),
                    width: 400.0
                },
            ]
        );
    }

    #[test]
    fn test_deferred_pass_keeps_portrait_swapped_while_waiting() {
        let mut harness = Harness::new();
        harness.set(&["a", "b"]);
        harness.advance_to(2000);

        harness.set(&["b"]);
        harness.advance_to(2100);
        harness.entries[0].image = "b-sad.png".into();
        let mut view = harness.view.clone();
        harness.renderer.refresh_image(&id("b"), "b-sad.png", &mut view);

        harness.advance_to(4000);
        assert_eq!(
            harness.renderer.wrapper(&id("b")).map(|w| w.image.as_str()),
            Some("b-sad.png")
        );
        let swaps = harness
            .view
            .mutations()
            .iter()
            .filter(|m| matches!(m, DomMutation::SetImage { actor_id, .. } if actor_id == &id("b")))
            .count();
        assert_eq!(swaps, 1);
    }

    #[test]
    fn test_refresh_image_only_when_changed() {
        let mut harness = Harness::new();
        harness.set(&["a"]);
        harness.view.take();

        let mut view = harness.view.clone();
        harness.renderer.refresh_image(&id("a"), "a.png", &mut view);
        assert_eq!(harness.view.len(), 0);

        harness.renderer.refresh_image(&id("a"), "a-sad.png", &mut view);
        harness.renderer.refresh_image(&id("missing"), "x.png", &mut view);
        assert_eq!(harness.view.len(), 1);
    }

    #[test]
    fn test_dialogue_width_from_layout() {
        let mut harness = Harness::new();
        harness.view.set_metrics(LayoutMetrics::new(1300.0, None));
        harness.set(&["a"]);

        assert_eq!(harness.renderer.wrapper(&id("a")).map(|w| w.max_dialogue_width), Some(500.0));
    }
}
