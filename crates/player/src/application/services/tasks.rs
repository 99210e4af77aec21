//! Deferred work scheduled on a client's timer queue

use speaker_stage_domain::ActorId;

use super::scheduler::TimerQueue;

/// Timer queue shared by every stage component on one client
pub type StageTimers = TimerQueue<StageTask>;

#[derive(Debug, Clone, PartialEq)]
pub enum StageTask {
    Typing(TypingTask),
    Render(RenderTask),
    /// Debounced viewport resize
    ApplyResize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypingTask {
    /// Reveal the next character
    Tick { actor_id: ActorId },
    /// Auto-clear delay elapsed; start the fade
    FadeOut { actor_id: ActorId },
    /// Fade finished; empty the box and restore opacity
    Clear { actor_id: ActorId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderTask {
    BeginExpand { actor_id: ActorId },
    BeginEnter { actor_id: ActorId },
    Settle { actor_id: ActorId },
    Shrink { actor_id: ActorId },
    Detach { actor_id: ActorId },
    /// Layout pass held back until removals have slid out; `added` are the
    /// actors that were not on stage when it was scheduled
    Layout { added: Vec<ActorId> },
}

impl From<TypingTask> for StageTask {
    fn from(task: TypingTask) -> Self {
        StageTask::Typing(task)
    }
}

impl From<RenderTask> for StageTask {
    fn from(task: RenderTask) -> Self {
        StageTask::Render(task)
    }
}
