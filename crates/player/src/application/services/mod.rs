//! Application services
//!
//! Each client runs one [`StageController`]. The other services are the
//! pieces it composes; they share a virtual-time [`StageTimers`] queue.

mod broadcast_sync;
mod scheduler;
mod stage_controller;
mod stage_renderer;
mod stage_store;
mod tasks;
mod typing_animator;

pub use broadcast_sync::{BroadcastSync, SyncOutcome};
pub use scheduler::{TimerId, TimerQueue};
pub use stage_controller::{StageCommand, StageController, NO_CHARACTER_WARNING, RESIZE_DEBOUNCE};
pub use stage_renderer::{
    ReconcileOutcome, StageRenderer, WrapperState, ANIMATION_FRAME, DEFERRED_LAYOUT_DELAY,
    ENTER_DURATION, EXPAND_DURATION, LEAVE_DURATION, SHRINK_DURATION,
};
pub use stage_store::StageStore;
pub use tasks::{RenderTask, StageTask, StageTimers, TypingTask};
pub use typing_animator::{DialogueLine, TypingAnimator, TypingContext, FADE_DURATION};
