//! Domain entities

mod stage_entry;

pub use stage_entry::{ActorStageEntry, SavedEmotion};
