//! Speaker Stage domain: stage entries, dialogue markup, slot layout and
//! settings. Pure types with no I/O.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{ActorStageEntry, SavedEmotion};
pub use error::DomainError;
pub use ids::{ActorId, UserId};
pub use value_objects::{
    plain_text, render, render_partial, slot_layout, Markup, MarkupNode, StageSettings, StageSlot,
    MAX_RENDERED_ACTORS, RUBY_CLASS,
};
