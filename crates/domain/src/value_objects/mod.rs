//! Value objects - immutable types defined by their values

mod markup;
mod settings;
mod stage_slot;

pub use markup::{plain_text, render, render_partial, Markup, MarkupNode, RUBY_CLASS};
pub use settings::{
    StageSettings, CHARACTER_NAME_FONT_SIZE_RANGE, DIALOGUE_FONT_SIZE_RANGE,
    TEXT_CLEAR_DELAY_RANGE_SECS, TYPING_SOUND_VOLUME_RANGE, TYPING_SPEED_RANGE_MS,
};
pub use stage_slot::{slot_layout, StageSlot, MAX_RENDERED_ACTORS};
