//! Host adapters for running the stage outside a tabletop host
//!
//! `desktop` turns every side effect into a tracing event; `memory` holds
//! actor and emotion documents in process.

mod desktop;
mod memory;

pub use desktop::{DesktopNotifier, DesktopSoundPlayer, DesktopSpeakerSelector, DesktopStageView};
pub use memory::{InMemoryActorDirectory, InMemoryEmotionStore};
