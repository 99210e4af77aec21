//! Outbound ports - everything the stage asks of its host.
//!
//! Ports exist for:
//! - Actor and emotion lookups (the host's document store)
//! - The broadcast channel shared by every client
//! - Sound playback, speaker selection and user notices
//! - The rendered stage itself (a retained DOM)

mod error;
mod stage_ports;
mod stage_view;

pub use error::PortError;
pub use stage_ports::{
    ActorDirectory, ActorRecord, BroadcastChannel, ChatMessage, DefaultInCharacterFilter,
    EmotionStore, InCharacterFilter, Notifier, SettingsProvider, SoundPlayer, SpeakerSelector,
    StagePorts,
};
pub use stage_view::{
    DomMutation, LayoutMetrics, StageView, WrapperPhase, DEFAULT_SIDEBAR_WIDTH,
};

#[cfg(test)]
pub use stage_ports::{MockBroadcastChannel, MockSoundPlayer, MockSpeakerSelector};
