//! Host collaborator ports.

use serde::{Deserialize, Serialize};
use speaker_stage_domain::{ActorId, SavedEmotion, StageSettings};

use super::{PortError, StageView};

// =============================================================================
// Documents
// =============================================================================

/// The host's view of an actor document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: ActorId,
    pub name: String,
    /// Base portrait path
    pub portrait: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait ActorDirectory: Send {
    fn lookup(&self, actor_id: &ActorId) -> Option<ActorRecord>;

    /// Actors registered as speakers, in backstage order
    fn registered_speakers(&self) -> Vec<ActorId>;
}

#[cfg_attr(test, mockall::automock)]
pub trait EmotionStore: Send {
    /// The emotion last saved for an actor, if any
    fn saved_emotion(&self, actor_id: &ActorId) -> Option<SavedEmotion>;
}

// =============================================================================
// Side Effects
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait BroadcastChannel: Send {
    /// Send a payload to every other client on `topic`
    fn send(&self, topic: &str, payload: serde_json::Value) -> Result<(), PortError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait SoundPlayer: Send {
    fn play(&self, sound: &str, volume: f32) -> Result<(), PortError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait SpeakerSelector: Send {
    /// Make `actor_id` the active chat speaker
    fn select(&self, actor_id: &ActorId);
}

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send {
    fn warn(&self, message: &str);
}

// =============================================================================
// Settings
// =============================================================================

/// Source of the current stage settings, read fresh on every use
pub trait SettingsProvider: Send {
    fn stage_settings(&self) -> StageSettings;
}

impl SettingsProvider for StageSettings {
    fn stage_settings(&self) -> StageSettings {
        self.clone()
    }
}

// =============================================================================
// Chat
// =============================================================================

/// A chat message as delivered by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaking actor, if the message was sent as one
    pub actor_id: Option<ActorId>,
    /// Raw message body in stage markup
    pub content: String,
    /// Host message style code
    pub style: Option<u8>,
    /// Host message type tag
    pub message_type: Option<String>,
    pub has_roll: bool,
    pub has_flavor: bool,
    pub is_whisper: bool,
}

impl ChatMessage {
    /// An in-character line spoken by `actor_id`
    pub fn spoken_by(actor_id: impl Into<ActorId>, content: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            content: content.into(),
            style: Some(DefaultInCharacterFilter::IN_CHARACTER_STYLE),
            ..Self::default()
        }
    }
}

/// Decides whether a chat message is spoken in character
pub trait InCharacterFilter: Send {
    fn is_in_character(&self, message: &ChatMessage) -> bool;
}

/// In-character when the style code is 1 or 2, or the type is `base`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInCharacterFilter;

impl DefaultInCharacterFilter {
    pub const OUT_OF_CHARACTER_STYLE: u8 = 1;
    pub const IN_CHARACTER_STYLE: u8 = 2;
    pub const BASE_TYPE: &'static str = "base";
}

impl InCharacterFilter for DefaultInCharacterFilter {
    fn is_in_character(&self, message: &ChatMessage) -> bool {
        matches!(
            message.style,
            Some(Self::IN_CHARACTER_STYLE) | Some(Self::OUT_OF_CHARACTER_STYLE)
        ) || message.message_type.as_deref() == Some(Self::BASE_TYPE)
    }
}

// =============================================================================
// Container
// =============================================================================

/// Every collaborator one stage controller needs
pub struct StagePorts {
    pub directory: Box<dyn ActorDirectory>,
    pub emotions: Box<dyn EmotionStore>,
    pub channel: Box<dyn BroadcastChannel>,
    pub sound: Box<dyn SoundPlayer>,
    pub selector: Box<dyn SpeakerSelector>,
    pub notifier: Box<dyn Notifier>,
    pub settings: Box<dyn SettingsProvider>,
    pub chat_filter: Box<dyn InCharacterFilter>,
    pub view: Box<dyn StageView>,
}
