//! Error types for port operations.

/// Failures reported by host collaborators
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The broadcast channel refused or lost the message
    #[error("Broadcast failed on {topic}: {message}")]
    Broadcast { topic: String, message: String },

    /// Sound playback failed
    #[error("Sound playback failed for {sound}: {message}")]
    Sound { sound: String, message: String },

    /// A payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PortError {
    pub fn broadcast(topic: impl ToString, message: impl ToString) -> Self {
        Self::Broadcast {
            topic: topic.to_string(),
            message: message.to_string(),
        }
    }

    pub fn sound(sound: impl ToString, message: impl ToString) -> Self {
        Self::Sound {
            sound: sound.to_string(),
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}
