//! Actor stage entry - one per actor currently on stage

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, UserId};

/// An emotion selection saved for an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedEmotion {
    pub emotion_id: Option<String>,
    pub emotion_portrait: Option<String>,
}

/// Presence and appearance data for an actor on stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStageEntry {
    pub actor_id: ActorId,
    /// Resolved portrait (emotion portrait overrides the base portrait)
    pub image: String,
    pub display_name: String,
    pub emotion_id: Option<String>,
    pub emotion_portrait: Option<String>,
    /// Insertion order among the actors present when this entry was built
    pub position: usize,
    /// Always true today; kept so a visibility policy can be added later
    pub dialogue_visible: bool,
    /// Client that put the actor on stage
    pub owner_user_id: Option<UserId>,
    /// Client that last set the emotion. Other clients leave a fresher
    /// emotion alone.
    pub emotion_owner_user_id: Option<UserId>,
}

impl ActorStageEntry {
    /// Build an entry for an actor placed on stage by `owner`
    ///
    /// The saved emotion (if any) decides the portrait; the emotion soft
    /// lock goes to `owner` only when an emotion is actually set.
    pub fn placed_by(
        actor_id: ActorId,
        display_name: impl Into<String>,
        base_portrait: impl Into<String>,
        emotion: Option<SavedEmotion>,
        owner: UserId,
    ) -> Self {
        let base_portrait = base_portrait.into();
        let (emotion_id, emotion_portrait) = emotion
            .map(|e| (e.emotion_id, e.emotion_portrait))
            .unwrap_or((None, None));
        let image = emotion_portrait.clone().unwrap_or(base_portrait);
        let emotion_owner_user_id = emotion_id.as_ref().map(|_| owner.clone());

        Self {
            actor_id,
            image,
            display_name: display_name.into(),
            emotion_id,
            emotion_portrait,
            position: 0,
            dialogue_visible: true,
            owner_user_id: Some(owner),
            emotion_owner_user_id,
        }
    }

    /// Whether `user` may overwrite this entry's emotion
    pub fn emotion_writable_by(&self, user: &UserId) -> bool {
        match &self.emotion_owner_user_id {
            Some(owner) => owner == user,
            None => true,
        }
    }
}
