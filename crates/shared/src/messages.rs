//! Broadcast message types for stage synchronization
//!
//! Every client publishes a full snapshot of its stage roster after a
//! membership or emotion change. Receivers replace their store wholesale.
//!
//! ## Wire shape
//!
//! ```json
//! {
//!   "action": "updateStage",
//!   "actors": [{ "id": "...", "img": "...", "name": "...", "emotionId": null,
//!                "emotionPortrait": null, "position": 0, "dialogueVisible": true,
//!                "userId": "...", "emotionUserId": "..." }],
//!   "userId": "..."
//! }
//! ```
//!
//! ## Tolerance
//!
//! - Unknown `action` values deserialize to `Unknown`
//! - Missing optional fields default (`null`, `true` for `dialogueVisible`)
//! - Actor entries that cannot be read (e.g. no `id`) are dropped

use serde::{Deserialize, Deserializer, Serialize};
use speaker_stage_domain::{ActorId, ActorStageEntry, UserId};
use thiserror::Error;

/// Channel topic shared by every stage client
pub const STAGE_TOPIC: &str = "module.speaker-stage";

fn default_true() -> bool {
    true
}

/// Errors reading a broadcast payload
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Malformed stage message: {0}")]
    Malformed(#[from] serde_json::Error),
}

// =============================================================================
// Messages
// =============================================================================

/// Messages exchanged over the stage topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum StageMessage {
    /// Full roster snapshot from one client
    #[serde(rename = "updateStage", rename_all = "camelCase")]
    UpdateStage {
        #[serde(default, deserialize_with = "lenient_actors")]
        actors: Vec<ActorSnapshot>,
        /// Publishing client
        #[serde(default)]
        user_id: Option<UserId>,
    },

    /// Unknown action for forward compatibility
    #[serde(other)]
    Unknown,
}

impl StageMessage {
    /// Snapshot of `entries` in store order, published by `sender`
    pub fn update_stage<'a>(
        entries: impl IntoIterator<Item = &'a ActorStageEntry>,
        sender: UserId,
    ) -> Self {
        Self::UpdateStage {
            actors: entries.into_iter().map(ActorSnapshot::from).collect(),
            user_id: Some(sender),
        }
    }

    pub fn to_payload(&self) -> Result<serde_json::Value, WireError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, WireError> {
        Ok(Self::deserialize(payload)?)
    }
}

// =============================================================================
// Actor Snapshot
// =============================================================================

/// Serialized form of one stage entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSnapshot {
    pub id: ActorId,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub emotion_id: Option<String>,
    #[serde(default)]
    pub emotion_portrait: Option<String>,
    #[serde(default)]
    pub position: usize,
    #[serde(default = "default_true")]
    pub dialogue_visible: bool,
    /// Client that put the actor on stage
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Client that last set the emotion
    #[serde(default)]
    pub emotion_user_id: Option<UserId>,
}

impl From<&ActorStageEntry> for ActorSnapshot {
    fn from(entry: &ActorStageEntry) -> Self {
        Self {
            id: entry.actor_id.clone(),
            img: entry.image.clone(),
            name: entry.display_name.clone(),
            emotion_id: entry.emotion_id.clone(),
            emotion_portrait: entry.emotion_portrait.clone(),
            position: entry.position,
            dialogue_visible: entry.dialogue_visible,
            user_id: entry.owner_user_id.clone(),
            emotion_user_id: entry.emotion_owner_user_id.clone(),
        }
    }
}

impl From<ActorSnapshot> for ActorStageEntry {
    fn from(snapshot: ActorSnapshot) -> Self {
        // A carried emotion portrait wins over the sender's resolved image
        let image = snapshot.emotion_portrait.clone().unwrap_or(snapshot.img);
        Self {
            actor_id: snapshot.id,
            image,
            display_name: snapshot.name,
            emotion_id: snapshot.emotion_id,
            emotion_portrait: snapshot.emotion_portrait,
            position: snapshot.position,
            dialogue_visible: snapshot.dialogue_visible,
            owner_user_id: snapshot.user_id,
            emotion_owner_user_id: snapshot.emotion_user_id,
        }
    }
}

fn lenient_actors<'de, D>(deserializer: D) -> Result<Vec<ActorSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ActorSnapshot>(value) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, "Dropping unreadable actor in stage snapshot");
                None
            }
        })
        .collect())
}
