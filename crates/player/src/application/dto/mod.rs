//! Data shapes crossing the controller boundary

use serde::{Deserialize, Serialize};
use speaker_stage_domain::{ActorId, UserId};

/// The user this client runs for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: UserId,
    pub is_gm: bool,
    /// Character assigned to a player, if any
    pub character: Option<ActorId>,
}

impl LocalUser {
    pub fn gm(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            is_gm: true,
            character: None,
        }
    }

    pub fn player(id: impl Into<UserId>, character: Option<ActorId>) -> Self {
        Self {
            id: id.into(),
            is_gm: false,
            character,
        }
    }

    /// A player with a freshly generated id
    pub fn anonymous_player(character: Option<ActorId>) -> Self {
        Self::player(uuid::Uuid::new_v4().to_string(), character)
    }
}

/// One portrait on the GM backstage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackstagePortrait {
    pub actor_id: ActorId,
    pub name: String,
    /// Saved emotion portrait, else the base portrait
    pub portrait: String,
    pub on_stage: bool,
}
