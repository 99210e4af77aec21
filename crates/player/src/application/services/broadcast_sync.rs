//! Broadcast Synchronizer
//!
//! Publishes the full roster after every local change and replaces the
//! local roster wholesale when another client publishes. Delivery is best
//! effort: no acknowledgement, no retry, no ordering. A lost message leaves
//! a client stale until the next publish.

use speaker_stage_domain::{ActorStageEntry, UserId};
use speaker_stage_shared::{StageMessage, STAGE_TOPIC};

use super::stage_store::StageStore;
use crate::ports::outbound::{BroadcastChannel, PortError};

/// What a received payload did to the local store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The store now holds the sender's roster
    Applied { actors: usize },
    /// Our own publish came back
    SelfEcho,
    /// Not a stage message, or not one we understand
    Ignored,
}

impl SyncOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Applied { .. })
    }
}

#[derive(Debug, Clone)]
pub struct BroadcastSync {
    self_id: UserId,
}

impl BroadcastSync {
    pub fn new(self_id: UserId) -> Self {
        Self { self_id }
    }

    pub fn self_id(&self) -> &UserId {
        &self.self_id
    }

    /// Send the whole roster
    ///
    /// Positions are relabelled 0..N-1 in store order first, so every
    /// receiver sees the same contiguous numbering.
    pub fn publish(
        &self,
        store: &mut StageStore,
        channel: &dyn BroadcastChannel,
    ) -> Result<(), PortError> {
        store.renumber();
        let message = StageMessage::update_stage(store.all(), self.self_id.clone());
        let payload = message
            .to_payload()
            .map_err(|e| PortError::serialization(e.to_string()))?;
        channel.send(STAGE_TOPIC, payload)?;
        tracing::debug!(actors = store.len(), "Published stage roster");
        Ok(())
    }

    /// Apply a payload received on `topic`
    pub fn receive(
        &self,
        topic: &str,
        payload: &serde_json::Value,
        store: &mut StageStore,
    ) -> SyncOutcome {
        if topic != STAGE_TOPIC {
            return SyncOutcome::Ignored;
        }

        let message = match StageMessage::from_payload(payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed stage message");
                return SyncOutcome::Ignored;
            }
        };

        match message {
            StageMessage::UpdateStage { user_id, .. } if user_id.as_ref() == Some(&self.self_id) => {
                SyncOutcome::SelfEcho
            }
            StageMessage::UpdateStage { actors, user_id } => {
                let count = actors.len();
                store.replace_all(actors.into_iter().map(ActorStageEntry::from));
                tracing::debug!(
                    sender = user_id.as_ref().map(|u| u.as_str()).unwrap_or("unknown"),
                    actors = count,
                    "Applied remote stage roster"
                );
                SyncOutcome::Applied { actors: count }
            }
            StageMessage::Unknown => {
                tracing::debug!("Ignoring unknown stage action");
                SyncOutcome::Ignored
            }
        }
    }
}
