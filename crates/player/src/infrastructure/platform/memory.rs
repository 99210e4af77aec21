//! In-process actor and emotion documents
//!
//! Both stores are cheap to clone; clones share the same documents, so a
//! test or demo can keep a handle and edit documents after handing one to
//! a controller.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use speaker_stage_domain::{ActorId, SavedEmotion};

use crate::ports::outbound::{ActorDirectory, ActorRecord, EmotionStore};

#[derive(Debug, Default)]
struct Directory {
    actors: HashMap<ActorId, ActorRecord>,
    speakers: Vec<ActorId>,
}

/// Actor documents plus the registered speaker list
#[derive(Debug, Clone, Default)]
pub struct InMemoryActorDirectory {
    inner: Arc<RwLock<Directory>>,
}

impl InMemoryActorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an actor document
    pub fn insert(&self, id: impl Into<ActorId>, name: &str, portrait: &str) -> ActorId {
        let id = id.into();
        let record = ActorRecord {
            id: id.clone(),
            name: name.to_string(),
            portrait: portrait.to_string(),
        };
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .actors
            .insert(id.clone(), record);
        id
    }

    /// Add an actor and list it on the backstage
    pub fn insert_speaker(&self, id: impl Into<ActorId>, name: &str, portrait: &str) -> ActorId {
        let id = self.insert(id, name, portrait);
        self.register_speaker(id.clone());
        id
    }

    pub fn register_speaker(&self, id: ActorId) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.speakers.contains(&id) {
            inner.speakers.push(id);
        }
    }

    pub fn remove(&self, id: &ActorId) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.actors.remove(id);
        inner.speakers.retain(|speaker| speaker != id);
    }
}

impl ActorDirectory for InMemoryActorDirectory {
    fn lookup(&self, actor_id: &ActorId) -> Option<ActorRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .actors
            .get(actor_id)
            .cloned()
    }

    fn registered_speakers(&self) -> Vec<ActorId> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .speakers
            .clone()
    }
}

/// Saved emotion per actor
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmotionStore {
    inner: Arc<RwLock<HashMap<ActorId, SavedEmotion>>>,
}

impl InMemoryEmotionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, actor_id: impl Into<ActorId>, emotion_id: &str, portrait: &str) {
        let emotion = SavedEmotion {
            emotion_id: Some(emotion_id.to_string()),
            emotion_portrait: Some(portrait.to_string()),
        };
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(actor_id.into(), emotion);
    }

    pub fn clear(&self, actor_id: &ActorId) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(actor_id);
    }
}

impl EmotionStore for InMemoryEmotionStore {
    fn saved_emotion(&self, actor_id: &ActorId) -> Option<SavedEmotion> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(actor_id)
            .cloned()
    }
}
