//! Stage State Store - the actors on stage for one client, in insertion order

use speaker_stage_domain::{ActorId, ActorStageEntry};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageStore {
    entries: Vec<ActorStageEntry>,
}

impl StageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry
    ///
    /// A new actor goes to the end with `position` set to the store size
    /// before insertion. An actor already present keeps its place and its
    /// position.
    pub fn put(&mut self, mut entry: ActorStageEntry) {
        match self.index_of(&entry.actor_id) {
            Some(index) => {
                entry.position = self.entries[index].position;
                self.entries[index] = entry;
            }
            None => {
                entry.position = self.entries.len();
                self.entries.push(entry);
            }
        }
    }

    pub fn remove(&mut self, actor_id: &ActorId) -> Option<ActorStageEntry> {
        let index = self.index_of(actor_id)?;
        Some(self.entries.remove(index))
    }

    pub fn has(&self, actor_id: &ActorId) -> bool {
        self.index_of(actor_id).is_some()
    }

    pub fn get(&self, actor_id: &ActorId) -> Option<&ActorStageEntry> {
        self.entries.iter().find(|e| &e.actor_id == actor_id)
    }

    pub fn get_mut(&mut self, actor_id: &ActorId) -> Option<&mut ActorStageEntry> {
        self.entries.iter_mut().find(|e| &e.actor_id == actor_id)
    }

    /// Every entry in store order
    pub fn all(&self) -> &[ActorStageEntry] {
        &self.entries
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActorStageEntry> {
        self.entries.iter_mut()
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.entries.iter().map(|e| e.actor_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the whole roster with a received snapshot
    ///
    /// Positions are taken verbatim. A repeated actor id keeps its first
    /// place in the order and the last entry's data.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = ActorStageEntry>) {
        self.entries.clear();
        for entry in entries {
            match self.index_of(&entry.actor_id) {
                Some(index) => self.entries[index] = entry,
                None => self.entries.push(entry),
            }
        }
    }

    /// Relabel positions 0..N-1 in store order
    pub fn renumber(&mut self) {
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.position = position;
        }
    }

    fn index_of(&self, actor_id: &ActorId) -> Option<usize> {
        self.entries.iter().position(|e| &e.actor_id == actor_id)
    }
}
