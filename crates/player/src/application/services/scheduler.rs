//! Virtual-time timer queue
//!
//! Every animation phase, typing tick and fade on a client is a task in one
//! [`TimerQueue`]. The queue never sleeps: a driver (the tokio runtime or a
//! test) decides when time passes and pops whatever has come due. Tasks that
//! share a due time run in the order they were scheduled.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle for cancelling a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub struct TimerQueue<T> {
    now_ms: u64,
    next_id: u64,
    pending: BTreeMap<(u64, TimerId), T>,
    deadlines: HashMap<TimerId, u64>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Run `task` once `delay` has passed
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let due = self.now_ms.saturating_add(delay.as_millis() as u64);
        self.schedule_at(due, task)
    }

    /// Run `task` at virtual time `due_ms` (immediately if already past)
    pub fn schedule_at(&mut self, due_ms: u64, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = due_ms.max(self.now_ms);
        self.pending.insert((due, id), task);
        self.deadlines.insert(id, due);
        id
    }

    /// Drop a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(due) => self.pending.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// Due time of a pending task
    pub fn deadline(&self, id: TimerId) -> Option<u64> {
        self.deadlines.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Due time of the earliest pending task
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Take the earliest task due at or before `now_ms`
    ///
    /// The clock moves to the task's due time, so anything it schedules is
    /// timed from when it was meant to run rather than when it was popped.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, T)> {
        let (due, id) = *self.pending.keys().next()?;
        if due > now_ms {
            return None;
        }
        let task = self.pending.remove(&(due, id))?;
        self.deadlines.remove(&id);
        self.now_ms = self.now_ms.max(due);
        Some((id, task))
    }

    /// Move the clock forward to `now_ms` once everything due has run
    pub fn settle(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
