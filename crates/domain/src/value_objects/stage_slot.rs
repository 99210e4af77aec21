//! Stage slot layout
//!
//! Assigns each rendered actor a horizontal slot from the number of actors
//! currently on stage. Only the first [`MAX_RENDERED_ACTORS`] entries (in
//! store order) are rendered at all.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum number of actors rendered on stage at once
pub const MAX_RENDERED_ACTORS: usize = 5;

/// Horizontal slot of a stage wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSlot {
    Left,
    Center,
    Right,
}

impl StageSlot {
    /// Slot sequence for a given actor count
    pub fn sequence_for(count: usize) -> &'static [StageSlot] {
        match count {
            0 => &[],
            1 => &[StageSlot::Left],
            2 => &[StageSlot::Left, StageSlot::Right],
            _ => &[StageSlot::Left, StageSlot::Center, StageSlot::Right],
        }
    }

    /// Slot for the entry at `index` among `count` actors
    ///
    /// Indices past the sequence (4th and 5th rendered actors) share center.
    pub fn for_index(index: usize, count: usize) -> StageSlot {
        Self::sequence_for(count)
            .get(index)
            .copied()
            .unwrap_or(StageSlot::Center)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageSlot::Left => "left",
            StageSlot::Center => "center",
            StageSlot::Right => "right",
        }
    }
}

impl fmt::Display for StageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(StageSlot::Left),
            "center" => Ok(StageSlot::Center),
            "right" => Ok(StageSlot::Right),
            _ => Err(DomainError::parse(format!("Unknown stage slot: {}", s))),
        }
    }
}

/// Slots for an ordered list of `count` entries, capped at the render limit
pub fn slot_layout(count: usize) -> Vec<StageSlot> {
    (0..count.min(MAX_RENDERED_ACTORS))
        .map(|index| StageSlot::for_index(index, count))
        .collect()
}
