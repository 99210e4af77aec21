//! Speaker Stage player.
//!
//! Per-client stage logic (store, sync, typing animation, rendering) behind
//! outbound ports, plus in-process adapters and an async runtime to drive it.

pub mod application;
pub mod infrastructure;
pub mod ports;

pub use application::dto::{BackstagePortrait, LocalUser};
pub use application::services::{StageCommand, StageController, SyncOutcome};
pub use infrastructure::messaging::BroadcastHub;
pub use infrastructure::runtime::StageRuntime;
pub use ports::outbound::StagePorts;
