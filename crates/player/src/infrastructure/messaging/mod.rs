//! In-process broadcast transport
//!
//! Stands in for the host's shared socket: every client subscribed to the
//! hub sees every publish, its own included.

mod broadcast_hub;

pub use broadcast_hub::{BroadcastHub, HubChannel, HubMessage, DEFAULT_HUB_CAPACITY};
