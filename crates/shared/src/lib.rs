//! Speaker Stage Shared - wire types exchanged between stage clients
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, thiserror and tracing
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Lenient reads** - A malformed snapshot degrades to defaults, never panics

pub mod messages;

pub use messages::{ActorSnapshot, StageMessage, WireError, STAGE_TOPIC};
