//! Infrastructure layer - adapters behind the outbound ports

pub mod messaging;
pub mod platform;
pub mod runtime;

// Recording doubles when the testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub mod testing;
