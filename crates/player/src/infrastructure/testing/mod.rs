//! Test doubles shared by unit and integration tests

mod fixtures;

pub use fixtures::{
    RecordingChannel, RecordingNotifier, RecordingSelector, RecordingSoundPlayer, RecordingView,
};
