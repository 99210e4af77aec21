//! Port traits for the stage's host boundaries.

pub mod outbound;
