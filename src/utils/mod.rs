//! Shared helpers

pub mod progress;

pub use progress::*;
