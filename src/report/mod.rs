//! Report module - elimination trajectory and final ranking

mod trajectory;

pub use trajectory::*;
