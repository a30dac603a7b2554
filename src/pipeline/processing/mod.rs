//! Pure pipeline stages, in dependency order. Each stage consumes the
//! previous stage's output; data flows strictly forward and no stage
//! mutates upstream state.

pub mod anomaly;
pub mod classify;
pub mod dedup;
pub mod extract;
pub mod quality;
pub mod validate;
