//! Domain layer - Pure business logic.

pub mod asset;
pub mod error;
pub mod graph;
pub mod hls;
pub mod jobs;
pub mod ladder;
pub mod layout;
