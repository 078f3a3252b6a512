//! Ports - Trait definitions for the pipeline's external collaborators.

pub mod encoder;
pub mod queue;
pub mod repository;
pub mod storage;
