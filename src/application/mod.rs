//! Application layer - Generic services that use ports.

pub mod assembler;
pub mod pipeline;
pub mod scheduler;
pub mod transcoder;
