//! Ladder - adaptive bitrate HLS packaging for uploaded videos
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (ladder, jobs, job graph, layout, hls)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations
//! - application/: Generic services (scheduler, transcoder, assembler, pipeline)
//! - config: Environment configuration
//!
//! # Features
//! - `local`: Local/monolith deployment (ffmpeg, filesystem, Redis, HTTP API)

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::pipeline::{PipelineRun, PipelineTrigger, TranscodePipeline};
pub use application::scheduler::{RetryPolicy, Scheduler};
pub use config::PipelineConfig;
pub use domain::error::PipelineError;

#[cfg(feature = "local")]
pub use config::LocalConfig;
