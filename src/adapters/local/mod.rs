//! Local adapters for monolith deployment.

pub mod events;
pub mod ffmpeg;
pub mod fs;
pub mod http;
pub mod memory;
pub mod redis;

pub use events::hub::EventHub;
pub use ffmpeg::FfmpegEncoder;
pub use fs::FsStorage;
pub use memory::InMemoryAssetRepository;
pub use redis::RedisAssetRepository;
