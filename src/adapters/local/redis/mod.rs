//! Redis adapter for local deployment.
//!
//! Provides a Redis-backed `AssetRepository` so asset status survives a
//! restart of the monolith.

mod error;
mod pool;
mod repository;

pub use error::RedisStoreError;
pub use pool::RedisAssetRepository;

/// Redis key constants
const ASSET_STATUS_PREFIX: &str = "ladder:asset_status:";

fn status_key(asset_id: crate::domain::asset::AssetId) -> String {
    format!("{}{}", ASSET_STATUS_PREFIX, asset_id)
}
