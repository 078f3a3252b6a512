//! Redis connection pool.

use super::error::RedisStoreError;
use deadpool_redis::{Config, Pool, Runtime};

/// Asset status table kept in Redis, one string key per asset.
#[derive(Clone)]
pub struct RedisAssetRepository {
    pub(super) pool: Pool,
}

impl RedisAssetRepository {
    /// Builds the pool. No connection is made until first use.
    pub fn new(redis_url: &str) -> Result<Self, RedisStoreError> {
        let pool = Config::from_url(redis_url).create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }
}
