//! Redis AssetRepository implementation.

use super::error::RedisStoreError;
use super::pool::RedisAssetRepository;
use super::status_key;
use crate::domain::asset::{AssetId, AssetStatus};
use crate::domain::error::PipelineError;
use crate::ports::repository::AssetRepository;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;

impl RedisAssetRepository {
    async fn write_status(
        &self,
        asset_id: AssetId,
        status: AssetStatus,
    ) -> Result<(), RedisStoreError> {
        let mut conn = self.pool.get().await?;
        let json = serde_json::to_string(&status)?;
        conn.set::<_, _, ()>(status_key(asset_id), json).await?;
        Ok(())
    }

    async fn read_status(&self, asset_id: AssetId) -> Result<Option<AssetStatus>, RedisStoreError> {
        let mut conn = self.pool.get().await?;
        let json: Option<String> = conn.get(status_key(asset_id)).await?;
        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AssetRepository for RedisAssetRepository {
    async fn set_status(
        &self,
        asset_id: AssetId,
        status: AssetStatus,
    ) -> Result<(), PipelineError> {
        Ok(self.write_status(asset_id, status).await?)
    }

    async fn status(&self, asset_id: AssetId) -> Result<AssetStatus, PipelineError> {
        Ok(self.read_status(asset_id).await?.unwrap_or_default())
    }
}
