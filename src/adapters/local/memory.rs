use crate::domain::asset::{AssetId, AssetStatus};
use crate::domain::error::PipelineError;
use crate::ports::repository::AssetRepository;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-local status table, used when no Redis URL is configured.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetRepository {
    statuses: Arc<RwLock<HashMap<AssetId, AssetStatus>>>,
}

impl InMemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetRepository for InMemoryAssetRepository {
    async fn set_status(
        &self,
        asset_id: AssetId,
        status: AssetStatus,
    ) -> Result<(), PipelineError> {
        self.statuses.write().insert(asset_id, status);
        Ok(())
    }

    async fn status(&self, asset_id: AssetId) -> Result<AssetStatus, PipelineError> {
        Ok(self
            .statuses
            .read()
            .get(&asset_id)
            .copied()
            .unwrap_or_default())
    }
}
