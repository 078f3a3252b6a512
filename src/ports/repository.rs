use crate::domain::asset::{AssetId, AssetStatus};
use crate::domain::error::PipelineError;
use async_trait::async_trait;

/// Asset metadata lives elsewhere; the pipeline only records lifecycle status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn set_status(&self, asset_id: AssetId, status: AssetStatus)
        -> Result<(), PipelineError>;

    /// `Unprocessed` when no status was ever recorded for the asset.
    async fn status(&self, asset_id: AssetId) -> Result<AssetStatus, PipelineError>;
}
