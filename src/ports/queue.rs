use crate::domain::asset::AssetId;
use crate::domain::error::PipelineError;
use crate::domain::jobs::{Job, JobId, Lane};
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueuePort: Send + Sync {
    /// Enqueue a job that becomes eligible once every job in `depends_on` is
    /// terminal. Fails with `QueueUnavailable` when the queue is shut down.
    async fn enqueue(
        &self,
        job: Job,
        depends_on: Vec<JobId>,
        lane: Lane,
    ) -> Result<JobId, PipelineError>;

    /// Drop the asset's jobs from the queue once none is pending or running.
    async fn discard(&self, asset_id: AssetId) -> Result<(), PipelineError>;

    /// Whether discarded jobs of the asset are still running.
    async fn is_draining(&self, asset_id: AssetId) -> Result<bool, PipelineError>;
}
