use crate::domain::asset::AssetId;
use crate::domain::error::PipelineError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// What happened to each removal target during cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    /// Targets that did not exist. Not an error.
    pub missing: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Idempotent creation of the asset's output root.
    async fn create(&self, asset_id: AssetId) -> Result<PathBuf, PipelineError>;

    /// Best-effort removal of the source, thumbnail and whole output tree.
    /// Every target is attempted regardless of the others.
    async fn destroy(
        &self,
        asset_id: AssetId,
        source: &Path,
        thumbnail: Option<&Path>,
    ) -> CleanupReport;
}
