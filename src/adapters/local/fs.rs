use crate::domain::asset::AssetId;
use crate::domain::error::PipelineError;
use crate::domain::layout::OutputLayout;
use crate::ports::storage::{CleanupReport, StoragePort};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Output tree on the local filesystem, rooted at the layout's root.
#[derive(Debug, Clone)]
pub struct FsStorage {
    layout: OutputLayout,
}

impl FsStorage {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }
}

enum Target {
    File,
    Tree,
}

async fn remove(path: &Path, target: Target, report: &mut CleanupReport) {
    let result = match target {
        Target::File => tokio::fs::remove_file(path).await,
        Target::Tree => tokio::fs::remove_dir_all(path).await,
    };
    match result {
        Ok(()) => report.removed.push(path.to_path_buf()),
        Err(e) if e.kind() == ErrorKind::NotFound => report.missing.push(path.to_path_buf()),
        Err(e) => report.failed.push((path.to_path_buf(), e.to_string())),
    }
}

#[async_trait]
impl StoragePort for FsStorage {
    async fn create(&self, asset_id: AssetId) -> Result<PathBuf, PipelineError> {
        let dir = self.layout.asset_dir(asset_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PipelineError::filesystem(&dir, e))?;
        Ok(dir)
    }

    async fn destroy(
        &self,
        asset_id: AssetId,
        source: &Path,
        thumbnail: Option<&Path>,
    ) -> CleanupReport {
        let mut report = CleanupReport::default();
        remove(source, Target::File, &mut report).await;
        if let Some(thumbnail) = thumbnail {
            remove(thumbnail, Target::File, &mut report).await;
        }
        remove(&self.layout.asset_dir(asset_id), Target::Tree, &mut report).await;
        report
    }
}
