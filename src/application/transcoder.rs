use crate::domain::asset::AssetId;
use crate::domain::error::PipelineError;
use crate::domain::ladder::VariantSpec;
use crate::domain::layout::{variant_playlist_rel, OutputLayout};
use crate::ports::encoder::{EncodeRequest, Encoder};
use crate::ports::storage::StoragePort;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a successful variant job leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantResult {
    pub name: String,
    pub height: u32,
    pub bandwidth: u64,
    /// Playlist path relative to the asset root
    pub playlist_rel: String,
    pub segments: usize,
}

/// Executes one variant job: fresh variant directory, one encoder run,
/// verified output.
pub struct TranscodeWorker {
    encoder: Arc<dyn Encoder>,
    storage: Arc<dyn StoragePort>,
    layout: OutputLayout,
    segment_seconds: u32,
}

impl TranscodeWorker {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        storage: Arc<dyn StoragePort>,
        layout: OutputLayout,
        segment_seconds: u32,
    ) -> Self {
        Self {
            encoder,
            storage,
            layout,
            segment_seconds,
        }
    }

    /// Re-running for the same (asset, variant) replaces the previous output.
    /// A cancelled asset never ends up with an output directory.
    pub async fn run_variant(
        &self,
        asset_id: AssetId,
        source: &Path,
        variant: &VariantSpec,
        cancel: &CancellationToken,
    ) -> Result<VariantResult, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled(asset_id));
        }
        let present = tokio::fs::try_exists(source)
            .await
            .map_err(|e| PipelineError::filesystem(source, e))?;
        if !present {
            return Err(PipelineError::MissingInput(source.to_path_buf()));
        }

        let result = self.encode(asset_id, source, variant, cancel).await;

        if cancel.is_cancelled() {
            // the asset was deleted while we were encoding
            remove_tree(&self.layout.asset_dir(asset_id)).await;
            return Err(PipelineError::Cancelled(asset_id));
        }
        if result.is_err() {
            // a failed variant must not leave a playlist the join could pick up
            remove_tree(&self.layout.variant_dir(asset_id, &variant.name)).await;
        }
        result
    }

    async fn encode(
        &self,
        asset_id: AssetId,
        source: &Path,
        variant: &VariantSpec,
        cancel: &CancellationToken,
    ) -> Result<VariantResult, PipelineError> {
        self.storage.create(asset_id).await?;

        let dir = self.layout.variant_dir(asset_id, &variant.name);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => debug!(%asset_id, variant = %variant.name, "Replacing previous output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(PipelineError::filesystem(&dir, e)),
        }
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PipelineError::filesystem(&dir, e))?;

        let request = EncodeRequest {
            asset_id,
            source: source.to_path_buf(),
            variant: variant.clone(),
            playlist: self.layout.variant_playlist(asset_id, &variant.name),
            segment_pattern: self.layout.segment_pattern(asset_id, &variant.name),
            segment_seconds: self.segment_seconds,
        };
        self.encoder.encode(&request, cancel).await?;

        let written = tokio::fs::try_exists(&request.playlist)
            .await
            .map_err(|e| PipelineError::filesystem(&request.playlist, e))?;
        if !written {
            return Err(PipelineError::ExternalProcess {
                program: "encoder".to_string(),
                code: Some(0),
                stderr: format!("no playlist written at {:?}", request.playlist),
            });
        }
        let segments = count_segments(&dir).await?;

        info!(%asset_id, variant = %variant.name, segments, "Variant transcoded");
        Ok(VariantResult {
            name: variant.name.clone(),
            height: variant.height,
            bandwidth: variant.bandwidth,
            playlist_rel: variant_playlist_rel(&variant.name),
            segments,
        })
    }
}

async fn count_segments(dir: &Path) -> Result<usize, PipelineError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| PipelineError::filesystem(dir, e))?;
    let mut count = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::filesystem(dir, e))?
    {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("seg_") && name.ends_with(".ts") {
            count += 1;
        }
    }
    Ok(count)
}

pub(crate) async fn remove_tree(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!(?path, "Removed output"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(?path, error = %e, "Failed to remove output"),
    }
}
