use crate::application::transcoder::remove_tree;
use crate::config::EmptyOutputPolicy;
use crate::domain::asset::AssetId;
use crate::domain::error::PipelineError;
use crate::domain::hls::{MasterManifest, MasterPlaylist, ResolutionPolicy, StreamInf};
use crate::domain::ladder::Ladder;
use crate::domain::layout::{variant_playlist_rel, OutputLayout};
use crate::ports::storage::StoragePort;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Join step: builds the master playlist from whatever variant playlists exist.
pub struct PlaylistAssembler {
    storage: Arc<dyn StoragePort>,
    layout: OutputLayout,
    ladder: Ladder,
    resolution: ResolutionPolicy,
    empty_output: EmptyOutputPolicy,
}

impl PlaylistAssembler {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        layout: OutputLayout,
        ladder: Ladder,
        resolution: ResolutionPolicy,
        empty_output: EmptyOutputPolicy,
    ) -> Self {
        Self {
            storage,
            layout,
            ladder,
            resolution,
            empty_output,
        }
    }

    /// Missing variants are left out silently. The file is rewritten in full
    /// on every run.
    pub async fn assemble_master(
        &self,
        asset_id: AssetId,
        cancel: &CancellationToken,
    ) -> Result<MasterManifest, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled(asset_id));
        }

        let mut manifest = MasterPlaylist::new(self.resolution);
        for variant in &self.ladder {
            let playlist = self.layout.variant_playlist(asset_id, &variant.name);
            if tokio::fs::try_exists(&playlist).await.unwrap_or(false) {
                manifest.add_variant(StreamInf {
                    name: variant.name.clone(),
                    height: variant.height,
                    bandwidth: variant.bandwidth,
                    uri: variant_playlist_rel(&variant.name),
                });
            }
        }

        let master = self.layout.master_playlist(asset_id);
        if manifest.is_empty() && self.empty_output == EmptyOutputPolicy::Fail {
            // a stale master from an earlier run would point at nothing
            match tokio::fs::remove_file(&master).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(?master, error = %e, "Failed to remove stale master playlist"),
            }
            return Err(PipelineError::NoVariantsProduced(asset_id));
        }

        self.storage.create(asset_id).await?;
        manifest
            .write_to(&master)
            .await
            .map_err(|e| PipelineError::filesystem(&master, e))?;

        if cancel.is_cancelled() {
            remove_tree(&self.layout.asset_dir(asset_id)).await;
            return Err(PipelineError::Cancelled(asset_id));
        }

        info!(
            %asset_id,
            variants = manifest.variants.len(),
            ladder_size = self.ladder.len(),
            "Master playlist written"
        );
        Ok(manifest)
    }
}
