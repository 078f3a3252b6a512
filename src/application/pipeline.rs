//! Per-asset pipeline: fans out one job per ladder rung plus a join, and
//! tears everything down again when the asset is deleted.

use crate::application::assembler::PlaylistAssembler;
use crate::application::scheduler::JobHandler;
use crate::application::transcoder::TranscodeWorker;
use crate::config::PipelineConfig;
use crate::domain::asset::{AssetId, AssetStatus, VideoAsset};
use crate::domain::error::PipelineError;
use crate::domain::jobs::{Job, JobId, JoinJob, Lane, TranscodeJob, VariantJob};
use crate::domain::ladder::Ladder;
use crate::domain::layout::OutputLayout;
use crate::ports::encoder::Encoder;
use crate::ports::queue::JobQueuePort;
use crate::ports::repository::AssetRepository;
use crate::ports::storage::{CleanupReport, StoragePort};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Entry point for the asset repository's lifecycle events, called at commit.
#[async_trait]
pub trait PipelineTrigger: Send + Sync {
    async fn on_created(&self, asset: VideoAsset) -> Result<PipelineRun, PipelineError>;
    async fn on_deleted(&self, asset: VideoAsset) -> Result<CleanupReport, PipelineError>;
}

/// Job graph enqueued for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRun {
    pub asset_id: AssetId,
    pub variant_jobs: Vec<JobId>,
    pub join_job: JobId,
}

struct ActiveRun {
    cancel: CancellationToken,
    /// Recorded before the join is enqueued; the join whose dependencies
    /// match owns the entry
    variant_jobs: Vec<JobId>,
}

pub struct TranscodePipeline<Q, R, S> {
    queue: Q,
    repo: R,
    storage: Arc<S>,
    ladder: Ladder,
    lane: Lane,
    worker: TranscodeWorker,
    assembler: PlaylistAssembler,
    runs: Mutex<HashMap<AssetId, ActiveRun>>,
}

impl<Q, R, S> TranscodePipeline<Q, R, S>
where
    Q: JobQueuePort,
    R: AssetRepository,
    S: StoragePort + 'static,
{
    pub fn new(
        config: &PipelineConfig,
        queue: Q,
        repo: R,
        storage: S,
        encoder: Arc<dyn Encoder>,
    ) -> Self {
        let layout = OutputLayout::new(&config.output_root);
        let storage = Arc::new(storage);
        Self {
            queue,
            repo,
            worker: TranscodeWorker::new(
                encoder,
                storage.clone(),
                layout.clone(),
                config.segment_seconds,
            ),
            assembler: PlaylistAssembler::new(
                storage.clone(),
                layout,
                config.ladder.clone(),
                config.resolution,
                config.empty_output,
            ),
            storage,
            ladder: config.ladder.clone(),
            lane: Lane::Default,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Lane used for every job this pipeline enqueues.
    pub fn with_lane(mut self, lane: Lane) -> Self {
        self.lane = lane;
        self
    }

    /// Token of the asset's live run. Jobs of a deleted (or unknown) asset get
    /// an already cancelled token so they write nothing.
    fn cancel_token(&self, asset_id: AssetId) -> CancellationToken {
        match self.runs.lock().get(&asset_id) {
            Some(run) => run.cancel.clone(),
            None => {
                let token = CancellationToken::new();
                token.cancel();
                token
            }
        }
    }

    async fn enqueue_graph(&self, asset: &VideoAsset) -> Result<PipelineRun, PipelineError> {
        let mut variant_jobs = Vec::with_capacity(self.ladder.len());
        for variant in &self.ladder {
            let job = Job::Variant(VariantJob {
                asset_id: asset.id,
                source_path: asset.source_path.clone(),
                variant: variant.clone(),
            });
            variant_jobs.push(self.queue.enqueue(job, Vec::new(), self.lane).await?);
        }
        if let Some(active) = self.runs.lock().get_mut(&asset.id) {
            active.variant_jobs = variant_jobs.clone();
        }

        let join = Job::Join(JoinJob { asset_id: asset.id });
        let join_job = self
            .queue
            .enqueue(join, variant_jobs.clone(), self.lane)
            .await?;

        Ok(PipelineRun {
            asset_id: asset.id,
            variant_jobs,
            join_job,
        })
    }

    async fn set_status(&self, asset_id: AssetId, status: AssetStatus) {
        if let Err(e) = self.repo.set_status(asset_id, status).await {
            warn!(%asset_id, ?status, error = %e, "Failed to record asset status");
        }
    }

    async fn run_join(
        &self,
        job: &TranscodeJob,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let asset_id = job.asset_id();
        let result = self.assembler.assemble_master(asset_id, cancel).await;

        let owns_run = {
            let mut runs = self.runs.lock();
            let owns = runs
                .get(&asset_id)
                .map(|run| run.variant_jobs == job.depends_on)
                .unwrap_or(false);
            if owns {
                runs.remove(&asset_id);
            }
            owns
        };

        match &result {
            Ok(manifest) => {
                info!(%asset_id, variants = manifest.variants.len(), "Asset ready");
                if owns_run {
                    self.set_status(asset_id, AssetStatus::Ready).await;
                }
            }
            Err(PipelineError::Cancelled(_)) => {}
            Err(e) => {
                warn!(%asset_id, error = %e, "Asset failed");
                if owns_run {
                    self.set_status(asset_id, AssetStatus::Failed).await;
                }
            }
        }
        result.map(|_| ())
    }
}

#[async_trait]
impl<Q, R, S> PipelineTrigger for TranscodePipeline<Q, R, S>
where
    Q: JobQueuePort,
    R: AssetRepository,
    S: StoragePort + 'static,
{
    /// Enqueues |ladder| variant jobs and one join depending on all of them.
    async fn on_created(&self, asset: VideoAsset) -> Result<PipelineRun, PipelineError> {
        // cancelled jobs of a deleted predecessor still hold the output tree
        if self.queue.is_draining(asset.id).await? {
            return Err(PipelineError::AlreadyProcessing(asset.id));
        }
        {
            let mut runs = self.runs.lock();
            if runs.contains_key(&asset.id) {
                return Err(PipelineError::AlreadyProcessing(asset.id));
            }
            runs.insert(
                asset.id,
                ActiveRun {
                    cancel: CancellationToken::new(),
                    variant_jobs: Vec::new(),
                },
            );
        }
        self.set_status(asset.id, AssetStatus::Processing).await;

        match self.enqueue_graph(&asset).await {
            Ok(run) => {
                info!(
                    asset_id = %asset.id,
                    variants = run.variant_jobs.len(),
                    "Enqueued transcode pipeline"
                );
                Ok(run)
            }
            Err(e) => {
                // whatever made it into the queue must not write anything
                if let Some(active) = self.runs.lock().remove(&asset.id) {
                    active.cancel.cancel();
                }
                if let Err(discard) = self.queue.discard(asset.id).await {
                    warn!(
                        asset_id = %asset.id,
                        error = %discard,
                        "Failed to discard partial pipeline"
                    );
                }
                self.set_status(asset.id, AssetStatus::Failed).await;
                Err(e)
            }
        }
    }

    /// Cancels in-flight work, then removes source, thumbnail and output tree.
    async fn on_deleted(&self, asset: VideoAsset) -> Result<CleanupReport, PipelineError> {
        if let Some(active) = self.runs.lock().remove(&asset.id) {
            info!(asset_id = %asset.id, "Cancelling in-flight pipeline");
            active.cancel.cancel();
        }
        self.queue.discard(asset.id).await?;

        let report = self
            .storage
            .destroy(asset.id, &asset.source_path, asset.thumbnail_path.as_deref())
            .await;
        for (path, error) in &report.failed {
            warn!(asset_id = %asset.id, ?path, %error, "Cleanup step failed");
        }
        self.set_status(asset.id, AssetStatus::Deleted).await;
        Ok(report)
    }
}

#[async_trait]
impl<Q, R, S> JobHandler for TranscodePipeline<Q, R, S>
where
    Q: JobQueuePort + 'static,
    R: AssetRepository + 'static,
    S: StoragePort + 'static,
{
    async fn handle(&self, job: &TranscodeJob) -> Result<(), PipelineError> {
        let cancel = self.cancel_token(job.asset_id());
        match &job.job {
            Job::Variant(v) => self
                .worker
                .run_variant(v.asset_id, &v.source_path, &v.variant, &cancel)
                .await
                .map(|_| ()),
            Job::Join(_) => self.run_join(job, &cancel).await,
        }
    }
}
