//! In-process job scheduler: a dependency graph in front of a pool of workers.
//!
//! Jobs without dependencies go straight to a ready lane. Jobs with
//! dependencies stay parked in the graph until the last dependency reaches a
//! terminal state, at which point `complete` moves them to their lane. Workers
//! only ever see eligible jobs.

use crate::config::PipelineConfig;
use crate::domain::asset::AssetId;
use crate::domain::error::PipelineError;
use crate::domain::graph::{JobGraph, Outcome};
use crate::domain::jobs::{Job, JobId, JobState, Lane, TranscodeJob};
use crate::ports::queue::JobQueuePort;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Runs a single claimed job. The scheduler owns state transitions; the
/// handler only reports how the attempt went.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, job: &TranscodeJob) -> Result<(), PipelineError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Enqueued { job_id: JobId, asset_id: AssetId },
    Started { job_id: JobId, asset_id: AssetId },
    Retrying { job_id: JobId, attempt: u32, error: String },
    Succeeded { job_id: JobId, asset_id: AssetId },
    Failed { job_id: JobId, asset_id: AssetId, error: String },
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `next_attempt` (2, 3, ...): backoff, 2x, 4x, ...
    pub fn delay_before(&self, next_attempt: u32) -> Duration {
        let exp = next_attempt.saturating_sub(2).min(16);
        self.backoff.saturating_mul(1 << exp)
    }
}

impl From<&PipelineConfig> for RetryPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: config.retry_backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

#[derive(Default)]
struct State {
    graph: JobGraph,
    high: VecDeque<JobId>,
    normal: VecDeque<JobId>,
    /// Purged jobs per asset, dropped from the table once all are terminal.
    /// Jobs enqueued for the asset after the purge are not in here.
    discarded: HashMap<AssetId, Vec<JobId>>,
    closed: bool,
}

impl State {
    fn push_ready(&mut self, id: JobId) {
        let lane = self.graph.get(id).map(|j| j.lane).unwrap_or_default();
        match lane {
            Lane::High => self.high.push_back(id),
            Lane::Default => self.normal.push_back(id),
        }
    }

    fn pop_claimable(&mut self) -> Option<TranscodeJob> {
        while let Some(id) = self.high.pop_front().or_else(|| self.normal.pop_front()) {
            if let Some(job) = self.graph.start(id) {
                return Some(job);
            }
            // stale entry: job was discarded or claimed elsewhere
        }
        None
    }

    fn collect_discarded(&mut self, asset_id: AssetId) {
        let Some(ids) = self.discarded.get(&asset_id) else {
            return;
        };
        if let Some(removed) = self.graph.remove_jobs(ids) {
            self.discarded.remove(&asset_id);
            debug!(%asset_id, removed, "Dropped jobs of discarded asset");
        }
    }
}

struct Inner {
    state: Mutex<State>,
    work_ready: Notify,
    changed: Notify,
    events: broadcast::Sender<JobEvent>,
    shutdown: CancellationToken,
    retry: RetryPolicy,
}

/// Cheap to clone; every clone drives the same job table.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(retry: RetryPolicy) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                work_ready: Notify::new(),
                changed: Notify::new(),
                events,
                shutdown: CancellationToken::new(),
                retry,
            }),
        }
    }

    /// Adds a job to the table. It is dispatched once every job in
    /// `depends_on` is terminal, succeeded or failed.
    pub fn submit(
        &self,
        job: Job,
        depends_on: &[JobId],
        lane: Lane,
    ) -> Result<JobId, PipelineError> {
        let id = JobId::new();
        let asset_id = job.asset_id();
        let eligible = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(PipelineError::QueueUnavailable(
                    "scheduler is shut down".to_string(),
                ));
            }
            let eligible = state.graph.insert(id, job, lane, depends_on)?;
            if eligible {
                state.push_ready(id);
            }
            eligible
        };

        debug!(job_id = %id, %asset_id, ?lane, eligible, "Enqueued job");
        self.emit(JobEvent::Enqueued {
            job_id: id,
            asset_id,
        });
        if eligible {
            self.inner.work_ready.notify_one();
        }
        Ok(id)
    }

    /// Spawns `pool_size` worker tasks draining the ready lanes.
    pub fn run_workers<H: JobHandler>(
        &self,
        pool_size: usize,
        handler: Arc<H>,
    ) -> Vec<JoinHandle<()>> {
        (0..pool_size)
            .map(|worker_id| {
                let scheduler = self.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    scheduler.worker_loop(worker_id, handler).await;
                })
            })
            .collect()
    }

    /// Rejects new jobs and stops idle workers. Busy workers exit after their
    /// current job.
    pub fn shutdown(&self) {
        self.inner.state.lock().closed = true;
        self.inner.shutdown.cancel();
    }

    pub fn job(&self, id: JobId) -> Option<TranscodeJob> {
        self.inner.state.lock().graph.get(id).cloned()
    }

    pub fn jobs_for_asset(&self, asset_id: AssetId) -> Vec<TranscodeJob> {
        self.inner.state.lock().graph.jobs_for_asset(asset_id)
    }

    pub fn is_eligible(&self, id: JobId) -> bool {
        self.inner.state.lock().graph.is_eligible(id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.events.subscribe()
    }

    /// Fails the asset's pending jobs and forgets every job it has right now
    /// once none of them is running any more.
    pub fn purge_asset(&self, asset_id: AssetId) {
        let dropped = {
            let mut state = self.inner.state.lock();
            let jobs = state.graph.jobs_for_asset(asset_id);
            let pending: Vec<JobId> = jobs
                .iter()
                .filter(|job| job.state == JobState::Pending)
                .map(|job| job.id)
                .collect();
            for id in &pending {
                // dependents belong to the same asset and are in `pending` too
                let _ = state.graph.finish(*id, Outcome::Failed("asset purged".to_string()));
            }
            let purged = state.discarded.entry(asset_id).or_default();
            for job in &jobs {
                if !purged.contains(&job.id) {
                    purged.push(job.id);
                }
            }
            state.collect_discarded(asset_id);
            pending
        };

        for job_id in dropped {
            debug!(%job_id, %asset_id, "Dropped pending job");
            self.emit(JobEvent::Failed {
                job_id,
                asset_id,
                error: "asset purged".to_string(),
            });
        }
        self.inner.changed.notify_waiters();
    }

    /// Whether purged jobs of the asset are still running.
    pub fn is_draining(&self, asset_id: AssetId) -> bool {
        self.inner.state.lock().discarded.contains_key(&asset_id)
    }

    /// Resolves once the job is terminal and returns its final snapshot.
    pub async fn wait_terminal(&self, id: JobId) -> Result<TranscodeJob, PipelineError> {
        loop {
            let notified = self.inner.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.job(id) {
                None => return Err(PipelineError::UnknownJob(id)),
                Some(job) if job.state.is_terminal() => return Ok(job),
                Some(_) => {}
            }
            notified.await;
        }
    }

    /// Resolves once every job of the asset is terminal (or was discarded).
    pub async fn wait_asset(&self, asset_id: AssetId) {
        loop {
            let notified = self.inner.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.state.lock().graph.is_asset_terminal(asset_id) {
                return;
            }
            notified.await;
        }
    }

    async fn worker_loop<H: JobHandler>(&self, worker_id: usize, handler: Arc<H>) {
        debug!(worker_id, "Worker started");
        while let Some(job) = self.next_job().await {
            self.execute(worker_id, job, handler.as_ref()).await;
        }
        debug!(worker_id, "Worker stopped");
    }

    async fn next_job(&self) -> Option<TranscodeJob> {
        loop {
            if self.inner.shutdown.is_cancelled() {
                return None;
            }
            let claimed = self.inner.state.lock().pop_claimable();
            if let Some(job) = claimed {
                return Some(job);
            }
            tokio::select! {
                _ = self.inner.work_ready.notified() => {}
                _ = self.inner.shutdown.cancelled() => return None,
            }
        }
    }

    async fn execute<H: JobHandler>(&self, worker_id: usize, mut job: TranscodeJob, handler: &H) {
        let asset_id = job.asset_id();
        info!(
            worker_id,
            job_id = %job.id,
            %asset_id,
            kind = ?job.kind(),
            job = job.job.label(),
            "Processing job"
        );
        self.emit(JobEvent::Started {
            job_id: job.id,
            asset_id,
        });
        self.inner.changed.notify_waiters();

        let outcome = loop {
            match handler.handle(&job).await {
                Ok(()) => break Outcome::Succeeded,
                Err(e) if e.is_retryable() && job.attempts < self.inner.retry.max_attempts => {
                    let message = e.to_string();
                    let retried = self.inner.state.lock().graph.retry(job.id, message.clone());
                    let attempt = match retried {
                        Ok(attempt) => attempt,
                        Err(e) => break Outcome::Failed(e.to_string()),
                    };
                    let delay = self.inner.retry.delay_before(attempt);
                    warn!(
                        job_id = %job.id,
                        %asset_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %message,
                        "Job failed, retrying"
                    );
                    self.emit(JobEvent::Retrying {
                        job_id: job.id,
                        attempt,
                        error: message,
                    });
                    tokio::time::sleep(delay).await;
                    job.attempts = attempt;
                }
                Err(e) => break Outcome::Failed(e.to_string()),
            }
        };

        match &outcome {
            Outcome::Succeeded => {
                info!(job_id = %job.id, %asset_id, job = job.job.label(), "Job succeeded");
                self.emit(JobEvent::Succeeded {
                    job_id: job.id,
                    asset_id,
                });
            }
            Outcome::Failed(error) => {
                error!(job_id = %job.id, %asset_id, job = job.job.label(), %error, "Job failed");
                self.emit(JobEvent::Failed {
                    job_id: job.id,
                    asset_id,
                    error: error.clone(),
                });
            }
        }

        self.complete(job.id, asset_id, outcome);
    }

    /// Records the terminal outcome and moves released dependents to their lanes,
    /// all under one lock.
    fn complete(&self, id: JobId, asset_id: AssetId, outcome: Outcome) {
        let released = {
            let mut state = self.inner.state.lock();
            let released = match state.graph.finish(id, outcome) {
                Ok(released) => released,
                Err(e) => {
                    warn!(job_id = %id, error = %e, "Completed job is no longer tracked");
                    Vec::new()
                }
            };
            for dependent in &released {
                state.push_ready(*dependent);
            }
            state.collect_discarded(asset_id);
            released
        };

        for dependent in &released {
            debug!(job_id = %dependent, "Dependencies resolved");
            self.inner.work_ready.notify_one();
        }
        self.inner.changed.notify_waiters();
    }

    fn emit(&self, event: JobEvent) {
        // no subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

#[async_trait]
impl JobQueuePort for Scheduler {
    async fn enqueue(
        &self,
        job: Job,
        depends_on: Vec<JobId>,
        lane: Lane,
    ) -> Result<JobId, PipelineError> {
        self.submit(job, &depends_on, lane)
    }

    async fn discard(&self, asset_id: AssetId) -> Result<(), PipelineError> {
        self.purge_asset(asset_id);
        Ok(())
    }

    async fn is_draining(&self, asset_id: AssetId) -> Result<bool, PipelineError> {
        Ok(Scheduler::is_draining(self, asset_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jobs::{JoinJob, VariantJob};
    use crate::domain::ladder::Ladder;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    fn variant(asset: u64, name: &str) -> Job {
        let spec = Ladder::default()
            .iter()
            .find(|v| v.name == name)
            .cloned()
            .unwrap();
        Job::Variant(VariantJob {
            asset_id: AssetId(asset),
            source_path: PathBuf::from("in.mp4"),
            variant: spec,
        })
    }

    fn join(asset: u64) -> Job {
        Job::Join(JoinJob {
            asset_id: AssetId(asset),
        })
    }

    /// Fails the variants named in `failing` with a non-retryable error and
    /// checks that no join runs while a sibling variant is still running.
    struct Recorder {
        failing: Vec<String>,
        running_variants: Mutex<HashMap<AssetId, usize>>,
        join_overlap: AtomicUsize,
        order: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                running_variants: Mutex::new(HashMap::new()),
                join_overlap: AtomicUsize::new(0),
                order: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl JobHandler for Recorder {
        async fn handle(&self, job: &TranscodeJob) -> Result<(), PipelineError> {
            let asset = job.asset_id();
            match &job.job {
                Job::Variant(v) => {
                    *self.running_variants.lock().entry(asset).or_default() += 1;
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    *self.running_variants.lock().entry(asset).or_default() -= 1;
                    self.order.lock().push(v.variant.name.clone());
                    if self.failing.contains(&v.variant.name) {
                        return Err(PipelineError::MissingInput(v.source_path.clone()));
                    }
                    Ok(())
                }
                Job::Join(_) => {
                    if self.running_variants.lock().get(&asset).copied().unwrap_or(0) > 0 {
                        self.join_overlap.fetch_add(1, Ordering::SeqCst);
                    }
                    self.order.lock().push("join".to_string());
                    Ok(())
                }
            }
        }
    }

    fn enqueue_asset(scheduler: &Scheduler, asset: u64) -> (Vec<JobId>, JobId) {
        let variants: Vec<JobId> = ["360p", "480p", "720p", "1080p"]
            .iter()
            .map(|name| scheduler.submit(variant(asset, name), &[], Lane::Default).unwrap())
            .collect();
        let join_id = scheduler.submit(join(asset), &variants, Lane::Default).unwrap();
        (variants, join_id)
    }

    #[tokio::test]
    async fn test_join_runs_after_all_variants() {
        let scheduler = Scheduler::new(fast_retry());
        let (variants, join_id) = enqueue_asset(&scheduler, 42);
        assert!(!scheduler.is_eligible(join_id));

        let recorder = Arc::new(Recorder::new(&[]));
        let handles = scheduler.run_workers(3, recorder.clone());

        let joined = scheduler.wait_terminal(join_id).await.unwrap();
        assert_eq!(joined.state, JobState::Succeeded);
        for id in &variants {
            assert_eq!(scheduler.job(*id).unwrap().state, JobState::Succeeded);
        }
        let order = recorder.order.lock().clone();
        assert_eq!(order.len(), 5);
        assert_eq!(order.last().map(String::as_str), Some("join"));
        assert_eq!(recorder.join_overlap.load(Ordering::SeqCst), 0);

        scheduler.shutdown();
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_failed_variant_does_not_block_join() {
        let scheduler = Scheduler::new(fast_retry());
        let (variants, join_id) = enqueue_asset(&scheduler, 42);

        let recorder = Arc::new(Recorder::new(&["720p"]));
        scheduler.run_workers(4, recorder.clone());

        let joined = scheduler.wait_terminal(join_id).await.unwrap();
        assert_eq!(joined.state, JobState::Succeeded);

        let failed = scheduler.job(variants[2]).unwrap();
        assert_eq!(failed.state, JobState::Failed);
        assert_eq!(failed.attempts, 1, "missing input is not retried");
        assert!(failed.last_error.unwrap().contains("not found"));
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_many_assets_in_parallel() {
        let scheduler = Scheduler::new(fast_retry());
        let joins: Vec<JobId> = (0..6).map(|a| enqueue_asset(&scheduler, a).1).collect();

        let recorder = Arc::new(Recorder::new(&["480p"]));
        scheduler.run_workers(8, recorder.clone());

        for j in joins {
            assert_eq!(
                scheduler.wait_terminal(j).await.unwrap().state,
                JobState::Succeeded
            );
        }
        assert_eq!(recorder.join_overlap.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.order.lock().len(), 30);
        scheduler.shutdown();
    }

    struct Flaky {
        calls: AtomicUsize,
        fail_times: usize,
    }

    #[async_trait]
    impl JobHandler for Flaky {
        async fn handle(&self, _job: &TranscodeJob) -> Result<(), PipelineError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                return Err(PipelineError::ExternalProcess {
                    program: "ffmpeg".into(),
                    code: Some(1),
                    stderr: format!("attempt {}", n + 1),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_retries_external_failures_until_success() {
        let scheduler = Scheduler::new(fast_retry());
        let mut events = scheduler.subscribe();
        let id = scheduler.submit(variant(1, "360p"), &[], Lane::Default).unwrap();

        let flaky = Arc::new(Flaky {
            calls: AtomicUsize::new(0),
            fail_times: 2,
        });
        scheduler.run_workers(1, flaky.clone());

        let job = scheduler.wait_terminal(id).await.unwrap();
        assert_eq!(job.state, JobState::Succeeded);
        assert_eq!(job.attempts, 3);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);

        let mut retries = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, JobEvent::Retrying { .. }) {
                retries += 1;
            }
        }
        assert_eq!(retries, 2);
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let scheduler = Scheduler::new(fast_retry());
        let id = scheduler.submit(variant(1, "360p"), &[], Lane::Default).unwrap();

        let flaky = Arc::new(Flaky {
            calls: AtomicUsize::new(0),
            fail_times: 10,
        });
        scheduler.run_workers(2, flaky.clone());

        let job = scheduler.wait_terminal(id).await.unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.attempts, 3);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert!(job.last_error.unwrap().contains("attempt 3"));
        scheduler.shutdown();
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_before(2), Duration::from_millis(100));
        assert_eq!(policy.delay_before(3), Duration::from_millis(200));
        assert_eq!(policy.delay_before(4), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_high_lane_drains_first() {
        let scheduler = Scheduler::new(fast_retry());
        let low = scheduler.submit(variant(1, "360p"), &[], Lane::Default).unwrap();
        let high = scheduler.submit(variant(2, "360p"), &[], Lane::High).unwrap();

        let first = scheduler.inner.state.lock().pop_claimable().unwrap();
        let second = scheduler.inner.state.lock().pop_claimable().unwrap();
        assert_eq!(first.id, high);
        assert_eq!(second.id, low);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_enqueue() {
        let scheduler = Scheduler::new(fast_retry());
        scheduler.shutdown();
        let err = scheduler
            .enqueue(variant(1, "360p"), vec![], Lane::Default)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::QueueUnavailable(_)));
    }

    #[tokio::test]
    async fn test_purge_drops_pending_and_waits_for_running() {
        let scheduler = Scheduler::new(fast_retry());
        let (variants, join_id) = enqueue_asset(&scheduler, 5);
        let mut events = scheduler.subscribe();

        let running = scheduler.inner.state.lock().pop_claimable().unwrap();
        assert_eq!(running.id, variants[0]);

        scheduler.purge_asset(AssetId(5));
        // the running job keeps the asset's table alive
        let jobs = scheduler.jobs_for_asset(AssetId(5));
        assert_eq!(jobs.len(), 5);
        let failed = jobs.iter().filter(|j| j.state == JobState::Failed).count();
        assert_eq!(failed, 4);
        assert_eq!(scheduler.job(join_id).unwrap().state, JobState::Failed);

        let mut dropped = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, JobEvent::Failed { .. }) {
                dropped += 1;
            }
        }
        assert_eq!(dropped, 4);

        scheduler.complete(running.id, AssetId(5), Outcome::Succeeded);
        assert!(scheduler.jobs_for_asset(AssetId(5)).is_empty());
        assert!(matches!(
            scheduler.wait_terminal(join_id).await,
            Err(PipelineError::UnknownJob(_))
        ));
        // stale ready entries are skipped
        assert!(scheduler.inner.state.lock().pop_claimable().is_none());
    }

    #[tokio::test]
    async fn test_jobs_enqueued_after_purge_survive_the_drain() {
        let scheduler = Scheduler::new(fast_retry());
        let old = scheduler
            .submit(variant(5, "360p"), &[], Lane::Default)
            .unwrap();
        let running = scheduler.inner.state.lock().pop_claimable().unwrap();
        assert_eq!(running.id, old);

        scheduler.purge_asset(AssetId(5));
        assert!(scheduler.is_draining(AssetId(5)));

        let fresh = scheduler
            .submit(variant(5, "480p"), &[], Lane::Default)
            .unwrap();
        let join_id = scheduler.submit(join(5), &[fresh], Lane::Default).unwrap();

        scheduler.complete(old, AssetId(5), Outcome::Failed("cancelled".into()));
        assert!(!scheduler.is_draining(AssetId(5)));
        assert!(scheduler.job(old).is_none());

        let claimed = scheduler.inner.state.lock().pop_claimable().unwrap();
        assert_eq!(claimed.id, fresh);
        scheduler.complete(fresh, AssetId(5), Outcome::Succeeded);
        let claimed = scheduler.inner.state.lock().pop_claimable().unwrap();
        assert_eq!(claimed.id, join_id);
        scheduler.complete(join_id, AssetId(5), Outcome::Succeeded);

        assert_eq!(scheduler.jobs_for_asset(AssetId(5)).len(), 2);
        let done = scheduler.wait_terminal(join_id).await.unwrap();
        assert_eq!(done.state, JobState::Succeeded);
    }

    #[tokio::test]
    async fn test_purge_of_finished_asset_is_immediate() {
        let scheduler = Scheduler::new(fast_retry());
        let (_, join_id) = enqueue_asset(&scheduler, 6);
        let handles = scheduler.run_workers(2, Arc::new(Recorder::new(&[])));
        scheduler.wait_terminal(join_id).await.unwrap();

        scheduler.purge_asset(AssetId(6));
        assert!(scheduler.jobs_for_asset(AssetId(6)).is_empty());
        scheduler.shutdown();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
