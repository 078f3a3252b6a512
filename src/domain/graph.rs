//! Explicit job graph: nodes are jobs, edges point from a dependency to the
//! jobs waiting on it.
//!
//! Every eligibility decision happens inside `insert` or `finish`, which both
//! take `&mut self`. The scheduler holds the graph behind one lock, so the
//! "decrement counter and check" step is atomic and a job is reported
//! eligible exactly once.
//!
//! A dependency counts as resolved when it reaches *any* terminal state. A
//! failed variant does not cancel the join; the join decides what a failure
//! means.

use crate::domain::asset::AssetId;
use crate::domain::error::PipelineError;
use crate::domain::jobs::{Job, JobId, JobState, Lane, TranscodeJob};
use std::collections::HashMap;

#[derive(Debug)]
struct Node {
    job: TranscodeJob,
    unresolved: usize,
    dependents: Vec<JobId>,
}

#[derive(Debug, Default)]
pub struct JobGraph {
    nodes: HashMap<JobId, Node>,
    by_asset: HashMap<AssetId, Vec<JobId>>,
}

/// Outcome reported by whoever ran a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(String),
}

impl JobGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job. Dependencies must already be in the graph, which keeps it
    /// acyclic by construction. Returns whether the job is eligible right away.
    pub fn insert(
        &mut self,
        id: JobId,
        job: Job,
        lane: Lane,
        depends_on: &[JobId],
    ) -> Result<bool, PipelineError> {
        let mut deps: Vec<JobId> = Vec::with_capacity(depends_on.len());
        for dep in depends_on {
            if !self.nodes.contains_key(dep) {
                return Err(PipelineError::UnknownDependency(*dep));
            }
            if !deps.contains(dep) {
                deps.push(*dep);
            }
        }

        let mut unresolved = 0;
        for dep in &deps {
            if let Some(node) = self.nodes.get_mut(dep) {
                if !node.job.state.is_terminal() {
                    node.dependents.push(id);
                    unresolved += 1;
                }
            }
        }

        let asset_id = job.asset_id();
        self.nodes.insert(
            id,
            Node {
                job: TranscodeJob {
                    id,
                    job,
                    lane,
                    depends_on: deps,
                    state: JobState::Pending,
                    attempts: 0,
                    last_error: None,
                },
                unresolved,
                dependents: Vec::new(),
            },
        );
        self.by_asset.entry(asset_id).or_default().push(id);

        Ok(unresolved == 0)
    }

    /// Claims an eligible job for a worker: Pending -> Running, first attempt.
    /// Returns `None` when the job is gone, already claimed, or still waiting.
    pub fn start(&mut self, id: JobId) -> Option<TranscodeJob> {
        let node = self.nodes.get_mut(&id)?;
        if node.unresolved > 0 || !node.job.state.can_transition_to(JobState::Running) {
            return None;
        }
        node.job.state = JobState::Running;
        node.job.attempts = 1;
        Some(node.job.clone())
    }

    /// Records a failed attempt on a running job that is about to be retried.
    pub fn retry(&mut self, id: JobId, error: String) -> Result<u32, PipelineError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(PipelineError::UnknownJob(id))?;
        node.job.attempts += 1;
        node.job.last_error = Some(error);
        Ok(node.job.attempts)
    }

    /// Moves a job to its terminal state and returns the dependents that just
    /// became eligible.
    pub fn finish(&mut self, id: JobId, outcome: Outcome) -> Result<Vec<JobId>, PipelineError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(PipelineError::UnknownJob(id))?;

        let next = match &outcome {
            Outcome::Succeeded => JobState::Succeeded,
            Outcome::Failed(_) => JobState::Failed,
        };
        if !node.job.state.can_transition_to(next) {
            return Ok(Vec::new());
        }
        node.job.state = next;
        if let Outcome::Failed(err) = outcome {
            node.job.last_error = Some(err);
        }

        let dependents = std::mem::take(&mut node.dependents);
        let mut eligible = Vec::new();
        for dep_id in dependents {
            if let Some(dependent) = self.nodes.get_mut(&dep_id) {
                dependent.unresolved = dependent.unresolved.saturating_sub(1);
                if dependent.unresolved == 0 && dependent.job.state == JobState::Pending {
                    eligible.push(dep_id);
                }
            }
        }
        Ok(eligible)
    }

    pub fn get(&self, id: JobId) -> Option<&TranscodeJob> {
        self.nodes.get(&id).map(|n| &n.job)
    }

    pub fn is_eligible(&self, id: JobId) -> bool {
        self.nodes
            .get(&id)
            .map(|n| n.unresolved == 0 && n.job.state == JobState::Pending)
            .unwrap_or(false)
    }

    /// Jobs of one asset in enqueue order.
    pub fn jobs_for_asset(&self, asset_id: AssetId) -> Vec<TranscodeJob> {
        self.by_asset
            .get(&asset_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.nodes.get(id).map(|n| n.job.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_asset_terminal(&self, asset_id: AssetId) -> bool {
        self.by_asset
            .get(&asset_id)
            .map(|ids| {
                ids.iter().all(|id| {
                    self.nodes
                        .get(id)
                        .map(|n| n.job.state.is_terminal())
                        .unwrap_or(true)
                })
            })
            .unwrap_or(true)
    }

    /// Drops the given jobs once all of them are terminal. Returns how many
    /// were removed, or `None` if one is still pending or running. Other jobs
    /// of the same asset are left alone.
    pub fn remove_jobs(&mut self, ids: &[JobId]) -> Option<usize> {
        let settled = ids.iter().all(|id| {
            self.nodes
                .get(id)
                .map(|n| n.job.state.is_terminal())
                .unwrap_or(true)
        });
        if !settled {
            return None;
        }

        let mut removed = 0;
        for id in ids {
            let Some(node) = self.nodes.remove(id) else {
                continue;
            };
            removed += 1;
            let asset_id = node.job.asset_id();
            if let Some(jobs) = self.by_asset.get_mut(&asset_id) {
                jobs.retain(|j| j != id);
                if jobs.is_empty() {
                    self.by_asset.remove(&asset_id);
                }
            }
        }
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jobs::{JoinJob, VariantJob};
    use crate::domain::ladder::Ladder;
    use std::path::PathBuf;

    fn variant_job(asset: u64, idx: usize) -> Job {
        Job::Variant(VariantJob {
            asset_id: AssetId(asset),
            source_path: PathBuf::from("in.mp4"),
            variant: Ladder::default().variants()[idx].clone(),
        })
    }

    fn join_job(asset: u64) -> Job {
        Job::Join(JoinJob {
            asset_id: AssetId(asset),
        })
    }

    fn fan_out(graph: &mut JobGraph, asset: u64) -> (Vec<JobId>, JobId) {
        let variants: Vec<JobId> = (0..4)
            .map(|i| {
                let id = JobId::new();
                assert!(graph
                    .insert(id, variant_job(asset, i), Lane::Default, &[])
                    .unwrap());
                id
            })
            .collect();
        let join = JobId::new();
        assert!(!graph
            .insert(join, join_job(asset), Lane::Default, &variants)
            .unwrap());
        (variants, join)
    }

    #[test]
    fn test_join_waits_for_every_dependency() {
        let mut graph = JobGraph::new();
        let (variants, join) = fan_out(&mut graph, 42);

        for (i, id) in variants.iter().enumerate() {
            assert!(graph.start(*id).is_some());
            assert!(!graph.is_eligible(join));
            let released = graph.finish(*id, Outcome::Succeeded).unwrap();
            if i + 1 < variants.len() {
                assert!(released.is_empty());
                assert!(!graph.is_eligible(join));
            } else {
                assert_eq!(released, vec![join]);
            }
        }
        assert!(graph.is_eligible(join));
    }

    #[test]
    fn test_failed_dependency_still_releases_join() {
        let mut graph = JobGraph::new();
        let (variants, join) = fan_out(&mut graph, 42);

        for id in &variants[..3] {
            graph.start(*id).unwrap();
            graph.finish(*id, Outcome::Succeeded).unwrap();
        }
        graph.start(variants[3]).unwrap();
        let released = graph
            .finish(variants[3], Outcome::Failed("ffmpeg exit 1".into()))
            .unwrap();

        assert_eq!(released, vec![join]);
        assert_eq!(graph.get(variants[3]).unwrap().state, JobState::Failed);
        assert_eq!(
            graph.get(variants[3]).unwrap().last_error.as_deref(),
            Some("ffmpeg exit 1")
        );
    }

    #[test]
    fn test_join_is_released_exactly_once() {
        let mut graph = JobGraph::new();
        let (variants, join) = fan_out(&mut graph, 1);
        let mut released = Vec::new();
        for id in &variants {
            graph.start(*id).unwrap();
            released.extend(graph.finish(*id, Outcome::Succeeded).unwrap());
            // a duplicate completion report must not release anything again
            released.extend(graph.finish(*id, Outcome::Succeeded).unwrap());
        }
        assert_eq!(released, vec![join]);
    }

    #[test]
    fn test_start_refuses_waiting_or_claimed_jobs() {
        let mut graph = JobGraph::new();
        let (variants, join) = fan_out(&mut graph, 1);

        assert!(graph.start(join).is_none());
        let claimed = graph.start(variants[0]).unwrap();
        assert_eq!(claimed.state, JobState::Running);
        assert_eq!(claimed.attempts, 1);
        assert!(graph.start(variants[0]).is_none());
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let mut graph = JobGraph::new();
        let missing = JobId::new();
        let err = graph
            .insert(JobId::new(), join_job(1), Lane::Default, &[missing])
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownDependency(id) if id == missing));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_terminal_dependency_counts_as_resolved_at_insert() {
        let mut graph = JobGraph::new();
        let v = JobId::new();
        graph
            .insert(v, variant_job(3, 0), Lane::Default, &[])
            .unwrap();
        graph.start(v).unwrap();
        graph.finish(v, Outcome::Failed("x".into())).unwrap();

        let join = JobId::new();
        assert!(graph
            .insert(join, join_job(3), Lane::Default, &[v, v])
            .unwrap());
        assert_eq!(graph.get(join).unwrap().depends_on, vec![v]);
    }

    #[test]
    fn test_retry_counts_attempts() {
        let mut graph = JobGraph::new();
        let v = JobId::new();
        graph
            .insert(v, variant_job(3, 0), Lane::Default, &[])
            .unwrap();
        graph.start(v).unwrap();
        assert_eq!(graph.retry(v, "first".into()).unwrap(), 2);
        assert_eq!(graph.retry(v, "second".into()).unwrap(), 3);
        let job = graph.get(v).unwrap();
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.last_error.as_deref(), Some("second"));
    }

    #[test]
    fn test_remove_jobs_only_when_terminal() {
        let mut graph = JobGraph::new();
        let (variants, join) = fan_out(&mut graph, 9);
        let (_, _) = fan_out(&mut graph, 10);
        let mut batch = variants.clone();
        batch.push(join);

        assert_eq!(graph.remove_jobs(&batch), None);
        for id in &variants {
            graph.start(*id).unwrap();
            graph.finish(*id, Outcome::Succeeded).unwrap();
        }
        graph.start(join).unwrap();
        graph.finish(join, Outcome::Succeeded).unwrap();

        assert_eq!(graph.remove_jobs(&batch), Some(5));
        assert!(graph.jobs_for_asset(AssetId(9)).is_empty());
        assert_eq!(graph.jobs_for_asset(AssetId(10)).len(), 5);
        assert_eq!(graph.len(), 5);
        assert!(!graph.is_empty());
    }

    #[test]
    fn test_remove_jobs_keeps_later_jobs_of_same_asset() {
        let mut graph = JobGraph::new();
        let old = JobId::new();
        graph
            .insert(old, variant_job(5, 0), Lane::Default, &[])
            .unwrap();
        graph.start(old).unwrap();
        let (fresh, fresh_join) = fan_out(&mut graph, 5);

        assert_eq!(graph.remove_jobs(&[old]), None);
        graph.finish(old, Outcome::Failed("cancelled".into())).unwrap();
        assert_eq!(graph.remove_jobs(&[old]), Some(1));

        let left: Vec<JobId> = graph
            .jobs_for_asset(AssetId(5))
            .into_iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(left.len(), 5);
        assert!(left.contains(&fresh_join));
        assert!(fresh.iter().all(|id| left.contains(id)));
        assert!(graph.get(old).is_none());
    }
}
