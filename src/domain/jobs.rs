use crate::domain::asset::AssetId;
use crate::domain::ladder::VariantSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transcode one rung of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantJob {
    pub asset_id: AssetId,
    pub source_path: PathBuf,
    pub variant: VariantSpec,
}

/// Assemble the master playlist once every variant job is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinJob {
    pub asset_id: AssetId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Job {
    Variant(VariantJob),
    Join(JoinJob),
}

impl Job {
    pub fn asset_id(&self) -> AssetId {
        match self {
            Job::Variant(v) => v.asset_id,
            Job::Join(j) => j.asset_id,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Job::Variant(_) => JobKind::Variant,
            Job::Join(_) => JobKind::Join,
        }
    }

    /// Short label for logs: the variant name or "join".
    pub fn label(&self) -> &str {
        match self {
            Job::Variant(v) => &v.variant.name,
            Job::Join(_) => "join",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    Variant,
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// States only move forward: Pending -> Running -> Succeeded | Failed.
    /// A pending job may also fail directly when it is dropped before dispatch.
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Pending, JobState::Failed)
                | (JobState::Running, JobState::Succeeded)
                | (JobState::Running, JobState::Failed)
        )
    }
}

/// Queue lane. The scheduler drains `High` before `Default` and has no other
/// opinion on what goes where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    High,
    #[default]
    Default,
}

/// Snapshot of a job as held in the scheduler's table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub id: JobId,
    pub job: Job,
    pub lane: Lane,
    pub depends_on: Vec<JobId>,
    pub state: JobState,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl TranscodeJob {
    pub fn asset_id(&self) -> AssetId {
        self.job.asset_id()
    }

    pub fn kind(&self) -> JobKind {
        self.job.kind()
    }
}
