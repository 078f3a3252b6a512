use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one uploaded video, as far as the pipeline is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Known to exist, no pipeline run recorded yet
    #[default]
    Unprocessed,
    Processing,
    Ready,
    Failed,
    Deleted,
}

/// Payload of the asset-creation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAsset {
    pub id: AssetId,
    pub source_path: PathBuf,
    #[serde(default)]
    pub thumbnail_path: Option<PathBuf>,
}

impl VideoAsset {
    pub fn new(id: u64, source_path: impl Into<PathBuf>) -> Self {
        Self {
            id: AssetId(id),
            source_path: source_path.into(),
            thumbnail_path: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<PathBuf>) -> Self {
        self.thumbnail_path = Some(thumbnail.into());
        self
    }
}
