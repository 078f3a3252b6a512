//! Asset lifecycle events published by the HTTP surface (or any other
//! producer) and consumed by the pipeline.

use crate::domain::asset::VideoAsset;
use serde::{Deserialize, Serialize};

pub mod hub;
pub mod listener;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "asset", rename_all = "snake_case")]
pub enum AssetEvent {
    /// Emitted once the asset row is committed.
    Created(VideoAsset),
    /// Emitted after the asset row is removed.
    Deleted(VideoAsset),
}

impl AssetEvent {
    pub fn asset(&self) -> &VideoAsset {
        match self {
            AssetEvent::Created(asset) | AssetEvent::Deleted(asset) => asset,
        }
    }
}
