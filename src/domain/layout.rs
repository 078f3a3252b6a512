//! Output paths for an asset. Every path is a pure function of the asset id and
//! variant name, so the whole tree can be rebuilt (and removed) from the id.
//!
//! ```text
//! <root>/<asset_id>/<variant_name>/index.m3u8
//! <root>/<asset_id>/<variant_name>/seg_00000.ts, seg_00001.ts, ...
//! <root>/<asset_id>/master.m3u8
//! ```

use crate::domain::asset::AssetId;
use std::path::{Path, PathBuf};

pub const MASTER_PLAYLIST: &str = "master.m3u8";
pub const VARIANT_PLAYLIST: &str = "index.m3u8";
/// printf-style pattern handed to the encoder for segment names
pub const SEGMENT_PATTERN: &str = "seg_%05d.ts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn asset_dir(&self, asset_id: AssetId) -> PathBuf {
        self.root.join(asset_id.to_string())
    }

    pub fn master_playlist(&self, asset_id: AssetId) -> PathBuf {
        self.asset_dir(asset_id).join(MASTER_PLAYLIST)
    }

    pub fn variant_dir(&self, asset_id: AssetId, variant: &str) -> PathBuf {
        self.asset_dir(asset_id).join(variant)
    }

    pub fn variant_playlist(&self, asset_id: AssetId, variant: &str) -> PathBuf {
        self.variant_dir(asset_id, variant).join(VARIANT_PLAYLIST)
    }

    pub fn segment_pattern(&self, asset_id: AssetId, variant: &str) -> PathBuf {
        self.variant_dir(asset_id, variant).join(SEGMENT_PATTERN)
    }

    /// Path of the n-th segment, matching what the encoder writes for
    /// `SEGMENT_PATTERN`.
    pub fn segment(&self, asset_id: AssetId, variant: &str, index: usize) -> PathBuf {
        self.variant_dir(asset_id, variant)
            .join(segment_file_name(index))
    }
}

pub fn segment_file_name(index: usize) -> String {
    format!("seg_{:05}.ts", index)
}

/// Playlist path relative to the asset root, as written in the master playlist.
pub fn variant_playlist_rel(variant: &str) -> String {
    format!("{}/{}", variant, VARIANT_PLAYLIST)
}
