//! The bitrate ladder: one `VariantSpec` per rendition offered for every asset.

use serde::{Deserialize, Serialize};

/// A single rung of the ladder. Bitrates are kept in the encoder's own
/// notation ("800k") since they are handed over verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    /// Directory name under the asset root, e.g. "360p"
    pub name: String,
    /// Target output height in pixels
    pub height: u32,
    pub video_bitrate: String,
    pub max_bitrate: String,
    pub buffer_size: String,
    /// Advertised BANDWIDTH in the master playlist (bits/sec)
    pub bandwidth: u64,
}

impl VariantSpec {
    pub fn new(
        name: &str,
        height: u32,
        video_bitrate: &str,
        max_bitrate: &str,
        buffer_size: &str,
        bandwidth: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            height,
            video_bitrate: video_bitrate.to_string(),
            max_bitrate: max_bitrate.to_string(),
            buffer_size: buffer_size.to_string(),
            bandwidth,
        }
    }
}

/// Ordered, immutable set of variants shared by all assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ladder(Vec<VariantSpec>);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LadderError {
    #[error("ladder has no variants")]
    Empty,
    #[error("duplicate variant name {0:?}")]
    DuplicateName(String),
    #[error("duplicate variant height {0}")]
    DuplicateHeight(u32),
    #[error("invalid variant name {0:?}")]
    InvalidName(String),
}

impl Ladder {
    /// Names become directory names and heights order the master playlist,
    /// so both must be unique.
    pub fn new(variants: Vec<VariantSpec>) -> Result<Self, LadderError> {
        if variants.is_empty() {
            return Err(LadderError::Empty);
        }
        for (i, v) in variants.iter().enumerate() {
            let bad_name = v.name.is_empty()
                || v.name == "."
                || v.name == ".."
                || v.name.contains(['/', '\\']);
            if bad_name {
                return Err(LadderError::InvalidName(v.name.clone()));
            }
            for other in &variants[..i] {
                if other.name == v.name {
                    return Err(LadderError::DuplicateName(v.name.clone()));
                }
                if other.height == v.height {
                    return Err(LadderError::DuplicateHeight(v.height));
                }
            }
        }
        Ok(Self(variants))
    }

    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let variants: Vec<VariantSpec> = serde_json::from_str(json)?;
        Ok(Self::new(variants)?)
    }

    pub fn variants(&self) -> &[VariantSpec] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariantSpec> {
        self.0.iter()
    }
}

impl Default for Ladder {
    fn default() -> Self {
        Self(vec![
            VariantSpec::new("360p", 360, "800k", "856k", "1200k", 900_000),
            VariantSpec::new("480p", 480, "1400k", "1498k", "2100k", 1_600_000),
            VariantSpec::new("720p", 720, "2800k", "2996k", "4200k", 3_200_000),
            VariantSpec::new("1080p", 1080, "5000k", "5350k", "7500k", 5_800_000),
        ])
    }
}

impl<'a> IntoIterator for &'a Ladder {
    type Item = &'a VariantSpec;
    type IntoIter = std::slice::Iter<'a, VariantSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
