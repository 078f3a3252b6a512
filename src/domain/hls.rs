use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Width attribute policy for `RESOLUTION`. Only heights are known per
/// variant, so the width has to come from somewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPolicy {
    /// width = height * 16 / 9, rounded up to an even number
    #[default]
    Aspect16x9,
    /// Same width for every variant
    FixedWidth(u32),
    /// Leave RESOLUTION out entirely
    Omit,
}

impl ResolutionPolicy {
    pub fn width_for(&self, height: u32) -> Option<u32> {
        match self {
            ResolutionPolicy::Aspect16x9 => {
                let w = (height as u64 * 16).div_ceil(9) as u32;
                Some(w + w % 2)
            }
            ResolutionPolicy::FixedWidth(w) => Some(*w),
            ResolutionPolicy::Omit => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInf {
    pub name: String,
    pub height: u32,
    pub bandwidth: u64,
    /// Path of the variant playlist relative to the master playlist
    pub uri: String,
}

/// Master playlist: the file a player discovers first.
///
/// Variants are listed by ascending height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterPlaylist {
    pub version: u8,
    pub variants: Vec<StreamInf>,
    pub resolution: ResolutionPolicy,
}

pub type MasterManifest = MasterPlaylist;

impl MasterPlaylist {
    pub fn new(resolution: ResolutionPolicy) -> Self {
        Self {
            version: 3,
            variants: Vec::new(),
            resolution,
        }
    }

    /// Keeps the variant list sorted by ascending height regardless of the
    /// order variants are added in.
    pub fn add_variant(&mut self, variant: StreamInf) {
        let at = self
            .variants
            .partition_point(|v| v.height <= variant.height);
        self.variants.insert(at, variant);
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("#EXTM3U\n");
        out.push_str(&format!("#EXT-X-VERSION:{}\n", self.version));

        for v in &self.variants {
            out.push_str(&format!("#EXT-X-STREAM-INF:BANDWIDTH={}", v.bandwidth));
            if let Some(width) = self.resolution.width_for(v.height) {
                out.push_str(&format!(",RESOLUTION={}x{}", width, v.height));
            }
            out.push('\n');
            out.push_str(&v.uri);
            out.push('\n');
        }
        out
    }

    /// Rewrites the file in full; running it twice leaves the same bytes.
    pub async fn write_to(&self, path: &Path) -> Result<(), std::io::Error> {
        let mut file = File::create(path).await?;
        file.write_all(self.render().as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
