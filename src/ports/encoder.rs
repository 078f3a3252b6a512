use crate::domain::asset::AssetId;
use crate::domain::ladder::VariantSpec;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Everything the encoder needs to turn one source into one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub asset_id: AssetId,
    pub source: PathBuf,
    pub variant: VariantSpec,
    pub playlist: PathBuf,
    pub segment_pattern: PathBuf,
    pub segment_seconds: u32,
}

/// External encode-to-segments program, treated as a black box.
///
/// Implementations must stop (and kill the child process) once `cancel`
/// fires, returning `PipelineError::Cancelled`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(
        &self,
        request: &EncodeRequest,
        cancel: &CancellationToken,
    ) -> Result<(), crate::domain::error::PipelineError>;
}
