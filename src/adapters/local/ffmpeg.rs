use crate::domain::error::PipelineError;
use crate::ports::encoder::{EncodeRequest, Encoder};
use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Frames per second assumed when deriving the keyframe interval.
const GOP_FPS: u32 = 25;
/// Bytes of stderr kept for the error report.
const STDERR_TAIL: usize = 4096;

/// Runs `ffmpeg` once per variant, writing an HLS VOD playlist and its
/// segments.
pub struct FfmpegEncoder {
    program: String,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Argument list for one variant. Depends only on the request.
pub fn encoder_args(request: &EncodeRequest) -> Vec<OsString> {
    let v = &request.variant;
    let gop = request.segment_seconds.saturating_mul(GOP_FPS).to_string();

    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into()];
    args.push(request.source.clone().into_os_string());
    let encode = [
        "-vf".to_string(),
        format!("scale=-2:{}", v.height),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "faster".into(),
        "-profile:v".into(),
        "high".into(),
        "-level".into(),
        "4.0".into(),
        "-crf".into(),
        "23".into(),
        "-g".into(),
        gop.clone(),
        "-keyint_min".into(),
        gop,
        "-sc_threshold".into(),
        "0".into(),
        "-b:v".into(),
        v.video_bitrate.clone(),
        "-maxrate".into(),
        v.max_bitrate.clone(),
        "-bufsize".into(),
        v.buffer_size.clone(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "128k".into(),
        "-ac".into(),
        "2".into(),
        "-ar".into(),
        "48000".into(),
        "-hls_time".into(),
        request.segment_seconds.to_string(),
        "-hls_playlist_type".into(),
        "vod".into(),
        "-hls_segment_filename".into(),
    ];
    args.extend(encode.into_iter().map(OsString::from));
    args.push(request.segment_pattern.clone().into_os_string());
    for flag in ["-movflags", "+faststart", "-threads", "0"] {
        args.push(flag.into());
    }
    args.push(request.playlist.clone().into_os_string());
    args
}

fn tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(
        &self,
        request: &EncodeRequest,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(encoder_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            asset_id = %request.asset_id,
            variant = %request.variant.name,
            program = %self.program,
            "Spawning encoder"
        );
        let child = cmd.spawn().map_err(|e| PipelineError::ExternalProcess {
            program: self.program.clone(),
            code: None,
            stderr: e.to_string(),
        })?;

        // dropping the wait future on cancel drops the child, which kills it
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(
                    asset_id = %request.asset_id,
                    variant = %request.variant.name,
                    "Encoder killed, asset cancelled"
                );
                return Err(PipelineError::Cancelled(request.asset_id));
            }
            output = child.wait_with_output() => output,
        };
        let output = output.map_err(|e| PipelineError::ExternalProcess {
            program: self.program.clone(),
            code: None,
            stderr: e.to_string(),
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(PipelineError::ExternalProcess {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: tail(&output.stderr),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::AssetId;
    use crate::domain::ladder::Ladder;
    use crate::domain::layout::OutputLayout;

    fn request(variant: &str) -> EncodeRequest {
        let layout = OutputLayout::new("/srv/hls");
        let variant = Ladder::default()
            .iter()
            .find(|v| v.name == variant)
            .cloned()
            .unwrap();
        EncodeRequest {
            asset_id: AssetId(42),
            source: "/srv/videos/clip.mp4".into(),
            playlist: layout.variant_playlist(AssetId(42), &variant.name),
            segment_pattern: layout.segment_pattern(AssetId(42), &variant.name),
            variant,
            segment_seconds: 4,
        }
    }

    fn args(request: &EncodeRequest) -> Vec<String> {
        encoder_args(request)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn value_of<'a>(args: &'a [String], flag: &str) -> &'a str {
        let at = args.iter().position(|a| a == flag).unwrap();
        &args[at + 1]
    }

    #[test]
    fn test_args_follow_variant() {
        let args = args(&request("720p"));

        assert_eq!(&args[..3], ["-y", "-i", "/srv/videos/clip.mp4"]);
        assert_eq!(value_of(&args, "-vf"), "scale=-2:720");
        assert_eq!(value_of(&args, "-crf"), "23");
        assert_eq!(value_of(&args, "-g"), "100");
        assert_eq!(value_of(&args, "-keyint_min"), "100");
        assert_eq!(value_of(&args, "-b:v"), "2800k");
        assert_eq!(value_of(&args, "-maxrate"), "2996k");
        assert_eq!(value_of(&args, "-bufsize"), "4200k");
        assert_eq!(value_of(&args, "-hls_time"), "4");
        assert_eq!(value_of(&args, "-hls_playlist_type"), "vod");
        assert_eq!(value_of(&args, "-ac"), "2");
        assert_eq!(
            value_of(&args, "-hls_segment_filename"),
            "/srv/hls/42/720p/seg_%05d.ts"
        );
        assert_eq!(args.last().unwrap(), "/srv/hls/42/720p/index.m3u8");
    }

    #[test]
    fn test_args_are_deterministic() {
        assert_eq!(args(&request("360p")), args(&request("360p")));
        assert_ne!(args(&request("360p")), args(&request("1080p")));
    }

    #[test]
    fn test_gop_tracks_segment_length() {
        let mut req = request("360p");
        req.segment_seconds = 6;
        let six = args(&req);
        assert_eq!(value_of(&six, "-g"), "150");
        assert_eq!(value_of(&six, "-hls_time"), "6");

        req.segment_seconds = u32::MAX;
        assert_eq!(value_of(&args(&req), "-g"), u32::MAX.to_string());
    }

    #[test]
    fn test_stderr_tail_keeps_the_end() {
        let long = vec![b'a'; STDERR_TAIL * 2];
        let mut input = long.clone();
        input.extend_from_slice(b"Conversion failed!\n");
        let kept = tail(&input);
        assert!(kept.ends_with("Conversion failed!"));
        assert_eq!(kept.len(), STDERR_TAIL - 1);
    }

    #[tokio::test]
    async fn test_missing_program_is_an_external_failure() {
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg-for-tests");
        let err = encoder
            .encode(&request("360p"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ExternalProcess { code: None, .. }
        ));
        assert!(err.is_retryable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_carries_code() {
        // `false` ignores its arguments and exits 1
        let encoder = FfmpegEncoder::new("false");
        let err = encoder
            .encode(&request("360p"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ExternalProcess { code: Some(1), .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_asset_wins_over_exit() {
        let encoder = FfmpegEncoder::new("false");
        let token = CancellationToken::new();
        token.cancel();
        let err = encoder.encode(&request("360p"), &token).await.unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled(AssetId(42))));
    }
}
