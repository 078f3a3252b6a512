//! Configuration for the pipeline and the local deployment around it.

use crate::domain::hls::ResolutionPolicy;
use crate::domain::ladder::Ladder;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("failed to read ladder file {path:?}: {source}")]
    LadderFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid ladder: {0}")]
    Ladder(String),
}

/// Longest accepted HLS segment, in seconds.
pub const MAX_SEGMENT_SECONDS: u32 = 60;

/// What the join does when no variant playlist exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyOutputPolicy {
    /// Write nothing and mark the asset failed
    #[default]
    Fail,
    /// Write a master playlist with no variants and mark the asset ready
    WriteEmpty,
}

/// Every tunable of the pipeline, handed to services at construction.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Root of the HLS output tree; one directory per asset below it
    pub output_root: PathBuf,
    pub ladder: Ladder,
    pub segment_seconds: u32,
    /// Number of concurrent worker tasks
    pub worker_count: usize,
    /// Total attempts for a job whose failure is retryable
    pub max_attempts: u32,
    /// Base delay, doubled after each failed attempt
    pub retry_backoff: Duration,
    /// Encoder executable
    pub encoder_program: String,
    pub empty_output: EmptyOutputPolicy,
    pub resolution: ResolutionPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("./media/hls"),
            ladder: Ladder::default(),
            segment_seconds: 4,
            worker_count: 4,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(2000),
            encoder_program: String::from("ffmpeg"),
            empty_output: EmptyOutputPolicy::default(),
            resolution: ResolutionPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ladder = match lookup("LADDER_FILE") {
            Some(path) => {
                let path = PathBuf::from(path);
                let json = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::LadderFile { path, source })?;
                Ladder::from_json(&json).map_err(|e| ConfigError::Ladder(e.to_string()))?
            }
            None => defaults.ladder,
        };

        let empty_output = match lookup("REQUIRE_VARIANT") {
            Some(v) => {
                if parse_value::<bool>("REQUIRE_VARIANT", &v)? {
                    EmptyOutputPolicy::Fail
                } else {
                    EmptyOutputPolicy::WriteEmpty
                }
            }
            None => defaults.empty_output,
        };

        let resolution = match lookup("RESOLUTION_WIDTH") {
            Some(v) => parse_resolution(&v)?,
            None => defaults.resolution,
        };

        let worker_count = parsed_or(&lookup, "WORKERS", defaults.worker_count)?;
        if worker_count == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKERS",
                value: "0".to_string(),
            });
        }

        let segment_seconds = parsed_or(&lookup, "SEGMENT_SECONDS", defaults.segment_seconds)?;
        if !(1..=MAX_SEGMENT_SECONDS).contains(&segment_seconds) {
            return Err(ConfigError::Invalid {
                key: "SEGMENT_SECONDS",
                value: segment_seconds.to_string(),
            });
        }

        Ok(Self {
            output_root: lookup("OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            ladder,
            segment_seconds,
            worker_count,
            max_attempts: parsed_or(&lookup, "MAX_ATTEMPTS", defaults.max_attempts)?.max(1),
            retry_backoff: Duration::from_millis(parsed_or(
                &lookup,
                "RETRY_BACKOFF_MS",
                defaults.retry_backoff.as_millis() as u64,
            )?),
            encoder_program: lookup("FFMPEG_BIN").unwrap_or(defaults.encoder_program),
            empty_output,
            resolution,
        })
    }
}

/// Configuration for local/monolith deployment.
#[cfg(feature = "local")]
#[derive(Clone, Debug)]
pub struct LocalConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Redis connection URL; asset status stays in memory when unset
    pub redis_url: Option<String>,
    pub pipeline: PipelineConfig,
}

#[cfg(feature = "local")]
impl LocalConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let pipeline = PipelineConfig::from_env()?;

        Ok(Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            redis_url: env::var("REDIS_URL").ok(),
            pipeline,
        })
    }
}

fn parsed_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_resolution(value: &str) -> Result<ResolutionPolicy, ConfigError> {
    match value.trim() {
        "omit" => Ok(ResolutionPolicy::Omit),
        "16:9" => Ok(ResolutionPolicy::Aspect16x9),
        other => other
            .parse()
            .map(ResolutionPolicy::FixedWidth)
            .map_err(|_| ConfigError::Invalid {
                key: "RESOLUTION_WIDTH",
                value: value.to_string(),
            }),
    }
}
