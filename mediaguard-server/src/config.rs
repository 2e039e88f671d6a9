//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::time::Duration;

use mediaguard_core::{
    ClassifierConfig, FfmpegConfig, HttpClassifierConfig, MediaGuardError, OrchestratorConfig,
    DEFAULT_MAX_FRAMES,
};

/// Seed for the mock classifier when no remote endpoint is configured.
const MOCK_CLASSIFIER_SEED: u64 = 0x4D45_4449_4147_5244;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 60, above the largest accepted upload)
    pub body_limit_mb: usize,
    /// Request timeout in seconds (default: 60)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Image analysis requests per minute per client (default: 5)
    pub image_rate_limit_per_min: u32,
    /// Video submissions per minute per client (default: 2)
    pub video_rate_limit_per_min: u32,
    /// Concurrent video analysis workers (default: 2)
    pub worker_count: usize,
    /// Videos allowed to wait for a worker (default: 64)
    pub queue_capacity: usize,
    /// Seconds finished jobs stay pollable; unset keeps them (default: 3600)
    pub job_retention_secs: Option<u64>,
    /// Frames sampled per video (default: 12)
    pub max_frames: usize,
    /// Remote classifier endpoint
    pub classifier_url: Option<String>,
    /// Bearer token for the remote classifier
    pub classifier_api_key: Option<String>,
    /// Remote classifier timeout in seconds (default: 30)
    pub classifier_timeout_secs: u64,
    /// Allow the mock classifier when no endpoint is set (default: false, enable with ALLOW_MOCK_CLASSIFIER=true)
    pub allow_mock_classifier: bool,
    /// ffmpeg/ffprobe locations
    pub ffmpeg: FfmpegConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 60,
            timeout_secs: 60,
            rate_limit_enabled: false, // Disabled by default (for tests)
            image_rate_limit_per_min: 5,
            video_rate_limit_per_min: 2,
            worker_count: 2,
            queue_capacity: 64,
            job_retention_secs: Some(3600),
            max_frames: DEFAULT_MAX_FRAMES,
            classifier_url: None,
            classifier_api_key: None,
            classifier_timeout_secs: 30,
            allow_mock_classifier: true, // Enabled by default for tests; from_env() defaults to false
            ffmpeg: FfmpegConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        // JOB_RETENTION_SECS=0 keeps finished jobs forever
        let job_retention_secs = match env_parse::<u64>("JOB_RETENTION_SECS") {
            Some(0) => None,
            Some(secs) => Some(secs),
            None => defaults.job_retention_secs,
        };

        let allow_mock_classifier = std::env::var("ALLOW_MOCK_CLASSIFIER")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            host,
            allowed_origins,
            body_limit_mb: env_parse("BODY_LIMIT_MB").unwrap_or(defaults.body_limit_mb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            rate_limit_enabled,
            image_rate_limit_per_min: env_parse("IMAGE_RATE_LIMIT_PER_MIN")
                .unwrap_or(defaults.image_rate_limit_per_min),
            video_rate_limit_per_min: env_parse("VIDEO_RATE_LIMIT_PER_MIN")
                .unwrap_or(defaults.video_rate_limit_per_min),
            worker_count: env_parse("WORKER_COUNT").unwrap_or(defaults.worker_count),
            queue_capacity: env_parse("QUEUE_CAPACITY").unwrap_or(defaults.queue_capacity),
            job_retention_secs,
            max_frames: env_parse("MAX_FRAMES").unwrap_or(defaults.max_frames),
            classifier_url: std::env::var("CLASSIFIER_URL").ok().filter(|s| !s.is_empty()),
            classifier_api_key: std::env::var("CLASSIFIER_API_KEY").ok(),
            classifier_timeout_secs: env_parse("CLASSIFIER_TIMEOUT_SECS")
                .unwrap_or(defaults.classifier_timeout_secs),
            allow_mock_classifier,
            ffmpeg: FfmpegConfig::default(),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Which classifier to build.
    ///
    /// A configured endpoint always wins. Without one the mock is used only
    /// when explicitly allowed, so a misconfigured production deployment
    /// fails at startup instead of serving fake verdicts.
    pub fn classifier_config(&self) -> Result<ClassifierConfig, MediaGuardError> {
        match &self.classifier_url {
            Some(url) => {
                let mut http = HttpClassifierConfig::new(url.clone());
                http.api_key = self.classifier_api_key.clone();
                http.timeout = Duration::from_secs(self.classifier_timeout_secs);
                Ok(ClassifierConfig::Remote(http))
            }
            None if self.allow_mock_classifier => Ok(ClassifierConfig::Mock {
                seed: MOCK_CLASSIFIER_SEED,
            }),
            None => Err(MediaGuardError::Oracle(
                "CLASSIFIER_URL is not set and ALLOW_MOCK_CLASSIFIER is not enabled".into(),
            )),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            workers: self.worker_count,
            queue_capacity: self.queue_capacity,
            retention: self.job_retention_secs.map(Duration::from_secs),
        }
    }
}
