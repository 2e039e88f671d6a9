//! Client for a remote single-frame inference service.
//!
//! Frames are PNG-encoded and POSTed to the configured endpoint. The service
//! answers with JSON:
//!
//! ```json
//! { "confidence": 0.8123, "heatmap_png": "<base64, optional>" }
//! ```
//!
//! ## Features
//!
//! - Automatic retry with exponential backoff on transient errors
//! - Optional bearer token, redacted from `Debug` output
//! - Tracing instrumentation with per-call latency

use std::io::Cursor;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{ImageFormat, RgbImage};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{Classification, ClassifierSource, FrameClassifier};
use crate::error::{MediaGuardError, Result};

/// Default timeout for a single inference request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of retry attempts.
const MAX_RETRIES: u32 = 3;

/// Initial retry interval.
const INITIAL_INTERVAL: Duration = Duration::from_millis(200);

/// Maximum retry interval.
const MAX_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    confidence: f64,
    #[serde(default)]
    heatmap_png: Option<String>,
}

/// Configuration for the remote classifier.
#[derive(Clone)]
pub struct HttpClassifierConfig {
    /// Inference endpoint URL
    pub endpoint: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors
    pub max_retries: u32,
}

impl std::fmt::Debug for HttpClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClassifierConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl HttpClassifierConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: MAX_RETRIES,
        }
    }

    /// Read `CLASSIFIER_URL` (required), `CLASSIFIER_API_KEY` and
    /// `CLASSIFIER_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("CLASSIFIER_URL").map_err(|_| {
            MediaGuardError::Oracle("CLASSIFIER_URL environment variable not set".into())
        })?;

        let timeout = std::env::var("CLASSIFIER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self {
            endpoint,
            api_key: std::env::var("CLASSIFIER_API_KEY").ok(),
            timeout,
            max_retries: MAX_RETRIES,
        })
    }
}

/// Remote classifier client.
pub struct HttpClassifier {
    client: Client,
    config: HttpClassifierConfig,
}

impl HttpClassifier {
    #[instrument(level = "debug", skip_all, fields(
        endpoint = %config.endpoint,
        timeout_ms = config.timeout.as_millis() as u64,
        max_retries = config.max_retries
    ))]
    pub fn with_config(config: HttpClassifierConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            warn!(error = %e, "Failed to create HTTP client");
            MediaGuardError::Oracle(format!("Failed to create HTTP client: {e}"))
        })?;

        info!("Remote classifier client created");
        Ok(Self { client, config })
    }

    fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| MediaGuardError::Oracle(format!("Failed to encode frame: {e}")))?;
        Ok(buffer.into_inner())
    }

    fn is_transient_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request()
    }

    fn is_transient_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
                | StatusCode::BAD_GATEWAY
        )
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: INITIAL_INTERVAL,
            max_interval: MAX_INTERVAL,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries),
            ..Default::default()
        }
    }

    /// Decode and range-check the service response.
    fn parse_response(response: InferenceResponse) -> Result<Classification> {
        if !response.confidence.is_finite() || !(0.0..=1.0).contains(&response.confidence) {
            return Err(MediaGuardError::Oracle(format!(
                "confidence out of range: {}",
                response.confidence
            )));
        }

        let explanation = response
            .heatmap_png
            .map(|b64| {
                BASE64
                    .decode(b64)
                    .map_err(|e| MediaGuardError::Oracle(format!("Invalid heatmap base64: {e}")))
            })
            .transpose()?;

        Ok(Classification {
            confidence: response.confidence,
            explanation,
        })
    }

    /// Single inference attempt.
    async fn request_once(
        &self,
        png: &[u8],
        explain: bool,
    ) -> std::result::Result<Classification, backoff::Error<MediaGuardError>> {
        let start = Instant::now();

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .query(&[("explain", explain)])
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(png.to_vec());
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            if Self::is_transient_error(&e) {
                warn!(error = %e, latency_ms, "Transient error, will retry");
                backoff::Error::transient(MediaGuardError::Oracle(format!(
                    "Transient error (will retry): {e}"
                )))
            } else {
                warn!(error = %e, latency_ms, "Permanent error, aborting");
                backoff::Error::permanent(MediaGuardError::Oracle(format!(
                    "Inference request failed: {e}"
                )))
            }
        })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            let err = MediaGuardError::Oracle(format!("Inference service returned status: {status}"));
            return if Self::is_transient_status(status) {
                warn!(status = %status, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                warn!(status = %status, "Permanent HTTP error");
                Err(backoff::Error::permanent(err))
            };
        }

        let body: InferenceResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse JSON response");
            backoff::Error::permanent(MediaGuardError::Oracle(format!(
                "Failed to parse inference response: {e}"
            )))
        })?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Inference completed"
        );
        Self::parse_response(body).map_err(backoff::Error::permanent)
    }

    async fn infer(&self, image: &RgbImage, explain: bool) -> Result<Classification> {
        let start = Instant::now();
        let png = Self::encode_png(image)?;

        let result = retry_notify(
            self.build_backoff(),
            || async { self.request_once(&png, explain).await },
            |err: MediaGuardError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await;

        let total_latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(c) => debug!(total_latency_ms, confidence = c.confidence, "Frame classified"),
            Err(e) => warn!(error = %e, total_latency_ms, "Classification failed after all retries"),
        }
        result
    }
}

#[async_trait]
impl FrameClassifier for HttpClassifier {
    #[instrument(level = "debug", skip_all, fields(source = "remote"))]
    async fn classify(&self, image: &RgbImage) -> Result<f64> {
        self.infer(image, false).await.map(|c| c.confidence)
    }

    #[instrument(level = "info", skip_all, fields(source = "remote"))]
    async fn explain(&self, image: &RgbImage) -> Result<Classification> {
        self.infer(image, true).await
    }

    fn source_id(&self) -> ClassifierSource {
        ClassifierSource::Remote {
            endpoint: self.config.endpoint.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_valid() {
        let body = InferenceResponse {
            confidence: 0.8,
            heatmap_png: Some(BASE64.encode([0x89, b'P', b'N', b'G'])),
        };
        let parsed = HttpClassifier::parse_response(body).unwrap();
        assert_eq!(parsed.confidence, 0.8);
        assert_eq!(parsed.explanation.unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_parse_response_rejects_out_of_range() {
        for confidence in [-0.1, 1.5, f64::NAN] {
            let body = InferenceResponse {
                confidence,
                heatmap_png: None,
            };
            assert!(HttpClassifier::parse_response(body).is_err());
        }
    }

    #[test]
    fn test_parse_response_rejects_bad_base64() {
        let body = InferenceResponse {
            confidence: 0.5,
            heatmap_png: Some("!!not base64!!".into()),
        };
        assert!(HttpClassifier::parse_response(body).is_err());
    }

    #[test]
    fn test_response_json_shape() {
        let body: InferenceResponse = serde_json::from_str(r#"{"confidence": 0.25}"#).unwrap();
        assert_eq!(body.confidence, 0.25);
        assert!(body.heatmap_png.is_none());
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let mut config = HttpClassifierConfig::new("http://localhost:9000/classify");
        config.api_key = Some("super-secret".into());
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_transient_status_codes() {
        assert!(HttpClassifier::is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(HttpClassifier::is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!HttpClassifier::is_transient_status(StatusCode::BAD_REQUEST));
        assert!(!HttpClassifier::is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_source_id_names_endpoint() {
        let classifier =
            HttpClassifier::with_config(HttpClassifierConfig::new("http://models/classify")).unwrap();
        assert_eq!(
            classifier.source_id(),
            ClassifierSource::Remote {
                endpoint: "http://models/classify".into()
            }
        );
    }
}
