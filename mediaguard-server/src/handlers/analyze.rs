//! Media analysis handlers
//!
//! Handles POST /media/analyze/image (synchronous) and
//! POST /media/analyze/video (queued, answered with a job id).

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use mediaguard_core::{analyze_image, audit, MediaKind, Verdict};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::multipart::FileField;
use crate::state::AppState;

pub const IMAGE_PRIVACY_NOTICE: &str = "Image processed in-memory and immediately discarded.";
pub const VIDEO_PRIVACY_NOTICE: &str =
    "Video held only in a temporary file for the duration of the analysis.";
const EXPLANATION_TEXT: &str = "Highlighted regions indicate forensic inconsistencies";

/// Response for a completed image analysis
#[derive(Serialize, ToSchema)]
pub struct ImageAnalysisResponse {
    #[schema(example = "image")]
    pub media_type: &'static str,
    /// SHA3-256 of the uploaded bytes (hex)
    #[schema(example = "9f2c4b...")]
    pub hash: String,
    #[schema(value_type = String, example = "LikelyFake")]
    pub verdict: Verdict,
    /// Manipulation confidence in [0, 1], four decimals
    #[schema(example = 0.8123)]
    pub confidence: f64,
    #[schema(example = 1)]
    pub frames_analyzed: usize,
    pub explanation: &'static str,
    /// Base64 PNG overlay highlighting the regions behind the score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatmap_base64: Option<String>,
    pub privacy: &'static str,
}

/// Response for an accepted video submission
#[derive(Serialize, ToSchema)]
pub struct VideoSubmissionResponse {
    #[schema(example = "video")]
    pub media_type: &'static str,
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub job_id: String,
    /// SHA3-256 of the uploaded bytes (hex)
    pub hash: String,
    #[schema(example = "processing")]
    pub status: &'static str,
    pub message: &'static str,
    pub privacy: &'static str,
}

/// Analyze a still image for manipulation
///
/// Accepts multipart/form-data with:
/// - **file** (required): JPEG or PNG image (max 10MB)
///
/// The image is validated, classified, and discarded before the response is
/// sent. Only its content hash is recorded.
#[utoipa::path(
    post,
    path = "/media/analyze/image",
    tag = "Analysis",
    request_body(
        content_type = "multipart/form-data",
        description = "Image file in the `file` field"
    ),
    responses(
        (status = 200, description = "Image analyzed", body = ImageAnalysisResponse),
        (status = 400, description = "Missing file, unsupported format, or corrupted image"),
        (status = 413, description = "Image too large (max 10MB)"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 503, description = "Classifier unavailable")
    )
)]
pub async fn analyze_image_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageAnalysisResponse>, ApiError> {
    let max = state.validator.max_bytes(MediaKind::Image);
    let upload = FileField::extract(&mut multipart, MediaKind::Image, max).await?;
    tracing::debug!(
        bytes = upload.blob.len(),
        content_type = ?upload.content_type,
        "Image upload received"
    );

    // Decoding is CPU-bound
    let validator = state.validator;
    let image = tokio::task::spawn_blocking(move || validator.validate_image(upload.blob))
        .await
        .map_err(|e| ApiError::internal(format!("Validation task failed: {}", e)))??;
    let hash = image.hash;

    let result = analyze_image(&state.scorer, image).await?;
    state.audit.record(audit::IMAGE_ANALYZED, hash).emit();

    Ok(Json(ImageAnalysisResponse {
        media_type: "image",
        hash: hash.to_hex(),
        verdict: result.verdict,
        confidence: result.confidence,
        frames_analyzed: result.frames_analyzed,
        explanation: EXPLANATION_TEXT,
        heatmap_base64: result.explanation.as_deref().map(|png| BASE64.encode(png)),
        privacy: IMAGE_PRIVACY_NOTICE,
    }))
}

/// Submit a video for asynchronous analysis
///
/// Accepts multipart/form-data with:
/// - **file** (required): video file (max 50MB)
///
/// Returns immediately with a job id; poll `GET /media/status/{job_id}`.
#[utoipa::path(
    post,
    path = "/media/analyze/video",
    tag = "Analysis",
    request_body(
        content_type = "multipart/form-data",
        description = "Video file in the `file` field"
    ),
    responses(
        (status = 202, description = "Video accepted for analysis", body = VideoSubmissionResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 413, description = "Video too large (max 50MB)"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 503, description = "Analysis queue is full")
    )
)]
pub async fn analyze_video_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoSubmissionResponse>), ApiError> {
    let max = state.validator.max_bytes(MediaKind::Video);
    let upload = FileField::extract(&mut multipart, MediaKind::Video, max).await?;

    let video = state.validator.validate_video(upload.blob)?;
    let hash = video.hash;
    let job_id = state.orchestrator.submit(video)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(VideoSubmissionResponse {
            media_type: "video",
            job_id: job_id.to_string(),
            hash: hash.to_hex(),
            status: "processing",
            message: "Video analysis started asynchronously",
            privacy: VIDEO_PRIVACY_NOTICE,
        }),
    ))
}
