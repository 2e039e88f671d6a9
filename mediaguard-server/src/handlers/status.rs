//! Job status handler
//!
//! Handles GET /media/status/{job_id} polling for video analysis jobs.

use axum::{
    extract::{Path, State},
    Json,
};
use mediaguard_core::{JobId, JobPhase, JobStatus, Verdict};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;

/// Final verdict of a finished video job
#[derive(Serialize, ToSchema)]
pub struct VideoResult {
    #[schema(value_type = String, example = "Suspicious")]
    pub verdict: Verdict,
    #[schema(example = 0.5321)]
    pub confidence: f64,
    #[schema(example = 12)]
    pub frames_analyzed: usize,
}

/// Snapshot of a video analysis job
#[derive(Serialize, ToSchema)]
pub struct JobStatusResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub job_id: String,
    /// pending, processing, succeeded or failed
    #[schema(value_type = String, example = "succeeded")]
    pub status: JobPhase,
    /// SHA3-256 of the submitted video (hex)
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<VideoResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// RFC 3339 submission time
    pub submitted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

impl From<JobStatus> for JobStatusResponse {
    fn from(status: JobStatus) -> Self {
        let message = match status.phase {
            JobPhase::Pending | JobPhase::Processing => Some("Video is still being processed"),
            JobPhase::Succeeded | JobPhase::Failed => None,
        };

        Self {
            job_id: status.job_id.to_string(),
            status: status.phase,
            hash: status.content_hash.to_hex(),
            message,
            result: status.result.map(|r| VideoResult {
                verdict: r.verdict,
                confidence: r.confidence,
                frames_analyzed: r.frames_analyzed,
            }),
            error: status.error,
            submitted_at: status.submitted_at.to_rfc3339(),
            finished_at: status.finished_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Poll a video analysis job
///
/// Returns the current state. A finished job keeps returning the same
/// result on every poll until it expires.
#[utoipa::path(
    get,
    path = "/media/status/{job_id}",
    tag = "Analysis",
    params(
        ("job_id" = String, Path, description = "Job id returned by POST /media/analyze/video")
    ),
    responses(
        (status = 200, description = "Current job state", body = JobStatusResponse),
        (status = 400, description = "Malformed job id"),
        (status = 404, description = "Unknown or expired job")
    )
)]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let id: JobId = job_id.parse()?;
    let status = state.orchestrator.poll(&id)?;
    Ok(Json(status.into()))
}
