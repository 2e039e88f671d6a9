//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod analyze;
pub mod health;
pub mod status;

pub use crate::state::AppState;
pub use analyze::{
    analyze_image_handler, analyze_video_handler, ImageAnalysisResponse, VideoSubmissionResponse,
};
pub use health::{health, ready, root, HealthResponse, ReadyResponse, RootResponse};
pub use status::{job_status_handler, JobStatusResponse, VideoResult};
