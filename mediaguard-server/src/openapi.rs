//! OpenAPI documentation configuration
//!
//! Generates OpenAPI 3.0 specification for the MediaGuard API.

use utoipa::OpenApi;

use crate::handlers::{
    HealthResponse, ImageAnalysisResponse, JobStatusResponse, ReadyResponse, RootResponse,
    VideoResult, VideoSubmissionResponse,
};

/// MediaGuard API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MediaGuard API",
        version = "0.1.0",
        description = r#"
## Privacy-Preserving Media Manipulation Analysis

MediaGuard estimates whether an image or video has been manipulated.

- **Images** are validated, classified and discarded within the request
- **Videos** are queued; a bounded set of evenly spaced frames is scored
  and the 75th percentile of the frame scores decides the verdict
- **Explainability**: image results carry a heatmap overlay
- **Privacy**: media is never stored; audit records keep only a SHA3-256 hash

### Verdicts

| Media | Likely Fake | Suspicious | Real |
|-------|-------------|------------|------|
| Image | > 0.75      | > 0.45     | otherwise |
| Video | > 0.60      | > 0.40     | otherwise |
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Analysis", description = "Submit media for manipulation analysis and poll video jobs"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::root,
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::analyze::analyze_image_handler,
        crate::handlers::analyze::analyze_video_handler,
        crate::handlers::status::job_status_handler,
    ),
    components(
        schemas(
            RootResponse,
            HealthResponse,
            ReadyResponse,
            ImageAnalysisResponse,
            VideoSubmissionResponse,
            JobStatusResponse,
            VideoResult,
        )
    )
)]
pub struct ApiDoc;
