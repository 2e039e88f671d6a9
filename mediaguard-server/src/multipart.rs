//! Multipart form parsing helpers
//!
//! Reads the single `file` field of an upload while enforcing the size limit
//! as chunks arrive, so an oversized body is rejected without buffering it.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use mediaguard_core::{MediaBlob, MediaKind, ValidationError};

use crate::error::ApiError;

/// Represents a file uploaded via multipart form
#[derive(Debug)]
pub struct FileField {
    /// File data with its declared kind
    pub blob: MediaBlob,
    /// Content-Type from the multipart field (if provided, informational only)
    pub content_type: Option<String>,
}

impl FileField {
    /// Read the `file` field of an upload.
    ///
    /// Other fields are ignored. Content-Type is recorded but never trusted;
    /// validation sniffs the bytes.
    pub async fn extract(
        multipart: &mut Multipart,
        kind: MediaKind,
        max_bytes: usize,
    ) -> Result<Self, ApiError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, kind, max_bytes, 0, "Failed to parse multipart"))?
        {
            if field.name() != Some("file") {
                continue;
            }

            let content_type = field.content_type().map(|s| s.to_string());
            let data = read_limited(field, kind, max_bytes).await?;

            return Ok(Self {
                blob: MediaBlob::new(data, kind),
                content_type,
            });
        }

        Err(ApiError::bad_request(
            "No file provided. Use 'file' field in multipart form.",
        ))
    }
}

async fn read_limited(
    mut field: Field<'_>,
    kind: MediaKind,
    max_bytes: usize,
) -> Result<Vec<u8>, ApiError> {
    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, kind, max_bytes, data.len(), "Failed to read file"))?
    {
        if data.len() + chunk.len() > max_bytes {
            return Err(ValidationError::TooLarge {
                kind,
                size: data.len() + chunk.len(),
                max: max_bytes,
            }
            .into());
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// A body that outgrew the request limit mid-stream is an oversized upload,
/// anything else is a malformed form.
fn multipart_error(
    e: MultipartError,
    kind: MediaKind,
    max_bytes: usize,
    received: usize,
    context: &str,
) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ValidationError::TooLarge {
            kind,
            size: received,
            max: max_bytes,
        }
        .into();
    }
    ApiError::bad_request(format!("{}: {}", context, e))
}
