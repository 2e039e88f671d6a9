use thiserror::Error;

use crate::media::MediaKind;

/// Maximum accepted image payload (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum accepted video payload (50 MiB).
pub const MAX_VIDEO_BYTES: usize = 50 * 1024 * 1024;

/// Rejections raised before any expensive analysis runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} too large: {size} bytes exceeds maximum of {max} bytes")]
    TooLarge {
        kind: MediaKind,
        size: usize,
        max: usize,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupted or unreadable media: {0}")]
    Corrupted(String),
}

#[derive(Error, Debug)]
pub enum MediaGuardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Sampling error: {0}")]
    Sampling(String),

    #[error("Classifier error: {0}")]
    Oracle(String),

    #[error("Cannot aggregate an empty score set")]
    EmptyScores,

    #[error("Video decode error: {0}")]
    Decode(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Malformed job id: {0}")]
    InvalidJobId(String),

    #[error("Job queue is full ({capacity} pending jobs)")]
    QueueFull { capacity: usize },

    #[error("Job queue is closed")]
    QueueClosed,

    #[error("Invalid job transition: {0}")]
    InvalidTransition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, MediaGuardError>;
