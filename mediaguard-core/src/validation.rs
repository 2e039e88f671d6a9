//! Admission checks for submitted media.
//!
//! Every submission passes through [`MediaValidator`] before any decode,
//! classifier call or job is created. Checks run cheapest first:
//!
//! 1. Byte length against the per-kind ceiling (actual length, never the
//!    client's declared size)
//! 2. Content sniffing against the image allow-list (JPEG, PNG)
//! 3. A full decode of the image into RGB
//!
//! Videos are only size-checked here; decodability is discovered by the
//! worker, which fails the job instead of the request.

use image::{ImageFormat, RgbImage};
use tracing::debug;

use crate::error::{ValidationError, MAX_IMAGE_BYTES, MAX_VIDEO_BYTES};
use crate::media::{ContentHash, MediaBlob, MediaKind};

/// Image formats accepted for analysis.
pub const ALLOWED_IMAGE_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];

/// An image that passed every admission check, decoded to RGB.
pub struct ValidatedImage {
    pub hash: ContentHash,
    pub format: ImageFormat,
    pub image: RgbImage,
}

/// A video that passed the size ceiling. The bytes are handed to the job
/// queue and dropped with the job payload.
pub struct ValidatedVideo {
    pub hash: ContentHash,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ValidatedVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedVideo")
            .field("hash", &self.hash.short())
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Result of validating a blob of either kind.
pub enum ValidatedMedia {
    Image(ValidatedImage),
    Video(ValidatedVideo),
}

impl ValidatedMedia {
    pub fn hash(&self) -> ContentHash {
        match self {
            Self::Image(image) => image.hash,
            Self::Video(video) => video.hash,
        }
    }
}

/// Size ceilings and format policy for submissions.
#[derive(Debug, Clone, Copy)]
pub struct MediaValidator {
    max_image_bytes: usize,
    max_video_bytes: usize,
}

impl Default for MediaValidator {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_BYTES,
            max_video_bytes: MAX_VIDEO_BYTES,
        }
    }
}

impl MediaValidator {
    pub fn new(max_image_bytes: usize, max_video_bytes: usize) -> Self {
        Self {
            max_image_bytes,
            max_video_bytes,
        }
    }

    /// Byte ceiling for a media kind.
    pub fn max_bytes(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Image => self.max_image_bytes,
            MediaKind::Video => self.max_video_bytes,
        }
    }

    /// Validate a blob according to its declared kind.
    pub fn validate(&self, blob: MediaBlob) -> Result<ValidatedMedia, ValidationError> {
        match blob.kind() {
            MediaKind::Image => self.validate_image(blob).map(ValidatedMedia::Image),
            MediaKind::Video => self.validate_video(blob).map(ValidatedMedia::Video),
        }
    }

    /// Size check, content sniff and full decode of an image.
    pub fn validate_image(&self, blob: MediaBlob) -> Result<ValidatedImage, ValidationError> {
        self.check_size(MediaKind::Image, blob.len())?;

        let bytes = blob.as_bytes();
        if bytes.is_empty() {
            return Err(ValidationError::Corrupted("empty payload".into()));
        }

        let format = sniff_image_format(bytes)?;
        let hash = ContentHash::from_bytes(bytes);

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| ValidationError::Corrupted(e.to_string()))?
            .to_rgb8();

        debug!(
            hash = %hash.short(),
            format = ?format,
            width = image.width(),
            height = image.height(),
            "Image validated"
        );

        Ok(ValidatedImage {
            hash,
            format,
            image,
        })
    }

    /// Size check of a video. The container is not probed here.
    pub fn validate_video(&self, blob: MediaBlob) -> Result<ValidatedVideo, ValidationError> {
        self.check_size(MediaKind::Video, blob.len())?;

        if blob.is_empty() {
            return Err(ValidationError::Corrupted("empty payload".into()));
        }

        let hash = ContentHash::from_bytes(blob.as_bytes());
        debug!(hash = %hash.short(), bytes = blob.len(), "Video validated");

        Ok(ValidatedVideo {
            hash,
            bytes: blob.into_bytes(),
        })
    }

    fn check_size(&self, kind: MediaKind, size: usize) -> Result<(), ValidationError> {
        let max = self.max_bytes(kind);
        if size > max {
            return Err(ValidationError::TooLarge { kind, size, max });
        }
        Ok(())
    }
}

/// Identify the image format from magic bytes and enforce the allow-list.
pub fn sniff_image_format(bytes: &[u8]) -> Result<ImageFormat, ValidationError> {
    let format = image::guess_format(bytes)
        .map_err(|_| ValidationError::UnsupportedFormat("unrecognized image data".into()))?;

    if ALLOWED_IMAGE_FORMATS.contains(&format) {
        Ok(format)
    } else {
        Err(ValidationError::UnsupportedFormat(format!(
            "{:?} (allowed: JPEG, PNG)",
            format
        )))
    }
}
