//! Coverage-based frame sampling for video analysis.
//!
//! Instead of sampling at a fixed rate, the sampler picks a bounded number
//! of frames spread evenly over the whole clip, so a three-second clip and a
//! ten-minute clip are represented by the same number of frames and both
//! always include their first and last frame.
//!
//! # Components
//!
//! - [`frame_indices`]: pure index selection
//! - [`VideoSource`]: random-access frame reader seam
//! - [`FrameSamples`]: lazy iterator that reads the selected frames
//! - [`ffmpeg`]: production reader backed by the system `ffmpeg` binaries
//! - [`scratch`]: owned temporary file the decoder reads from

pub mod ffmpeg;
pub mod scratch;

use std::path::Path;

use image::RgbImage;
use tracing::{debug, warn};

use crate::error::Result;

pub use ffmpeg::{FfmpegBackend, FfmpegConfig, FfmpegVideo};
pub use scratch::ScratchFile;

/// Default upper bound on frames sampled per video.
pub const DEFAULT_MAX_FRAMES: usize = 12;

/// One decoded frame and its position in the source video.
pub struct FrameSample {
    pub index: u64,
    pub image: RgbImage,
}

impl std::fmt::Debug for FrameSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSample")
            .field("index", &self.index)
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

/// Random-access reader over a decoded video.
pub trait VideoSource: Send {
    /// Total number of frames, or `None` when the container does not say.
    fn frame_count(&mut self) -> Option<u64>;

    /// Decode the frame at `index`.
    fn read_frame(&mut self, index: u64) -> Result<RgbImage>;
}

impl<S: VideoSource + ?Sized> VideoSource for Box<S> {
    fn frame_count(&mut self) -> Option<u64> {
        (**self).frame_count()
    }

    fn read_frame(&mut self, index: u64) -> Result<RgbImage> {
        (**self).read_frame(index)
    }
}

/// Opens a [`VideoSource`] over a file on disk.
pub trait VideoBackend: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>>;
}

/// Evenly spaced frame indices over `[0, total - 1]`.
///
/// Returns `min(max_frames, total)` distinct indices in increasing order,
/// each rounded to the nearest frame. The first index is always `0` and the
/// last is always `total - 1`.
pub fn frame_indices(total: u64, max_frames: usize) -> Vec<u64> {
    if total == 0 || max_frames == 0 {
        return Vec::new();
    }

    let count = (max_frames as u64).min(total);
    if count == 1 {
        return vec![0];
    }

    let last = total - 1;
    let steps = count - 1;
    // round(i * last / steps) in integer arithmetic
    (0..count)
        .map(|i| (2 * i * last + steps) / (2 * steps))
        .collect()
}

/// Lazily read the frames selected by [`frame_indices`] from `source`.
///
/// An unknown or zero frame count yields an empty iterator; callers treat
/// that as a sampling failure. Frames that fail to decode are skipped.
pub fn sample<S: VideoSource>(mut source: S, max_frames: usize) -> FrameSamples<S> {
    let indices = match source.frame_count() {
        Some(total) if total > 0 => frame_indices(total, max_frames),
        other => {
            warn!(frame_count = ?other, "Video reports no frames");
            Vec::new()
        }
    };

    debug!(selected = indices.len(), "Selected frame indices");

    FrameSamples {
        source,
        indices: indices.into_iter(),
    }
}

/// Finite, single-pass iterator over sampled frames in increasing index order.
pub struct FrameSamples<S> {
    source: S,
    indices: std::vec::IntoIter<u64>,
}

impl<S> FrameSamples<S> {
    /// Indices not yet read.
    pub fn remaining(&self) -> usize {
        self.indices.len()
    }
}

impl<S: VideoSource> Iterator for FrameSamples<S> {
    type Item = FrameSample;

    fn next(&mut self) -> Option<FrameSample> {
        for index in self.indices.by_ref() {
            match self.source.read_frame(index) {
                Ok(image) => return Some(FrameSample { index, image }),
                Err(e) => {
                    warn!(frame_index = index, error = %e, "Skipping unreadable frame");
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.indices.len()))
    }
}
