//! Frame access through the system `ffprobe` / `ffmpeg` binaries.
//!
//! Nothing is linked against libav; every call spawns the tool on the
//! scratch file and reads its stdout. Calls block, so readers are driven
//! from a blocking task.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::{ImageFormat, RgbImage};
use tracing::{debug, instrument, warn};

use super::{VideoBackend, VideoSource};
use crate::error::{MediaGuardError, Result};

/// Locations of the ffmpeg tools.
#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ffmpeg")),
            ffprobe_path: std::env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ffprobe")),
        }
    }
}

/// [`VideoBackend`] that opens files with ffmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    config: FfmpegConfig,
}

impl FfmpegBackend {
    pub fn new(config: FfmpegConfig) -> Self {
        Self { config }
    }

    /// Whether `ffprobe` can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl VideoBackend for FfmpegBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        if !path.exists() {
            return Err(MediaGuardError::Decode(format!(
                "video file missing: {}",
                path.display()
            )));
        }
        Ok(Box::new(FfmpegVideo {
            path: path.to_path_buf(),
            config: self.config.clone(),
        }))
    }
}

/// A video file read one frame at a time.
pub struct FfmpegVideo {
    path: PathBuf,
    config: FfmpegConfig,
}

impl FfmpegVideo {
    fn run(&self, program: &Path, args: &[String]) -> Result<Vec<u8>> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                MediaGuardError::Decode(format!("failed to run {}: {e}", program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaGuardError::Decode(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

impl VideoSource for FfmpegVideo {
    #[instrument(level = "debug", skip(self))]
    fn frame_count(&mut self) -> Option<u64> {
        let args = vec![
            "-v".into(),
            "error".into(),
            "-select_streams".into(),
            "v:0".into(),
            "-count_packets".into(),
            "-show_entries".into(),
            "stream=nb_read_packets".into(),
            "-of".into(),
            "csv=p=0".into(),
            self.path.to_string_lossy().into_owned(),
        ];

        match self.run(&self.config.ffprobe_path, &args) {
            Ok(stdout) => {
                let count = parse_frame_count(&String::from_utf8_lossy(&stdout));
                debug!(frame_count = ?count, "Probed video");
                count
            }
            Err(e) => {
                warn!(error = %e, "Frame count unavailable");
                None
            }
        }
    }

    fn read_frame(&mut self, index: u64) -> Result<RgbImage> {
        let args = vec![
            "-v".into(),
            "error".into(),
            "-i".into(),
            self.path.to_string_lossy().into_owned(),
            "-vf".into(),
            format!("select=eq(n\\,{index})"),
            "-vsync".into(),
            "0".into(),
            "-frames:v".into(),
            "1".into(),
            "-f".into(),
            "image2pipe".into(),
            "-vcodec".into(),
            "png".into(),
            "pipe:1".into(),
        ];

        let png = self.run(&self.config.ffmpeg_path, &args)?;
        if png.is_empty() {
            return Err(MediaGuardError::Decode(format!(
                "no frame produced at index {index}"
            )));
        }

        image::load_from_memory_with_format(&png, ImageFormat::Png)
            .map(|img| img.to_rgb8())
            .map_err(|e| MediaGuardError::Decode(format!("frame {index} is not a PNG: {e}")))
    }
}

/// Parse ffprobe's `nb_read_packets` output.
fn parse_frame_count(output: &str) -> Option<u64> {
    output
        .lines()
        .map(|line| line.trim().trim_end_matches(','))
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<u64>().ok())
        .filter(|count| *count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_count() {
        assert_eq!(parse_frame_count("240\n"), Some(240));
        assert_eq!(parse_frame_count("  17,\n"), Some(17));
        assert_eq!(parse_frame_count("\n\n90\n"), Some(90));
    }

    #[test]
    fn test_parse_frame_count_unavailable() {
        assert_eq!(parse_frame_count(""), None);
        assert_eq!(parse_frame_count("N/A"), None);
        assert_eq!(parse_frame_count("0"), None);
    }

    #[test]
    fn test_open_missing_file() {
        let backend = FfmpegBackend::default();
        assert!(backend.open(Path::new("/nonexistent/clip.mp4")).is_err());
    }

    #[test]
    fn test_default_config_names_tools() {
        let config = FfmpegConfig::default();
        assert!(!config.ffmpeg_path.as_os_str().is_empty());
        assert!(!config.ffprobe_path.as_os_str().is_empty());
    }
}
