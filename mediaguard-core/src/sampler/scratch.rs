//! Exclusively-owned temporary file for video decoding.
//!
//! The decoder tools need a path, so video bytes are written once to a
//! private temp file. The file is removed when the [`ScratchFile`] drops,
//! which covers success, error returns, and unwinding.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Write `bytes` to a fresh temp file readable only by this process' user.
    pub fn write(bytes: &[u8], suffix: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("mediaguard-")
            .suffix(suffix)
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!(path = %file.path().display(), bytes = bytes.len(), "Scratch file created");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        debug!(path = %self.file.path().display(), "Removing scratch file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_removed_on_drop() {
        let scratch = ScratchFile::write(b"not really a video", ".mp4").unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"not really a video");
        assert!(path.to_string_lossy().ends_with(".mp4"));

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_removed_on_unwind() {
        let captured = std::sync::Mutex::new(None);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let scratch = ScratchFile::write(b"abc", ".mp4").unwrap();
            *captured.lock().unwrap() = Some(scratch.path().to_path_buf());
            panic!("decoder crashed");
        }));

        assert!(result.is_err());
        let path = captured.into_inner().unwrap().unwrap();
        assert!(!path.exists());
    }
}
