//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use mediaguard_core::{MediaGuardError, ValidationError};

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (missing classifier, unknown media kind).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (media rejected, undecodable or unscorable).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Service unavailable (remote classifier, ffmpeg).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Error raised by the CLI itself that carries its own exit code.
#[derive(Debug)]
pub struct Failure {
    pub code: i32,
    pub message: String,
}

impl Failure {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            code: USAGE_ERROR,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            code: UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Context added by the commands wins over the underlying cause
        let code = if message.starts_with("Failed to read") {
            INPUT_ERROR
        } else if message.starts_with("Failed to write") {
            IO_ERROR
        } else {
            err.chain()
                .find_map(classify_cause)
                .unwrap_or(GENERAL_ERROR)
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

fn classify_cause(cause: &(dyn std::error::Error + 'static)) -> Option<i32> {
    if let Some(failure) = cause.downcast_ref::<Failure>() {
        return Some(failure.code);
    }
    if cause.is::<ValidationError>() {
        return Some(DATA_ERROR);
    }
    let err = cause.downcast_ref::<MediaGuardError>()?;
    Some(match err {
        MediaGuardError::Validation(_)
        | MediaGuardError::Decode(_)
        | MediaGuardError::Sampling(_)
        | MediaGuardError::EmptyScores => DATA_ERROR,
        MediaGuardError::Oracle(_) => UNAVAILABLE,
        #[cfg(feature = "network")]
        MediaGuardError::HttpError(_) => UNAVAILABLE,
        MediaGuardError::Io(_) => IO_ERROR,
        _ => GENERAL_ERROR,
    })
}
