//! Asynchronous video analysis jobs.
//!
//! A submitted video becomes a [`JobId`] immediately; the analysis itself
//! runs on a fixed pool of workers fed by a bounded queue. Callers poll the
//! [`JobOrchestrator`] for a [`JobStatus`] snapshot.
//!
//! ```text
//! Pending ──► Processing ──► Succeeded
//!                   │
//!                   └──────► Failed
//! ```
//!
//! Terminal states never change once reached.

mod orchestrator;
mod store;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MediaGuardError, Result};
use crate::media::ContentHash;
use crate::pipeline::AnalysisResult;

pub use orchestrator::{
    JobOrchestrator, OrchestratorConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS,
};
pub use store::JobStore;

/// Opaque, unguessable job handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = MediaGuardError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| MediaGuardError::InvalidJobId(s.to_string()))
    }
}

/// Lifecycle phase of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Pending,
    Processing,
    Succeeded,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a job.
///
/// `result` is set only when `phase` is `Succeeded`, `error` only when it
/// is `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: JobId,
    pub phase: JobPhase,
    pub content_hash: ContentHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

/// Work item handed to a [`JobHandler`].
pub struct VideoJob {
    pub id: JobId,
    pub hash: ContentHash,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for VideoJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoJob")
            .field("id", &self.id)
            .field("hash", &self.hash)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Runs the analysis behind a job. Registered once with the orchestrator.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn run(&self, job: VideoJob) -> Result<AnalysisResult>;
}
