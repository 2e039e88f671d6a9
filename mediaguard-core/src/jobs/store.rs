use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::{JobId, JobPhase, JobStatus};
use crate::error::{MediaGuardError, Result};
use crate::media::ContentHash;
use crate::pipeline::AnalysisResult;

#[derive(Debug, Clone)]
enum JobState {
    Pending,
    Processing,
    Succeeded(AnalysisResult),
    Failed(String),
}

#[derive(Debug, Clone)]
struct JobRecord {
    state: JobState,
    content_hash: ContentHash,
    submitted_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    fn phase(&self) -> JobPhase {
        match self.state {
            JobState::Pending => JobPhase::Pending,
            JobState::Processing => JobPhase::Processing,
            JobState::Succeeded(_) => JobPhase::Succeeded,
            JobState::Failed(_) => JobPhase::Failed,
        }
    }
}

/// Concurrent job table.
///
/// Every transition happens under the entry's shard lock, so readers see
/// either the old state or the new one, never a partial update.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: DashMap<JobId, JobRecord>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job in `Pending`.
    pub fn insert_pending(&self, id: JobId, content_hash: ContentHash) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.jobs.entry(id) {
            Entry::Occupied(_) => Err(MediaGuardError::InvalidTransition(format!(
                "job {id} already exists"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(JobRecord {
                    state: JobState::Pending,
                    content_hash,
                    submitted_at: Utc::now(),
                    finished_at: None,
                });
                Ok(())
            }
        }
    }

    /// Forget a job that never made it onto the queue.
    pub fn remove(&self, id: &JobId) -> bool {
        self.jobs.remove(id).is_some()
    }

    /// Claim a pending job. Only one caller can win for a given id.
    pub fn begin(&self, id: &JobId) -> Result<()> {
        let mut record = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| MediaGuardError::JobNotFound(id.to_string()))?;

        match record.state {
            JobState::Pending => {
                record.state = JobState::Processing;
                debug!(job_id = %id, "Job claimed");
                Ok(())
            }
            _ => Err(MediaGuardError::InvalidTransition(format!(
                "job {id} is {} and cannot start",
                record.phase()
            ))),
        }
    }

    /// Move a processing job to its terminal state.
    pub fn finish(&self, id: &JobId, outcome: std::result::Result<AnalysisResult, String>) -> Result<()> {
        let mut record = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| MediaGuardError::JobNotFound(id.to_string()))?;

        if !matches!(record.state, JobState::Processing) {
            return Err(MediaGuardError::InvalidTransition(format!(
                "job {id} is {} and cannot finish",
                record.phase()
            )));
        }

        record.state = match outcome {
            Ok(result) => JobState::Succeeded(result),
            Err(error) => JobState::Failed(error),
        };
        record.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Snapshot of a job, or `None` for unknown ids.
    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.jobs.get(id).map(|record| {
            let (result, error) = match &record.state {
                JobState::Succeeded(result) => (Some(result.clone()), None),
                JobState::Failed(error) => (None, Some(error.clone())),
                JobState::Pending | JobState::Processing => (None, None),
            };
            JobStatus {
                job_id: *id,
                phase: record.phase(),
                content_hash: record.content_hash,
                result,
                error,
                submitted_at: record.submitted_at,
                finished_at: record.finished_at,
            }
        })
    }

    /// Drop terminal jobs that finished before `cutoff`. Returns how many.
    pub fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.jobs.len();
        self.jobs
            .retain(|_, record| !matches!(record.finished_at, Some(at) if at < cutoff));
        before.saturating_sub(self.jobs.len())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of jobs not yet in a terminal state.
    pub fn in_flight(&self) -> usize {
        self.jobs
            .iter()
            .filter(|entry| !entry.phase().is_terminal())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use crate::verdict::Verdict;

    fn hash() -> ContentHash {
        ContentHash::from_bytes(b"clip")
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            media_type: MediaKind::Video,
            verdict: Verdict::Real,
            confidence: 0.1,
            frames_analyzed: 12,
            explanation: None,
        }
    }

    #[test]
    fn test_happy_path() {
        let store = JobStore::new();
        let id = JobId::new();
        store.insert_pending(id, hash()).unwrap();
        assert_eq!(store.status(&id).unwrap().phase, JobPhase::Pending);

        store.begin(&id).unwrap();
        assert_eq!(store.status(&id).unwrap().phase, JobPhase::Processing);

        store.finish(&id, Ok(result())).unwrap();
        let status = store.status(&id).unwrap();
        assert_eq!(status.phase, JobPhase::Succeeded);
        assert_eq!(status.result, Some(result()));
        assert!(status.error.is_none());
        assert!(status.finished_at.is_some());
    }

    #[test]
    fn test_only_one_claim_wins() {
        let store = JobStore::new();
        let id = JobId::new();
        store.insert_pending(id, hash()).unwrap();

        assert!(store.begin(&id).is_ok());
        assert!(matches!(
            store.begin(&id),
            Err(MediaGuardError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let store = JobStore::new();
        let id = JobId::new();
        store.insert_pending(id, hash()).unwrap();
        store.begin(&id).unwrap();
        store.finish(&id, Err("decoder crashed".into())).unwrap();

        assert!(store.finish(&id, Ok(result())).is_err());
        assert!(store.begin(&id).is_err());

        let status = store.status(&id).unwrap();
        assert_eq!(status.phase, JobPhase::Failed);
        assert_eq!(status.error.as_deref(), Some("decoder crashed"));
        assert!(status.result.is_none());
    }

    #[test]
    fn test_cannot_finish_pending_job() {
        let store = JobStore::new();
        let id = JobId::new();
        store.insert_pending(id, hash()).unwrap();
        assert!(store.finish(&id, Ok(result())).is_err());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = JobStore::new();
        let id = JobId::new();
        store.insert_pending(id, hash()).unwrap();
        assert!(store.insert_pending(id, hash()).is_err());
    }

    #[test]
    fn test_unknown_job() {
        let store = JobStore::new();
        let id = JobId::new();
        assert!(store.status(&id).is_none());
        assert!(matches!(store.begin(&id), Err(MediaGuardError::JobNotFound(_))));
    }

    #[test]
    fn test_eviction_only_touches_finished_jobs() {
        let store = JobStore::new();
        let done = JobId::new();
        let waiting = JobId::new();
        store.insert_pending(done, hash()).unwrap();
        store.insert_pending(waiting, hash()).unwrap();
        store.begin(&done).unwrap();
        store.finish(&done, Ok(result())).unwrap();

        let evicted = store.evict_finished_before(Utc::now() + chrono::Duration::seconds(1));
        assert_eq!(evicted, 1);
        assert!(store.status(&done).is_none());
        assert!(store.status(&waiting).is_some());
        assert_eq!(store.in_flight(), 1);
    }
}
