use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::{JobHandler, JobId, JobStatus, JobStore, VideoJob};
use crate::audit::{self, AuditRecorder};
use crate::error::{MediaGuardError, Result};
use crate::validation::ValidatedVideo;

/// Default number of concurrent analysis workers.
pub const DEFAULT_WORKERS: usize = 2;

/// Default number of jobs that may wait for a worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Worker pool sizing and job retention.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    /// How long finished jobs stay pollable; `None` keeps them forever.
    pub retention: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            retention: None,
        }
    }
}

type JobReceiver = Arc<Mutex<mpsc::Receiver<VideoJob>>>;

/// Accepts video jobs and runs them on a bounded worker pool.
///
/// `submit` never blocks on analysis: it records the job as `Pending`,
/// enqueues it, and returns the id. When the queue is full the submission
/// is rejected and nothing is recorded.
pub struct JobOrchestrator {
    store: Arc<JobStore>,
    sender: RwLock<Option<mpsc::Sender<VideoJob>>>,
    capacity: usize,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stop: watch::Sender<bool>,
    audit: AuditRecorder,
}

impl JobOrchestrator {
    /// Spawn the worker pool. Must be called inside a tokio runtime.
    pub fn start(config: OrchestratorConfig, handler: Arc<dyn JobHandler>) -> Arc<Self> {
        let workers = config.workers.max(1);
        let capacity = config.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel::<VideoJob>(capacity);
        let rx: JobReceiver = Arc::new(Mutex::new(rx));
        let store = Arc::new(JobStore::new());
        let audit = AuditRecorder::new();
        let (stop, _) = watch::channel(false);

        let mut handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&rx),
                    Arc::clone(&store),
                    Arc::clone(&handler),
                    audit,
                ))
            })
            .collect();

        if let Some(retention) = config.retention {
            handles.push(tokio::spawn(reaper_loop(
                Arc::clone(&store),
                retention,
                stop.subscribe(),
            )));
        }

        info!(
            workers,
            queue_capacity = capacity,
            retention_secs = config.retention.map(|d| d.as_secs()),
            "Job orchestrator started"
        );

        Arc::new(Self {
            store,
            sender: RwLock::new(Some(tx)),
            capacity,
            workers: Mutex::new(handles),
            stop,
            audit,
        })
    }

    /// Enqueue a validated video and return its job id.
    #[instrument(level = "info", skip_all, fields(hash = %video.hash.short()))]
    pub fn submit(&self, video: ValidatedVideo) -> Result<JobId> {
        let id = JobId::new();
        let hash = video.hash;
        self.store.insert_pending(id, hash)?;

        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            self.store.remove(&id);
            return Err(MediaGuardError::QueueClosed);
        };

        let job = VideoJob {
            id,
            hash,
            bytes: video.bytes,
        };
        match sender.try_send(job) {
            Ok(()) => {
                info!(job_id = %id, "Video job queued");
                self.audit.record(audit::VIDEO_SUBMITTED, hash).emit();
                Ok(id)
            }
            Err(TrySendError::Full(_)) => {
                self.store.remove(&id);
                warn!(capacity = self.capacity, "Job queue full, rejecting submission");
                Err(MediaGuardError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Closed(_)) => {
                self.store.remove(&id);
                Err(MediaGuardError::QueueClosed)
            }
        }
    }

    /// Current state of a job.
    pub fn poll(&self, id: &JobId) -> Result<JobStatus> {
        self.store
            .status(id)
            .ok_or_else(|| MediaGuardError::JobNotFound(id.to_string()))
    }

    /// Wait until a job reaches a terminal state.
    pub async fn wait(&self, id: &JobId, interval: Duration) -> Result<JobStatus> {
        loop {
            let status = self.poll(id)?;
            if status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(interval).await;
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn queue_capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_accepting(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop accepting jobs. Queued and running jobs still complete.
    ///
    /// Returns `false` if the queue was already closed.
    pub fn close(&self) -> bool {
        let sender = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            return false;
        }
        info!("Job queue closed to new submissions");
        true
    }

    /// Stop accepting jobs, let the workers drain the queue, and wait for them.
    pub async fn shutdown(&self) {
        self.close();
        let _ = self.stop.send(true);

        let handles = std::mem::take(&mut *self.workers.lock().await);
        if handles.is_empty() {
            return;
        }
        info!(tasks = handles.len(), "Draining job queue");
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task ended abnormally");
            }
        }
        info!("Job orchestrator stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: JobReceiver,
    store: Arc<JobStore>,
    handler: Arc<dyn JobHandler>,
    audit: AuditRecorder,
) {
    debug!(worker_id, "Worker started");
    loop {
        let next = rx.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        process(worker_id, job, &store, &handler, audit).await;
    }
    debug!(worker_id, "Worker stopped");
}

#[instrument(level = "info", skip_all, fields(worker_id = worker_id, job_id = %job.id))]
async fn process(
    worker_id: usize,
    job: VideoJob,
    store: &JobStore,
    handler: &Arc<dyn JobHandler>,
    audit: AuditRecorder,
) {
    let id = job.id;
    let hash = job.hash;

    if let Err(e) = store.begin(&id) {
        warn!(error = %e, "Skipping job that could not be claimed");
        return;
    }

    // A separate task turns a panic in the analysis into a JoinError.
    let handler = Arc::clone(handler);
    let outcome = match tokio::spawn(async move { handler.run(job).await }).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(e.to_string()),
        Err(join) if join.is_panic() => {
            error!("Analysis panicked");
            Err("analysis worker crashed".to_string())
        }
        Err(_) => Err("analysis was cancelled".to_string()),
    };

    match &outcome {
        Ok(result) => {
            info!(verdict = %result.verdict, confidence = result.confidence, "Job succeeded");
            audit.record(audit::VIDEO_ANALYZED, hash).emit();
        }
        Err(reason) => {
            warn!(reason = %reason, "Job failed");
            audit.record(audit::VIDEO_FAILED, hash).emit();
        }
    }

    if let Err(e) = store.finish(&id, outcome) {
        error!(error = %e, "Could not record job outcome");
    }
}

async fn reaper_loop(store: Arc<JobStore>, retention: Duration, mut stop: watch::Receiver<bool>) {
    let period = (retention / 4).max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Ok(age) = chrono::Duration::from_std(retention) else {
                    continue;
                };
                let evicted = store.evict_finished_before(Utc::now() - age);
                if evicted > 0 {
                    debug!(evicted, "Evicted expired jobs");
                }
            }
            _ = stop.changed() => break,
        }
    }
}
