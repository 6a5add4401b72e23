//! # Workflow Job Store
//!
//! In-memory registry of workflow jobs keyed by job id. The store owns every
//! state transition: the pipeline only reports what happened and the store
//! decides how the record changes. Records expire once `updated_at` falls
//! outside the retention window; expiry is checked opportunistically on store
//! access, never by a background timer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::job::{Job, LogEntry};
use super::stage::{CurrentStage, JobStatus, StageKey, StageStatus};

/// Message logged with the DONE sentinel when a job completes.
pub const COMPLETION_MESSAGE: &str = "Workflow completed successfully.";

/// Time source for the store. Swappable so retention behavior is testable
/// without sleeping.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared in-memory job registry.
///
/// Cloning is cheap; all clones observe the same records. Mutations never
/// error: missing jobs and terminal jobs are silently left alone, so callers
/// on the pipeline's hot path have nothing to handle.
#[derive(Clone)]
pub struct WorkflowJobStore {
    jobs: Arc<Mutex<HashMap<Uuid, Job>>>,
    retention: Duration,
    clock: Clock,
}

impl WorkflowJobStore {
    /// Store with the given retention window, reading time from `Utc::now`.
    pub fn new(retention: Duration) -> Self {
        Self::with_clock(retention, Arc::new(Utc::now))
    }

    /// Store with an explicit time source.
    pub fn with_clock(retention: Duration, clock: Clock) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            retention,
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn locked(&self) -> MutexGuard<'_, HashMap<Uuid, Job>> {
        // A poisoned lock only means another thread panicked while holding
        // it; the map itself is still usable.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a job for `user_id`, sweeping expired records first.
    pub fn create(&self, user_id: Uuid, file_name: impl Into<String>) -> Job {
        let now = self.now();
        let cutoff = now - self.retention;
        let mut jobs = self.locked();
        jobs.retain(|_, job| job.updated_at >= cutoff);

        let job = Job::new(Uuid::new_v4(), user_id, file_name.into(), now);
        jobs.insert(job.job_id, job.clone());
        job
    }

    /// Apply one stage transition.
    ///
    /// `running` marks the stage current, `completed` advances `current_stage`
    /// to the next key, `failed` fails the whole job and records the message
    /// as its error. Passing `pending` does nothing; stages never move
    /// backwards. Every applied transition appends a [`LogEntry`] and
    /// refreshes `updated_at`.
    pub fn mark_stage(
        &self,
        job_id: Uuid,
        stage_key: StageKey,
        status: StageStatus,
        message: impl Into<String>,
    ) {
        if status == StageStatus::Pending {
            return;
        }

        let now = self.now();
        let message = message.into();
        let mut jobs = self.locked();
        let Some(job) = jobs.get_mut(&job_id) else {
            return;
        };
        if job.status.is_terminal() {
            return;
        }
        let Some(stage) = job.stages.iter_mut().find(|stage| stage.key == stage_key) else {
            return;
        };

        stage.status = status;
        stage.message = message.clone();
        stage.started_at.get_or_insert(now);

        match status {
            StageStatus::Running => {
                stage.finished_at = None;
                job.current_stage = CurrentStage::Stage(stage_key);
            }
            StageStatus::Completed => {
                stage.finished_at = Some(now);
                if let Some(next) = stage_key.next() {
                    job.current_stage = CurrentStage::Stage(next);
                }
            }
            StageStatus::Failed => {
                stage.finished_at = Some(now);
                job.current_stage = CurrentStage::Stage(stage_key);
                job.status = JobStatus::Failed;
                job.error = Some(message.clone());
            }
            StageStatus::Pending => unreachable!("pending transitions return early"),
        }

        job.logs.push(LogEntry {
            stage: CurrentStage::Stage(stage_key),
            status,
            message,
            timestamp: now,
        });
        job.updated_at = now;
    }

    /// Mark the job completed and attach its aggregated result.
    pub fn complete(&self, job_id: Uuid, result: serde_json::Value) {
        let now = self.now();
        let mut jobs = self.locked();
        let Some(job) = jobs.get_mut(&job_id) else {
            return;
        };
        if job.status.is_terminal() {
            return;
        }

        job.status = JobStatus::Completed;
        job.current_stage = CurrentStage::Done;
        job.result = Some(result);
        job.logs.push(LogEntry {
            stage: CurrentStage::Done,
            status: StageStatus::Completed,
            message: COMPLETION_MESSAGE.to_string(),
            timestamp: now,
        });
        job.updated_at = now;
    }

    /// Record a failure that no stage bracket captured.
    ///
    /// A no-op when the job is already terminal, so a stage-level failure
    /// followed by this call keeps the stage's message verbatim.
    pub fn fail(&self, job_id: Uuid, message: impl Into<String>) {
        let now = self.now();
        let message = message.into();
        let mut jobs = self.locked();
        let Some(job) = jobs.get_mut(&job_id) else {
            return;
        };
        if job.status.is_terminal() {
            return;
        }

        job.status = JobStatus::Failed;
        job.error = Some(message.clone());
        job.logs.push(LogEntry {
            stage: job.current_stage,
            status: StageStatus::Failed,
            message,
            timestamp: now,
        });
        job.updated_at = now;
    }

    /// Owner-scoped snapshot.
    ///
    /// Missing jobs, expired jobs, and jobs owned by someone else are all
    /// indistinguishable: `None`. Expired records found here are dropped.
    pub fn get(&self, job_id: Uuid, user_id: Uuid) -> Option<Job> {
        let now = self.now();
        let cutoff = now - self.retention;
        let mut jobs = self.locked();

        if jobs
            .get(&job_id)
            .is_some_and(|job| job.updated_at < cutoff)
        {
            jobs.remove(&job_id);
            return None;
        }

        jobs.get(&job_id)
            .filter(|job| job.user_id == user_id)
            .cloned()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, job_id: Uuid) -> bool {
        self.locked().contains_key(&job_id)
    }
}
