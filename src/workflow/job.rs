//! # Workflow Job Records
//!
//! Snapshot types held by the in-memory registry. Status polling returns these
//! verbatim, so field names here are the wire contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::stage::{CurrentStage, JobStatus, StageKey, StageStatus};

/// One record per pipeline stage, embedded in [`Job::stages`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StageRecord {
    pub key: StageKey,
    /// Display name for the stage.
    pub label: String,
    pub status: StageStatus,
    /// Most recent transition message; empty until the stage first moves.
    pub message: String,
    #[schema(value_type = Option<String>, example = "2026-07-02T12:00:00Z")]
    pub started_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, example = "2026-07-02T12:00:05Z")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl StageRecord {
    pub(crate) fn pending(key: StageKey) -> Self {
        Self {
            key,
            label: key.label().to_string(),
            status: StageStatus::Pending,
            message: String::new(),
            started_at: None,
            finished_at: None,
        }
    }
}

/// Append-only log line recorded on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    #[schema(value_type = String, example = "INGESTION")]
    pub stage: CurrentStage,
    pub status: StageStatus,
    pub message: String,
    #[schema(value_type = String, example = "2026-07-02T12:00:00Z")]
    pub timestamp: DateTime<Utc>,
}

/// Full job snapshot.
///
/// `result` and `error` are mutually exclusive: `result` is set only by a
/// successful completion, `error` only by a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Job {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub status: JobStatus,
    #[schema(value_type = String, example = "INGESTION")]
    pub current_stage: CurrentStage,
    pub stages: Vec<StageRecord>,
    pub logs: Vec<LogEntry>,
    #[schema(value_type = Option<Object>)]
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    #[schema(value_type = String, example = "2026-07-02T12:00:00Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2026-07-02T12:00:00Z")]
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Fresh job: every stage pending, the first one current.
    pub(crate) fn new(
        job_id: Uuid,
        user_id: Uuid,
        file_name: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            user_id,
            file_name,
            status: JobStatus::Running,
            current_stage: CurrentStage::Stage(StageKey::ORDER[0]),
            stages: StageKey::ORDER
                .iter()
                .copied()
                .map(StageRecord::pending)
                .collect(),
            logs: Vec::new(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
