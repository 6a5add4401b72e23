//! Workflow module
//!
//! This module provides the asynchronous document workflow core:
//! - The in-memory job registry polled by clients
//! - The fixed stage sequence and its wire vocabulary
//! - The pipeline runner that executes stages and reports transitions

pub mod job;
pub mod runner;
pub mod stage;
pub mod store;

pub use job::{Job, LogEntry, StageRecord};
pub use runner::{PipelineError, PipelineRunner, StageHook, WorkflowInput, WorkflowOutcome};
pub use stage::{CurrentStage, DONE_SENTINEL, JobStatus, StageKey, StageStatus};
pub use store::{COMPLETION_MESSAGE, WorkflowJobStore};
