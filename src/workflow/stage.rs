//! # Pipeline Stages
//!
//! Fixed stage vocabulary for the document workflow. The stage set and its
//! order never change at runtime; every job carries exactly one record per
//! stage in this order.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sentinel shown as `current_stage` once a job has completed.
pub const DONE_SENTINEL: &str = "DONE";

/// Identifier of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum StageKey {
    #[serde(rename = "INGESTION")]
    Ingestion,

    #[serde(rename = "DOCUMENT_AGENT")]
    DocumentAgent,

    #[serde(rename = "COMPLIANCE_AGENT")]
    ComplianceAgent,

    #[serde(rename = "DECISION_AGENT")]
    DecisionAgent,

    #[serde(rename = "MONITORING_AGENT")]
    MonitoringAgent,

    #[serde(rename = "REPORTING_AGENT")]
    ReportingAgent,

    #[serde(rename = "PERSISTENCE")]
    Persistence,
}

impl StageKey {
    /// Pipeline order. `Job::stages` is built from this slice verbatim.
    pub const ORDER: [StageKey; 7] = [
        StageKey::Ingestion,
        StageKey::DocumentAgent,
        StageKey::ComplianceAgent,
        StageKey::DecisionAgent,
        StageKey::MonitoringAgent,
        StageKey::ReportingAgent,
        StageKey::Persistence,
    ];

    /// Stable wire form of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKey::Ingestion => "INGESTION",
            StageKey::DocumentAgent => "DOCUMENT_AGENT",
            StageKey::ComplianceAgent => "COMPLIANCE_AGENT",
            StageKey::DecisionAgent => "DECISION_AGENT",
            StageKey::MonitoringAgent => "MONITORING_AGENT",
            StageKey::ReportingAgent => "REPORTING_AGENT",
            StageKey::Persistence => "PERSISTENCE",
        }
    }

    /// Display name shown to clients alongside the key.
    pub fn label(&self) -> &'static str {
        match self {
            StageKey::Ingestion => "Data Ingestion",
            StageKey::DocumentAgent => "Document Agent",
            StageKey::ComplianceAgent => "Compliance Agent",
            StageKey::DecisionAgent => "Decision Agent",
            StageKey::MonitoringAgent => "Monitoring Agent",
            StageKey::ReportingAgent => "Reporting Agent",
            StageKey::Persistence => "Storage & Report",
        }
    }

    /// The stage that follows this one in pipeline order, if any.
    pub fn next(&self) -> Option<StageKey> {
        let idx = Self::ORDER.iter().position(|key| key == self)?;
        Self::ORDER.get(idx + 1).copied()
    }
}

impl std::fmt::Display for StageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall job state. `Running` is the only non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Completed and failed jobs accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of `Job::current_stage`: a stage key while the pipeline advances,
/// then the DONE sentinel after completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentStage {
    Stage(StageKey),
    Done,
}

impl CurrentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrentStage::Stage(key) => key.as_str(),
            CurrentStage::Done => DONE_SENTINEL,
        }
    }
}

impl From<StageKey> for CurrentStage {
    fn from(key: StageKey) -> Self {
        CurrentStage::Stage(key)
    }
}

impl std::fmt::Display for CurrentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CurrentStage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CurrentStage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == DONE_SENTINEL {
            return Ok(CurrentStage::Done);
        }
        StageKey::ORDER
            .iter()
            .find(|key| key.as_str() == raw)
            .copied()
            .map(CurrentStage::Stage)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown stage key: {raw}")))
    }
}
