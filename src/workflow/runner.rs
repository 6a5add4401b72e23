//! # Pipeline Runner
//!
//! Drives the fixed stage sequence for one submitted document: fingerprint the
//! upload, hand it to the external agent service, unpack the agent sections,
//! archive the analysis, and request the rendered report. Progress is reported
//! through a [`StageHook`] so the runner stays independent of the job registry
//! and the session mirror.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use metrics::{counter, histogram};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::agents::{AgentRunOutput, AgentRunRequest, DocumentProcessor, ReportRequest};
use crate::repositories::{ComplianceRuleRepository, DocumentRepository};
use crate::workflow::stage::{StageKey, StageStatus};

/// Observer for stage transitions.
///
/// Invoked in pipeline order: `running` before a stage's work, `completed`
/// after it, `failed` at most once and always last. Implementations may
/// suspend; the runner awaits every notification before moving on.
#[async_trait]
pub trait StageHook: Send + Sync {
    async fn on_stage(&self, stage: StageKey, status: StageStatus, message: &str);
}

/// One submitted document, ready to run.
#[derive(Debug, Clone)]
pub struct WorkflowInput {
    pub user_id: Uuid,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage's own work failed. The hook has already observed the failed
    /// transition with this message.
    #[error("{message}")]
    Stage { stage: StageKey, message: String },

    /// Failure outside any stage bracket (reference-data loading); no stage
    /// was marked failed.
    #[error("{0}")]
    Unclassified(String),
}

/// Aggregated output of a successful run.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    /// Archive row holding the latest analysis for this document fingerprint.
    pub document_id: Uuid,
    /// Path of the rendered report, as returned by the agent service.
    pub report_path: String,
    /// Full multi-agent output.
    pub agents: AgentRunOutput,
}

impl WorkflowOutcome {
    /// Flatten into the JSON stored as the job result.
    pub fn into_result(self) -> Value {
        json!({
            "document_id": self.document_id,
            "report_path": self.report_path,
            "document_profile": self.agents.document_profile,
            "extracted_data": self.agents.structured_data,
            "compliance": self.agents.compliance,
            "decision": self.agents.decision,
            "alerts": self.agents.alerts,
            "reporting_summary": self.agents.reporting_summary,
            "suggestions": self.agents.suggestions,
            "standard_references": self.agents.standard_references,
            "models_used": self.agents.models_used,
        })
    }
}

/// Report request parts assembled before the archive row exists.
struct ReportDraft {
    structured_data: Value,
    compliance: Value,
    decision: Value,
    alerts: Vec<Value>,
    suggestions: Vec<Value>,
    standard_references: Vec<Value>,
    models_used: Vec<Value>,
}

impl ReportDraft {
    fn into_request(self, document_ref: Uuid, document_name: String) -> ReportRequest {
        ReportRequest {
            document_ref,
            document_name,
            structured_data: self.structured_data,
            compliance: self.compliance,
            decision: self.decision,
            alerts: self.alerts,
            suggestions: self.suggestions,
            standard_references: self.standard_references,
            models_used: self.models_used,
        }
    }
}

/// Executes the document workflow stage by stage.
///
/// The runner carries no job identity and keeps no state between runs;
/// re-running the same document is an independent execution.
#[derive(Clone)]
pub struct PipelineRunner {
    processor: Arc<dyn DocumentProcessor>,
    rules: ComplianceRuleRepository,
    documents: DocumentRepository,
}

impl PipelineRunner {
    /// Create a new runner over the given processor and repositories.
    pub fn new(
        processor: Arc<dyn DocumentProcessor>,
        rules: ComplianceRuleRepository,
        documents: DocumentRepository,
    ) -> Self {
        Self {
            processor,
            rules,
            documents,
        }
    }

    /// Run every stage in order for one document.
    ///
    /// The hook observes `running` before and `completed` after each stage.
    /// The first failure notifies the hook with `failed`, stops the pipeline
    /// and is returned to the caller; no later stage runs.
    #[instrument(skip(self, input, hook), fields(user_id = %input.user_id, file_name = %input.file_name))]
    pub async fn run(
        &self,
        input: WorkflowInput,
        hook: &dyn StageHook,
    ) -> Result<WorkflowOutcome, PipelineError> {
        let started = Instant::now();
        counter!("workflow_runs_total").increment(1);
        info!(
            "Running document workflow for {} ({} bytes)",
            input.file_name,
            input.bytes.len()
        );

        hook.on_stage(
            StageKey::Ingestion,
            StageStatus::Running,
            "File normalization and hash calculation started.",
        )
        .await;
        let file_hash = hex::encode(Sha256::digest(&input.bytes));
        self.complete_stage(hook, StageKey::Ingestion, "File prepared for agent pipeline.")
            .await;

        // Reference data rides along with the agent request. This load sits
        // outside every stage bracket, so its failure is unclassified.
        let rules = self.rules.load_rule_context().await.map_err(|err| {
            PipelineError::Unclassified(format!("Failed to load compliance rules: {}", err.message))
        })?;

        hook.on_stage(
            StageKey::DocumentAgent,
            StageStatus::Running,
            "Extracting structured data via DeepSeek.",
        )
        .await;
        let request = AgentRunRequest {
            file_name: input.file_name.clone(),
            file_b64: general_purpose::STANDARD.encode(&input.bytes),
            rules,
        };
        let agents = match self.processor.run_agents(request).await {
            Ok(output) => output,
            Err(err) => {
                return Err(self
                    .fail_stage(hook, StageKey::DocumentAgent, err.to_string())
                    .await);
            }
        };
        self.complete_stage(hook, StageKey::DocumentAgent, "Document entities extracted.")
            .await;

        hook.on_stage(
            StageKey::ComplianceAgent,
            StageStatus::Running,
            "Applying GVR standards and validating clauses.",
        )
        .await;
        let compliance = match agents.compliance.clone() {
            Some(section) => section,
            None => {
                return Err(self
                    .fail_stage(
                        hook,
                        StageKey::ComplianceAgent,
                        "Agent output is missing the compliance section.".to_string(),
                    )
                    .await);
            }
        };
        self.complete_stage(hook, StageKey::ComplianceAgent, "Regulatory checks executed.")
            .await;

        hook.on_stage(
            StageKey::DecisionAgent,
            StageStatus::Running,
            "Computing two-layer verified risk score.",
        )
        .await;
        let decision = match agents.decision.clone() {
            Some(section) => section,
            None => {
                return Err(self
                    .fail_stage(
                        hook,
                        StageKey::DecisionAgent,
                        "Agent output is missing the decision section.".to_string(),
                    )
                    .await);
            }
        };
        self.complete_stage(hook, StageKey::DecisionAgent, "Risk scoring completed.")
            .await;

        hook.on_stage(
            StageKey::MonitoringAgent,
            StageStatus::Running,
            "Evaluating anomaly and alert conditions.",
        )
        .await;
        let alert_count = agents.alerts.len();
        counter!("workflow_alerts_total").increment(alert_count as u64);
        debug!("Evaluated {} alert(s) from monitoring output", alert_count);
        self.complete_stage(
            hook,
            StageKey::MonitoringAgent,
            "Alerts and anomalies evaluated.",
        )
        .await;

        hook.on_stage(
            StageKey::ReportingAgent,
            StageStatus::Running,
            "Curating institutional report narrative.",
        )
        .await;
        let draft = ReportDraft {
            structured_data: agents.structured_data.clone(),
            compliance,
            decision,
            alerts: agents.alerts.clone(),
            suggestions: agents.suggestions.clone(),
            standard_references: agents.standard_references.clone(),
            models_used: agents.models_used.clone(),
        };
        self.complete_stage(
            hook,
            StageKey::ReportingAgent,
            "Report narrative generated.",
        )
        .await;

        hook.on_stage(
            StageKey::Persistence,
            StageStatus::Running,
            "Persisting outputs and report metadata.",
        )
        .await;
        let analysis = match serde_json::to_value(&agents) {
            Ok(value) => value,
            Err(err) => {
                return Err(self
                    .fail_stage(
                        hook,
                        StageKey::Persistence,
                        format!("Failed to serialize agent output: {}", err),
                    )
                    .await);
            }
        };
        let document = match self
            .documents
            .upsert_analysis(input.user_id, &file_hash, &input.file_name, analysis)
            .await
        {
            Ok(model) => model,
            Err(err) => {
                return Err(self
                    .fail_stage(
                        hook,
                        StageKey::Persistence,
                        format!("Failed to archive analysis: {}", err.message),
                    )
                    .await);
            }
        };
        let report = match self
            .processor
            .generate_report(draft.into_request(document.id, input.file_name.clone()))
            .await
        {
            Ok(report) => report,
            Err(err) => {
                return Err(self
                    .fail_stage(hook, StageKey::Persistence, err.to_string())
                    .await);
            }
        };
        if let Err(err) = self
            .documents
            .set_report_path(document.id, &report.report_path)
            .await
        {
            return Err(self
                .fail_stage(
                    hook,
                    StageKey::Persistence,
                    format!("Failed to record report path: {}", err.message),
                )
                .await);
        }
        self.complete_stage(hook, StageKey::Persistence, "Pipeline results saved.")
            .await;

        let elapsed = started.elapsed();
        histogram!("workflow_run_seconds").record(elapsed.as_secs_f64());
        info!(
            "Workflow completed for {} in {:.2}s",
            input.file_name,
            elapsed.as_secs_f64()
        );

        Ok(WorkflowOutcome {
            document_id: document.id,
            report_path: report.report_path,
            agents,
        })
    }

    async fn complete_stage(&self, hook: &dyn StageHook, stage: StageKey, message: &str) {
        counter!("workflow_stages_completed_total", "stage" => stage.as_str()).increment(1);
        hook.on_stage(stage, StageStatus::Completed, message).await;
    }

    async fn fail_stage(
        &self,
        hook: &dyn StageHook,
        stage: StageKey,
        message: String,
    ) -> PipelineError {
        counter!("workflow_stage_failures_total", "stage" => stage.as_str()).increment(1);
        hook.on_stage(stage, StageStatus::Failed, &message).await;
        PipelineError::Stage { stage, message }
    }
}
