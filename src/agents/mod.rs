//! # Agent Service Seam
//!
//! Trait and wire types for the external multi-agent document processor. The
//! pipeline only ever talks to [`DocumentProcessor`]; the production
//! implementation lives in [`client`] and tests swap in stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub mod client;

pub use client::AgentServiceClient;

/// Failures from the agent service.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The service could not be reached at all.
    #[error("Agent service request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Agent service returned HTTP {status}: {snippet}")]
    Upstream { status: u16, snippet: String },

    /// A success response that did not decode into the expected shape.
    #[error("Agent service response was malformed: {0}")]
    Decode(String),
}

/// Rule row shipped to the agent service as analysis context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleContext {
    pub id: String,
    pub regulator: String,
    pub description: String,
    pub field: String,
    pub requirement: String,
    pub severity: String,
}

/// Request body for the orchestrate-agents operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunRequest {
    pub file_name: String,
    /// Raw document bytes, base64-encoded.
    pub file_b64: String,
    pub rules: Vec<RuleContext>,
}

/// Combined output of one multi-agent run.
///
/// Sections the pipeline inspects are typed as options; everything else is
/// carried opaquely and archived as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentRunOutput {
    #[serde(default)]
    pub structured_data: Value,
    #[serde(default)]
    pub document_profile: Value,
    /// Compliance findings; `None` when the compliance agent produced nothing.
    #[serde(default)]
    pub compliance: Option<Value>,
    /// Risk decision; `None` when the decision agent produced nothing.
    #[serde(default)]
    pub decision: Option<Value>,
    #[serde(default)]
    pub alerts: Vec<Value>,
    #[serde(default)]
    pub reporting_summary: Value,
    #[serde(default)]
    pub suggestions: Vec<Value>,
    #[serde(default)]
    pub standard_references: Vec<Value>,
    #[serde(default)]
    pub models_used: Vec<Value>,
    #[serde(default)]
    pub agent_trace: Vec<Value>,
}

/// Request body for the generate-report operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub document_ref: Uuid,
    pub document_name: String,
    pub structured_data: Value,
    pub compliance: Value,
    pub decision: Value,
    pub alerts: Vec<Value>,
    pub suggestions: Vec<Value>,
    pub standard_references: Vec<Value>,
    pub models_used: Vec<Value>,
}

/// Response from the report generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportGenerated {
    pub report_path: String,
}

/// External multi-agent document processor.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Run the full agent pipeline over one document.
    async fn run_agents(&self, request: AgentRunRequest)
    -> Result<AgentRunOutput, ProcessorError>;

    /// Render the analysis into a report file and return its path.
    async fn generate_report(
        &self,
        request: ReportRequest,
    ) -> Result<ReportGenerated, ProcessorError>;
}
