//! # Agent Service Client
//!
//! Reqwest-backed [`DocumentProcessor`] talking to the agent service over
//! HTTP. Calls are slow (the document agents run LLM passes), so the client
//! carries a generous request timeout configured at construction.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{
    AgentRunOutput, AgentRunRequest, DocumentProcessor, ProcessorError, ReportGenerated,
    ReportRequest,
};

/// Longest error-body excerpt carried into an upstream error.
const BODY_SNIPPET_CHARS: usize = 200;

/// HTTP client for the agent service.
#[derive(Clone)]
pub struct AgentServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl AgentServiceClient {
    /// Build a client rooted at `base_url` with one timeout for both
    /// operations.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, ProcessorError>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Calling agent service");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| ProcessorError::Transport(err.to_string()))?;

        if response.status().is_success() {
            response
                .json::<Resp>()
                .await
                .map_err(|err| ProcessorError::Decode(err.to_string()))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(ProcessorError::Upstream {
                status,
                snippet: snippet(&body),
            })
        }
    }
}

#[async_trait]
impl DocumentProcessor for AgentServiceClient {
    async fn run_agents(
        &self,
        request: AgentRunRequest,
    ) -> Result<AgentRunOutput, ProcessorError> {
        self.post_json("orchestrate-agents", &request).await
    }

    async fn generate_report(
        &self,
        request: ReportRequest,
    ) -> Result<ReportGenerated, ProcessorError> {
        self.post_json("generate-report", &request).await
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(BODY_SNIPPET_CHARS).collect();
    format!("{head}...")
}
