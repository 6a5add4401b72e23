//! # Data Models
//!
//! This module contains all the data models used throughout the Workflows API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod compliance_rule;
pub mod document;
pub mod workflow_session;

pub use compliance_rule::Entity as ComplianceRule;
pub use document::Entity as Document;
pub use workflow_session::Entity as WorkflowSession;
pub use workflow_session::{SessionDetail, SessionSummary};

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "workflows".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
