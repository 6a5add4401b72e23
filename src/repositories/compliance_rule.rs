//! # Compliance Rule Repository
//!
//! Read access to the seeded compliance_rules reference table. The pipeline
//! loads the whole table once per run and ships it to the agent service as
//! analysis context.

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::agents::RuleContext;
use crate::error::ApiError;
use crate::models::compliance_rule::{Column, Entity};

/// Repository for compliance rule database operations
#[derive(Debug, Clone)]
pub struct ComplianceRuleRepository {
    db: DatabaseConnection,
}

impl ComplianceRuleRepository {
    /// Create a new ComplianceRuleRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Load every rule as agent request context, ordered by external rule id
    pub async fn load_rule_context(&self) -> Result<Vec<RuleContext>, ApiError> {
        let rules = Entity::find()
            .order_by_asc(Column::ExternalRuleId)
            .all(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load compliance rules: {}", e);
                ApiError::new(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Failed to load compliance rules",
                )
            })?;

        Ok(rules.into_iter().map(RuleContext::from).collect())
    }
}
