//! ComplianceRule entity model
//!
//! Reference rules shipped to the agent service as analysis context. Rows are
//! seeded at boot and addressed by their stable external id.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agents::RuleContext;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "compliance_rules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Stable regulator-facing identifier (e.g. "RBI-KYC-001")
    #[sea_orm(unique)]
    pub external_rule_id: String,

    pub regulator: String,

    pub description: String,

    /// Document field the rule applies to
    pub field_name: String,

    pub requirement: String,

    /// low, medium, high, or critical
    pub severity: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RuleContext {
    fn from(model: Model) -> Self {
        Self {
            id: model.external_rule_id,
            regulator: model.regulator,
            description: model.description,
            field: model.field_name,
            requirement: model.requirement,
            severity: model.severity,
        }
    }
}
