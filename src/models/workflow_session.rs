//! WorkflowSession entity model
//!
//! Durable mirror of the in-memory workflow job registry: one row per
//! submitted job, written at submission and refreshed after every stage
//! transition. Rows outlive the in-memory record and back the session
//! history endpoints.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// WorkflowSession entity representing one mirrored workflow job
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workflow_sessions")]
pub struct Model {
    /// Same value as the in-memory job id
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Owner of the job; every read is scoped by this column
    pub user_id: Uuid,

    pub file_name: String,

    /// Job status (running, completed, failed)
    pub status: String,

    /// Stage key currently in progress, or DONE once completed
    pub current_stage: String,

    /// Stage records serialized verbatim from the job snapshot
    #[sea_orm(column_type = "JsonBinary")]
    pub stages: Json,

    /// Aggregated pipeline result; null until the run completes
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub result: Option<Json>,

    /// Failure message; null unless the run failed
    pub error_text: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Compact row for the session list (excludes stages, result, and error)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionSummary {
    pub id: Uuid,
    pub file_name: String,
    pub status: String,
    #[schema(example = "DONE")]
    pub current_stage: String,
    /// Identifier of the archived document, once the run has produced one
    pub document_id: Option<String>,
    #[schema(value_type = String, example = "2026-07-02T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, example = "2026-07-02T12:05:00Z")]
    pub updated_at: DateTimeWithTimeZone,
}

impl From<Model> for SessionSummary {
    fn from(model: Model) -> Self {
        let document_id = model
            .result
            .as_ref()
            .and_then(|result| result.get("document_id"))
            .and_then(|value| value.as_str())
            .map(str::to_string);

        Self {
            id: model.id,
            file_name: model.file_name,
            status: model.status,
            current_stage: model.current_stage,
            document_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Full session row for the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionDetail {
    pub id: Uuid,
    pub file_name: String,
    pub status: String,
    #[schema(example = "DONE")]
    pub current_stage: String,
    #[schema(value_type = Object)]
    pub stages: serde_json::Value,
    #[schema(value_type = Option<Object>)]
    pub result: Option<serde_json::Value>,
    pub error_text: Option<String>,
    #[schema(value_type = String, example = "2026-07-02T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, example = "2026-07-02T12:05:00Z")]
    pub updated_at: DateTimeWithTimeZone,
}

impl From<Model> for SessionDetail {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            file_name: model.file_name,
            status: model.status,
            current_stage: model.current_stage,
            stages: model.stages,
            result: model.result,
            error_text: model.error_text,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
