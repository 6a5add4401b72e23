//! # Workflow Session Repository
//!
//! Durable mirror of the in-memory job registry. One row per job, inserted at
//! submit time and refreshed after every stage transition, so session history
//! survives restarts and registry eviction. List reads are owner-scoped with
//! cursor pagination.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::workflow_session::{ActiveModel, Column, Entity, Model};
use crate::workflow::Job;

/// Cursor data structure for session pagination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorData {
    pub updated_at: DateTime<Utc>,
    pub id: Uuid,
}

/// Repository for workflow session database operations
#[derive(Debug, Clone)]
pub struct WorkflowSessionRepository {
    db: DatabaseConnection,
}

impl WorkflowSessionRepository {
    /// Create a new WorkflowSessionRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Record a freshly created job. Awaited at submit time; a failure here
    /// fails the submission before the pipeline starts.
    pub async fn insert_new(&self, job: &Job) -> Result<(), ApiError> {
        let row = ActiveModel {
            id: Set(job.job_id),
            user_id: Set(job.user_id),
            file_name: Set(job.file_name.clone()),
            status: Set(job.status.as_str().to_string()),
            current_stage: Set(job.current_stage.as_str().to_string()),
            stages: Set(Self::stage_snapshot(job)?),
            result: Set(None),
            error_text: Set(None),
            created_at: Set(job.created_at.fixed_offset()),
            updated_at: Set(job.updated_at.fixed_offset()),
        };

        row.insert(&self.db).await.map_err(|e| {
            tracing::error!("Failed to record workflow session: {}", e);
            ApiError::new(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "Failed to record workflow session",
            )
        })?;

        tracing::info!(
            job_id = %job.job_id,
            user_id = %job.user_id,
            "Workflow session recorded"
        );

        Ok(())
    }

    /// Refresh the durable snapshot from the current job state. Call sites
    /// treat a failure as best-effort: the in-memory transition stands.
    pub async fn upsert_snapshot(&self, job: &Job) -> Result<(), ApiError> {
        let row = ActiveModel {
            id: Set(job.job_id),
            user_id: Set(job.user_id),
            file_name: Set(job.file_name.clone()),
            status: Set(job.status.as_str().to_string()),
            current_stage: Set(job.current_stage.as_str().to_string()),
            stages: Set(Self::stage_snapshot(job)?),
            result: Set(job.result.clone()),
            error_text: Set(job.error.clone()),
            created_at: Set(job.created_at.fixed_offset()),
            updated_at: Set(job.updated_at.fixed_offset()),
        };

        Entity::insert(row)
            .on_conflict(
                OnConflict::column(Column::Id)
                    .update_columns([
                        Column::Status,
                        Column::CurrentStage,
                        Column::Stages,
                        Column::Result,
                        Column::ErrorText,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to refresh workflow session snapshot: {}", e);
                ApiError::new(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Failed to refresh workflow session snapshot",
                )
            })?;

        Ok(())
    }

    /// List sessions for an owner, newest activity first, with cursor
    /// pagination over (updated_at, id)
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: u64,
        cursor_data: Option<CursorData>,
    ) -> Result<Vec<Model>, ApiError> {
        let mut query = Entity::find().filter(Column::UserId.eq(user_id));

        if let Some(cursor) = cursor_data {
            query = query.filter(
                Condition::any()
                    .add(Column::UpdatedAt.lt(cursor.updated_at))
                    .add(
                        Condition::all()
                            .add(Column::UpdatedAt.eq(cursor.updated_at))
                            .add(Column::Id.lt(cursor.id)),
                    ),
            );
        }

        // Order by updated_at DESC, id DESC for stability
        let sessions = query
            .order_by_desc(Column::UpdatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(sessions)
    }

    /// Find a session by id, ensuring it belongs to the specified owner
    pub async fn find_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Model>, ApiError> {
        let session = Entity::find_by_id(id)
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        Ok(session)
    }

    fn stage_snapshot(job: &Job) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(&job.stages).map_err(|e| {
            tracing::error!("Failed to serialize stage snapshot: {}", e);
            ApiError::new(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "Failed to serialize stage snapshot",
            )
        })
    }
}
