//! # Document Repository
//!
//! Archive of the latest analysis per document fingerprint. Each
//! (user_id, file_hash) pair holds exactly one row; re-analyzing a document
//! replaces the stored agent output and clears the stale report path until a
//! fresh report is recorded.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::document::{ActiveModel, Column, Entity, Model};

/// Repository for document archive database operations
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
}

impl DocumentRepository {
    /// Create a new DocumentRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert or refresh the archive row for a document fingerprint
    pub async fn upsert_analysis(
        &self,
        user_id: Uuid,
        file_hash: &str,
        file_name: &str,
        analysis: JsonValue,
    ) -> Result<Model, ApiError> {
        let now = Utc::now().fixed_offset();

        let row = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            file_hash: Set(file_hash.to_string()),
            file_name: Set(file_name.to_string()),
            analysis: Set(analysis),
            report_path: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Entity::insert(row)
            .on_conflict(
                OnConflict::columns([Column::UserId, Column::FileHash])
                    .update_columns([
                        Column::FileName,
                        Column::Analysis,
                        Column::ReportPath,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to archive document analysis: {}", e);
                ApiError::new(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Failed to archive document analysis",
                )
            })?;

        // The upsert keeps the original row id on conflict, so re-read to get
        // the authoritative row.
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::FileHash.eq(file_hash))
            .one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to read back archived document: {}", e);
                ApiError::new(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Failed to read back archived document",
                )
            })?
            .ok_or_else(|| {
                tracing::error!(user_id = %user_id, file_hash, "Archived document row missing after upsert");
                ApiError::new(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Archived document row missing after upsert",
                )
            })
    }

    /// Record the generated report path on an archive row
    pub async fn set_report_path(&self, id: Uuid, report_path: &str) -> Result<(), ApiError> {
        let row = Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find archived document: {}", e);
                ApiError::new(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Failed to find archived document",
                )
            })?
            .ok_or_else(|| {
                tracing::error!(document_id = %id, "Archived document not found for report path update");
                ApiError::new(
                    axum::http::StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Archived document not found",
                )
            })?;

        let mut active: ActiveModel = row.into();
        active.report_path = Set(Some(report_path.to_string()));
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(&self.db).await.map_err(|e| {
            tracing::error!("Failed to record report path: {}", e);
            ApiError::new(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "Failed to record report path",
            )
        })?;

        Ok(())
    }
}
