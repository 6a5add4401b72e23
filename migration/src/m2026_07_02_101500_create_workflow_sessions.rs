//! Migration to create the workflow_sessions table.
//!
//! workflow_sessions is the durable mirror of the in-memory workflow job
//! registry: one row per submitted job, upserted after every stage transition
//! and at terminal state, owner-scoped by user_id.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkflowSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkflowSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WorkflowSessions::UserId).uuid().not_null())
                    .col(ColumnDef::new(WorkflowSessions::FileName).text().not_null())
                    .col(
                        ColumnDef::new(WorkflowSessions::Status)
                            .text()
                            .not_null()
                            .default("running"),
                    )
                    .col(
                        ColumnDef::new(WorkflowSessions::CurrentStage)
                            .text()
                            .not_null()
                            .default("INGESTION"),
                    )
                    .col(
                        ColumnDef::new(WorkflowSessions::Stages)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WorkflowSessions::Result).json_binary().null())
                    .col(ColumnDef::new(WorkflowSessions::ErrorText).text().null())
                    .col(
                        ColumnDef::new(WorkflowSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WorkflowSessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for the owner-scoped session list ordered by recency
        manager
            .create_index(
                Index::create()
                    .name("idx_workflow_sessions_user_updated")
                    .table(WorkflowSessions::Table)
                    .col(WorkflowSessions::UserId)
                    .col(WorkflowSessions::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_workflow_sessions_user_updated")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(WorkflowSessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WorkflowSessions {
    Table,
    Id,
    UserId,
    FileName,
    Status,
    CurrentStage,
    Stages,
    Result,
    ErrorText,
    CreatedAt,
    UpdatedAt,
}
