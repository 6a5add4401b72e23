//! Migration to create the documents table.
//!
//! documents is the analysis archive: the latest agent output and report path
//! per (user_id, file_hash) fingerprint, upserted by the persistence stage.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Documents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Documents::UserId).uuid().not_null())
                    .col(ColumnDef::new(Documents::FileHash).text().not_null())
                    .col(ColumnDef::new(Documents::FileName).text().not_null())
                    .col(ColumnDef::new(Documents::Analysis).json_binary().not_null())
                    .col(ColumnDef::new(Documents::ReportPath).text().null())
                    .col(
                        ColumnDef::new(Documents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Documents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One archive row per owner and file fingerprint
        manager
            .create_index(
                Index::create()
                    .name("idx_documents_user_file_hash")
                    .table(Documents::Table)
                    .col(Documents::UserId)
                    .col(Documents::FileHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_documents_user_file_hash").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
    UserId,
    FileHash,
    FileName,
    Analysis,
    ReportPath,
    CreatedAt,
    UpdatedAt,
}
