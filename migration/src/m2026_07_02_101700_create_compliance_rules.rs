//! Migration to create the compliance_rules table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComplianceRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComplianceRules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ComplianceRules::ExternalRuleId)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ComplianceRules::Regulator).text().not_null())
                    .col(
                        ColumnDef::new(ComplianceRules::Description)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ComplianceRules::FieldName).text().not_null())
                    .col(
                        ColumnDef::new(ComplianceRules::Requirement)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComplianceRules::Severity)
                            .text()
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(ComplianceRules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ComplianceRules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ComplianceRules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ComplianceRules {
    Table,
    Id,
    ExternalRuleId,
    Regulator,
    Description,
    FieldName,
    Requirement,
    Severity,
    CreatedAt,
    UpdatedAt,
}
