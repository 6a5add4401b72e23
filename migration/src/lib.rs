//! Database migrations for the Compliance Workflows API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_07_02_101500_create_workflow_sessions;
mod m2026_07_02_101600_create_documents;
mod m2026_07_02_101700_create_compliance_rules;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_07_02_101500_create_workflow_sessions::Migration),
            Box::new(m2026_07_02_101600_create_documents::Migration),
            Box::new(m2026_07_02_101700_create_compliance_rules::Migration),
        ]
    }
}
