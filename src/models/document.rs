//! Document entity model
//!
//! Analysis archive: the latest agent output and report path per
//! (user_id, file_hash) fingerprint. Re-analyzing the same file replaces the
//! previous row instead of stacking duplicates.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,

    pub user_id: Uuid,

    /// SHA-256 hex digest of the uploaded bytes
    pub file_hash: String,

    pub file_name: String,

    /// Full agent output as returned by the orchestrate run
    #[sea_orm(column_type = "JsonBinary")]
    pub analysis: Json,

    /// Path of the generated report, once one exists
    pub report_path: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
