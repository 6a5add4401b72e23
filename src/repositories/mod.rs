//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities, providing a clean API for data access with owner-scoped methods.

pub mod compliance_rule;
pub mod document;
pub mod workflow_session;

pub use compliance_rule::ComplianceRuleRepository;
pub use document::DocumentRepository;
pub use workflow_session::{CursorData, WorkflowSessionRepository};
