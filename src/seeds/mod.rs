//! Database seeding functionality
//!
//! This module provides functionality to seed the database with reference
//! data the agent pipeline depends on. Compliance rules are upserted by
//! their external id so every boot converges on the authored rule set.

pub mod compliance_rule;

pub use compliance_rule::seed_compliance_rules;
