//! Compliance rule seeding functionality
//!
//! This module populates the compliance_rules table with the reference rules
//! the agent pipeline ships to the agent service. Rules are addressed by
//! their stable external id, so re-seeding refreshes content in place
//! instead of duplicating rows.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::models::{ComplianceRule, compliance_rule};

/// Seeds the compliance_rules table with the authored reference rule set
///
/// Each rule is looked up by its external id. Missing rules are created;
/// existing ones have their content columns refreshed so the table always
/// converges on this set after a boot.
///
/// # Arguments
///
/// * `db` - Database connection
///
/// # Returns
///
/// Returns a Result indicating success or failure
pub async fn seed_compliance_rules(db: &DatabaseConnection) -> Result<()> {
    for rule in rule_set() {
        match ComplianceRule::find()
            .filter(compliance_rule::Column::ExternalRuleId.eq(rule.external_rule_id))
            .one(db)
            .await
        {
            Ok(Some(existing)) => {
                log::info!(
                    "Compliance rule '{}' already exists, refreshing",
                    rule.external_rule_id
                );

                let mut active: compliance_rule::ActiveModel = existing.into();
                active.regulator = Set(rule.regulator.to_string());
                active.description = Set(rule.description.to_string());
                active.field_name = Set(rule.field_name.to_string());
                active.requirement = Set(rule.requirement.to_string());
                active.severity = Set(rule.severity.to_string());
                active.updated_at = Set(Utc::now().into());

                if let Err(e) = active.update(db).await {
                    log::error!(
                        "Failed to refresh compliance rule '{}': {}",
                        rule.external_rule_id,
                        e
                    );
                    return Err(e.into());
                }
            }
            Ok(None) => {
                log::info!("Creating compliance rule: {}", rule.external_rule_id);

                let active = compliance_rule::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    external_rule_id: Set(rule.external_rule_id.to_string()),
                    regulator: Set(rule.regulator.to_string()),
                    description: Set(rule.description.to_string()),
                    field_name: Set(rule.field_name.to_string()),
                    requirement: Set(rule.requirement.to_string()),
                    severity: Set(rule.severity.to_string()),
                    created_at: Set(Utc::now().into()),
                    updated_at: Set(Utc::now().into()),
                };

                if let Err(e) = active.insert(db).await {
                    log::error!(
                        "Failed to create compliance rule '{}': {}",
                        rule.external_rule_id,
                        e
                    );
                    return Err(e.into());
                }
            }
            Err(e) => {
                log::error!(
                    "Error checking if compliance rule '{}' exists: {}",
                    rule.external_rule_id,
                    e
                );
                return Err(e.into());
            }
        }
    }

    log::info!("Compliance rule seeding completed successfully");
    Ok(())
}

/// One authored reference rule
struct RuleSeed {
    external_rule_id: &'static str,
    regulator: &'static str,
    description: &'static str,
    field_name: &'static str,
    requirement: &'static str,
    severity: &'static str,
}

fn rule_set() -> Vec<RuleSeed> {
    vec![
        RuleSeed {
            external_rule_id: "RBI-KYC-001",
            regulator: "RBI",
            description: "Customer identifier must be present and verified against KYC records.",
            field_name: "customer_identifier",
            requirement: "Present and matching an active KYC record",
            severity: "high",
        },
        RuleSeed {
            external_rule_id: "RBI-KYC-002",
            regulator: "RBI",
            description: "Permanent Account Number must follow the ten character issued format.",
            field_name: "pan_number",
            requirement: "Matches [A-Z]{5}[0-9]{4}[A-Z]",
            severity: "high",
        },
        RuleSeed {
            external_rule_id: "RBI-KYC-003",
            regulator: "RBI",
            description: "Aadhaar references must be redacted to the last four digits.",
            field_name: "aadhaar_reference",
            requirement: "Masked except the final four digits",
            severity: "critical",
        },
        RuleSeed {
            external_rule_id: "RBI-AML-004",
            regulator: "RBI",
            description: "Transaction purpose must be stated for amounts above the reporting threshold.",
            field_name: "transaction_purpose",
            requirement: "Non-empty when the sanctioned amount exceeds INR 1,000,000",
            severity: "high",
        },
        RuleSeed {
            external_rule_id: "RBI-LOAN-005",
            regulator: "RBI",
            description: "Sanctioned amount must be a positive figure consistent across the document.",
            field_name: "sanction_amount",
            requirement: "Positive and consistent across all mentions",
            severity: "medium",
        },
        RuleSeed {
            external_rule_id: "RBI-LOAN-006",
            regulator: "RBI",
            description: "Interest rate must be quoted as an annual percentage within regulated bounds.",
            field_name: "interest_rate",
            requirement: "Annual percentage between 0 and 36",
            severity: "medium",
        },
        RuleSeed {
            external_rule_id: "RBI-KYC-007",
            regulator: "RBI",
            description: "KYC verification date must fall within the re-verification window.",
            field_name: "kyc_verification_date",
            requirement: "Within 24 months of the document date",
            severity: "low",
        },
        RuleSeed {
            external_rule_id: "SEBI-DISC-001",
            regulator: "SEBI",
            description: "Counterparty names must be disclosed in full legal form.",
            field_name: "counterparty_name",
            requirement: "Full registered legal name, no abbreviations",
            severity: "medium",
        },
    ]
}
