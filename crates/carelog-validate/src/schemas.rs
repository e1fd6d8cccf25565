//! The stock screening schemas for carelog intents.
//!
//! Only intents carrying user-entered fields are screened; everything else
//! passes through the validator untouched. Frequency text is deliberately
//! absent here — presets are suggestions, not a validation set.

use serde_json::json;

use carelog_contracts::screen::{FieldRule, FieldRuleType, IntentSchema};

use crate::engine::IntentValidator;

/// Build a validator preloaded with the stock carelog schemas.
pub fn default_validator() -> IntentValidator {
    let mut validator = IntentValidator::new();

    validator.register(
        "add-window",
        IntentSchema {
            schema_id: "add-window-v1".to_string(),
            json_schema: json!({
                "type": "object",
                "required": ["start_date"]
            }),
            rules: vec![
                FieldRule {
                    rule_id: "req-start-date".to_string(),
                    description: "A certification period needs a start date".to_string(),
                    rule_type: FieldRuleType::RequiredField {
                        field_path: "start_date".to_string(),
                    },
                },
                FieldRule {
                    rule_id: "start-before-end".to_string(),
                    description: "An explicit end date must not precede the start".to_string(),
                    rule_type: FieldRuleType::DatePair {
                        start_path: "start_date".to_string(),
                        end_path: "end_date".to_string(),
                    },
                },
            ],
        },
    );

    validator.register(
        "assign-staff",
        IntentSchema {
            schema_id: "assign-staff-v1".to_string(),
            json_schema: json!({
                "type": "object",
                "required": ["discipline", "slot", "staff_id"]
            }),
            rules: vec![FieldRule {
                rule_id: "req-staff-id".to_string(),
                description: "An assignment needs a staff member".to_string(),
                rule_type: FieldRuleType::RequiredField {
                    field_path: "staff_id".to_string(),
                },
            }],
        },
    );

    validator.register(
        "override-status",
        IntentSchema {
            schema_id: "override-status-v1".to_string(),
            json_schema: serde_json::Value::Null,
            rules: vec![FieldRule {
                rule_id: "known-status".to_string(),
                description: "Manual status must be one of the three states".to_string(),
                rule_type: FieldRuleType::AllowedValues {
                    field_path: "status".to_string(),
                    allowed: vec![json!("waiting"), json!("active"), json!("no_more")],
                },
            }],
        },
    );

    validator.register(
        "schedule-visit",
        IntentSchema {
            schema_id: "schedule-visit-v1".to_string(),
            json_schema: serde_json::Value::Null,
            rules: vec![
                FieldRule {
                    rule_id: "req-visit-date".to_string(),
                    description: "A visit needs a date".to_string(),
                    rule_type: FieldRuleType::RequiredField {
                        field_path: "visit.visit_date".to_string(),
                    },
                },
                FieldRule {
                    rule_id: "known-discipline".to_string(),
                    description: "A visit belongs to one of the three disciplines".to_string(),
                    rule_type: FieldRuleType::AllowedValues {
                        field_path: "visit.discipline".to_string(),
                        allowed: vec![json!("PT"), json!("OT"), json!("ST")],
                    },
                },
            ],
        },
    );

    validator.register(
        "update-patient",
        IntentSchema {
            schema_id: "update-patient-v1".to_string(),
            json_schema: json!({
                "type": "object",
                "required": ["fields"]
            }),
            rules: vec![],
        },
    );

    validator
}
