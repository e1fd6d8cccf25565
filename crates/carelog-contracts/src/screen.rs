//! Intent screening schema and report types.
//!
//! Before the store calls the gateway, the intent payload is screened
//! against an `IntentSchema`. Only a passing `ScreenReport` lets the
//! mutation proceed to the network.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The full specification an intent payload is screened against.
///
/// Combines a JSON Schema document for structural validation with field
/// rules that go beyond what JSON Schema can express.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSchema {
    /// Unique identifier for this schema (e.g. "add-window-v1").
    pub schema_id: String,
    /// A JSON Schema document used for structural validation. `null` means
    /// no structural constraint.
    pub json_schema: Value,
    /// Field rules evaluated after structural validation.
    pub rules: Vec<FieldRule>,
}

/// A single screening rule applied to an intent payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    /// Unique identifier for this rule, referenced in failure reports.
    pub rule_id: String,
    /// Human-readable description for notices and logs.
    pub description: String,
    /// The screening logic to apply.
    pub rule_type: FieldRuleType,
}

/// The kinds of screening checks the validator supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldRuleType {
    /// The field at `field_path` must be present and non-null.
    RequiredField {
        /// Dotted path, e.g. "visit.visit_date".
        field_path: String,
    },

    /// The field at `field_path` must equal one of `allowed`.
    AllowedValues {
        field_path: String,
        allowed: Vec<Value>,
    },

    /// Both paths must hold ISO `YYYY-MM-DD` dates with start ≤ end.
    /// Skipped when either field is absent.
    DatePair {
        start_path: String,
        end_path: String,
    },
}

/// The result of screening one intent payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenReport {
    /// True only if all rules passed.
    pub passed: bool,
    /// All failures collected during this run. Empty on pass.
    pub failures: Vec<ScreenFailure>,
}

/// A single rule failure within a `ScreenReport`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenFailure {
    /// The `rule_id` of the rule that failed, or "json-schema" for
    /// structural failures.
    pub rule_id: String,
    /// Human-readable explanation.
    pub message: String,
}
