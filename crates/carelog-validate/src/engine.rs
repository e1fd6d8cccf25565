//! Schema-based intent screener.
//!
//! `IntentValidator` implements the `IntentScreener` trait from
//! `carelog-store`.  Screening runs in two phases:
//!
//! 1. **Structural** — the intent payload is validated against the
//!    `IntentSchema::json_schema` document using the `jsonschema` crate.
//! 2. **Field rules** — each `FieldRule` in `IntentSchema::rules` is
//!    evaluated in order.  All failures are collected before returning so
//!    the user sees the full failure set in one notice.
//!
//! Intent kinds with no registered schema pass trivially — screening only
//! guards the payloads that carry user-entered fields.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use carelog_contracts::{
    error::{CarelogError, CarelogResult},
    intent::Intent,
    screen::{FieldRuleType, IntentSchema, ScreenFailure, ScreenReport},
};
use carelog_store::traits::IntentScreener;

/// The carelog intent screener.
///
/// Holds one `IntentSchema` per intent kind.  Register additional schemas
/// at startup; screening an unregistered kind always passes.
pub struct IntentValidator {
    schemas: HashMap<String, IntentSchema>,
}

impl IntentValidator {
    /// Create a validator with no schemas registered.
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Register a schema under an intent kind. Registering the same kind
    /// twice replaces the previous schema.
    pub fn register(&mut self, kind: impl Into<String>, schema: IntentSchema) {
        self.schemas.insert(kind.into(), schema);
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Resolve a dot-notation field path (e.g. `"visit.visit_date"`) against
    /// a JSON value.  Returns `None` when any segment is missing or the
    /// value is JSON `null`.
    fn resolve_path<'v>(value: &'v serde_json::Value, path: &str) -> Option<&'v serde_json::Value> {
        let mut current = value;
        for segment in path.split('.') {
            match current.get(segment) {
                Some(v) if !v.is_null() => current = v,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Parse a JSON value as an ISO `YYYY-MM-DD` date.
    fn as_date(value: &serde_json::Value) -> Option<NaiveDate> {
        value.as_str().and_then(|s| s.parse::<NaiveDate>().ok())
    }
}

impl Default for IntentValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentScreener for IntentValidator {
    /// Screen the intent payload against its registered schema.
    ///
    /// Runs structural JSON Schema validation first, then evaluates every
    /// field rule.  All failures are accumulated — the notice carries the
    /// full picture rather than only the first failure.
    fn screen(&self, intent: &Intent) -> CarelogResult<ScreenReport> {
        let kind = intent.kind();
        let Some(schema) = self.schemas.get(kind) else {
            return Ok(ScreenReport {
                passed: true,
                failures: vec![],
            });
        };

        let encoded = serde_json::to_value(intent).map_err(|e| CarelogError::Validation {
            reason: format!("intent could not be encoded for screening: {}", e),
        })?;
        let payload = encoded
            .get("payload")
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        let mut failures: Vec<ScreenFailure> = Vec::new();

        // ── Phase 1: JSON Schema structural validation ────────────────────────
        //
        // A null json_schema means "no structural constraint" — skip.
        if !schema.json_schema.is_null() {
            match jsonschema::validator_for(&schema.json_schema) {
                Ok(validator) => {
                    for error in validator.iter_errors(&payload) {
                        let message = format!(
                            "JSON Schema violation at {}: {}",
                            error.instance_path, error
                        );
                        warn!(schema_id = %schema.schema_id, %message, "structural screening failure");
                        failures.push(ScreenFailure {
                            rule_id: "json-schema".to_string(),
                            message,
                        });
                    }
                }
                Err(e) => {
                    // A malformed schema document is a configuration problem;
                    // surface it as a single structural failure so the intent
                    // is rejected loudly instead of passing unchecked.
                    let message = format!("invalid JSON Schema document: {e}");
                    warn!(schema_id = %schema.schema_id, %message, "schema compilation failure");
                    failures.push(ScreenFailure {
                        rule_id: "json-schema".to_string(),
                        message,
                    });
                }
            }
        }

        // ── Phase 2: Field rule evaluation ───────────────────────────────────
        for rule in &schema.rules {
            debug!(
                rule_id = %rule.rule_id,
                description = %rule.description,
                "evaluating screening rule"
            );

            let failure_msg: Option<String> = match &rule.rule_type {
                // The field must be present at the resolved path and non-null.
                FieldRuleType::RequiredField { field_path } => {
                    if Self::resolve_path(&payload, field_path).is_none() {
                        Some(format!("required field '{field_path}' is missing or null"))
                    } else {
                        None
                    }
                }

                // The field value must appear in the exhaustive allowed set.
                FieldRuleType::AllowedValues { field_path, allowed } => {
                    match Self::resolve_path(&payload, field_path) {
                        None => Some(format!(
                            "field '{field_path}' is missing; cannot check allowed values"
                        )),
                        Some(actual) => {
                            if allowed.contains(actual) {
                                None
                            } else {
                                Some(format!(
                                    "field '{field_path}' has value {actual} which is not in the allowed set"
                                ))
                            }
                        }
                    }
                }

                // Both fields, when present, must parse as dates with
                // start ≤ end. An absent field skips the rule — optional end
                // dates are filled by the default-end-date rule downstream.
                FieldRuleType::DatePair {
                    start_path,
                    end_path,
                } => {
                    let start = Self::resolve_path(&payload, start_path);
                    let end = Self::resolve_path(&payload, end_path);
                    match (start, end) {
                        (Some(s), Some(e)) => {
                            match (Self::as_date(s), Self::as_date(e)) {
                                (Some(start), Some(end)) => {
                                    if start > end {
                                        Some(format!(
                                            "'{start_path}' ({start}) is after '{end_path}' ({end})"
                                        ))
                                    } else {
                                        None
                                    }
                                }
                                _ => Some(format!(
                                    "'{start_path}'/'{end_path}' must be ISO YYYY-MM-DD dates"
                                )),
                            }
                        }
                        _ => None,
                    }
                }
            };

            if let Some(message) = failure_msg {
                warn!(rule_id = %rule.rule_id, %message, "screening rule failed");
                failures.push(ScreenFailure {
                    rule_id: rule.rule_id.clone(),
                    message,
                });
            }
        }

        let passed = failures.is_empty();
        debug!(
            schema_id = %schema.schema_id,
            passed,
            failure_count = failures.len(),
            "screening complete"
        );

        Ok(ScreenReport { passed, failures })
    }
}
