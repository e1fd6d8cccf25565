//! Change records written to the journal.
//!
//! One `ChangeRecord` per applied mutation. Records are immutable once
//! written; the journal chains them so tampering is detectable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which shared-state slice a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceKind {
    Entitlements,
    Staffing,
    Timeline,
    Schedule,
    Patient,
}

/// An immutable record of one applied mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// The slice the mutation touched.
    pub slice: SliceKind,
    /// The intent discriminant (`Intent::kind()`).
    pub intent_kind: String,
    /// Compact human-readable description of the change.
    pub summary: String,
    /// True exactly when a manual status override contradicted the derived
    /// status at the moment it was applied — the data-quality signal.
    pub override_flag: bool,
    /// Wall-clock time the record was created (UTC).
    pub timestamp: DateTime<Utc>,
}
