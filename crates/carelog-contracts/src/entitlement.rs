//! Visit entitlement records: approved/used counters and derived status.
//!
//! An `EntitlementRecord` tracks how many visits a payer authorized for one
//! discipline and how many have been consumed. `status` is derived from the
//! counters through the standard mutation path, but a manual override is
//! permitted and is never re-validated — the store journals such overrides
//! as a data-quality signal instead of rejecting them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::discipline::Discipline;

/// A visit counter as the user last left it.
///
/// `Blank` models the transient cleared-input state: the user deleted the
/// number and has not typed a new one yet. Derivations treat `Blank` as 0,
/// but the blank is preserved so the field does not snap back to `0` under
/// the user's cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountField {
    Blank,
    Value(u32),
}

impl CountField {
    /// Parse raw user input.
    ///
    /// The empty string stays `Blank`; anything unparsable silently becomes
    /// 0, matching the `parseInt(x) || 0` fallback the rest of the system
    /// assumes.
    pub fn parse(raw: &str) -> CountField {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CountField::Blank;
        }
        CountField::Value(trimmed.parse::<u32>().unwrap_or(0))
    }

    /// The value derivations see: `Blank` counts as 0.
    pub fn effective(&self) -> u32 {
        match self {
            CountField::Blank => 0,
            CountField::Value(n) => *n,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CountField::Blank)
    }
}

impl Default for CountField {
    fn default() -> Self {
        CountField::Value(0)
    }
}

/// Per-discipline entitlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementStatus {
    /// No visits authorized yet.
    Waiting,
    /// Authorized visits remain.
    Active,
    /// Every authorized visit has been consumed.
    NoMore,
}

impl std::fmt::Display for EntitlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntitlementStatus::Waiting => "waiting",
            EntitlementStatus::Active => "active",
            EntitlementStatus::NoMore => "no_more",
        };
        f.write_str(s)
    }
}

/// Approved/used visit counters for one discipline, plus the derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    /// Visits authorized by the payer.
    pub approved: CountField,
    /// Visits consumed so far. May exceed `approved` — the source only hints
    /// at the cap through the rendered input's `max`, never in state.
    pub used: CountField,
    /// Current status. Derived on the standard mutation path; a manual
    /// override writes here directly.
    pub status: EntitlementStatus,
}

impl Default for EntitlementRecord {
    fn default() -> Self {
        Self {
            approved: CountField::Value(0),
            used: CountField::Value(0),
            status: EntitlementStatus::Waiting,
        }
    }
}

impl EntitlementRecord {
    /// The status the counters imply.
    ///
    /// `Waiting` while nothing is approved; `NoMore` once usage reaches the
    /// approval; `Active` otherwise.
    pub fn derived_status(&self) -> EntitlementStatus {
        let approved = self.approved.effective();
        let used = self.used.effective();
        if approved == 0 {
            EntitlementStatus::Waiting
        } else if used >= approved {
            EntitlementStatus::NoMore
        } else {
            EntitlementStatus::Active
        }
    }

    /// Authorized visits not yet consumed, floored at zero.
    pub fn remaining(&self) -> u32 {
        self.approved.effective().saturating_sub(self.used.effective())
    }

    /// Consumption ratio, 0.0 when nothing is approved. Unclamped — usage
    /// past the approval reports over 1.0.
    pub fn utilization(&self) -> f64 {
        let approved = self.approved.effective();
        if approved == 0 {
            0.0
        } else {
            f64::from(self.used.effective()) / f64::from(approved)
        }
    }

    /// Display percentage, clamped to [0, 100].
    pub fn utilization_percent(&self) -> u32 {
        ((self.utilization() * 100.0).round() as u32).min(100)
    }
}

/// The full entitlement slice: one record per discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementSet {
    pub records: BTreeMap<Discipline, EntitlementRecord>,
}

impl Default for EntitlementSet {
    /// Seed every discipline with the intake defaults
    /// `{approved: 0, used: 0, status: waiting}`.
    fn default() -> Self {
        let records = Discipline::ALL
            .iter()
            .map(|d| (*d, EntitlementRecord::default()))
            .collect();
        Self { records }
    }
}

impl EntitlementSet {
    pub fn record(&self, discipline: Discipline) -> &EntitlementRecord {
        // Every discipline is seeded at construction; absence is a logic bug.
        &self.records[&discipline]
    }

    pub fn record_mut(&mut self, discipline: Discipline) -> &mut EntitlementRecord {
        self.records.entry(discipline).or_default()
    }
}
