//! The entitlement ledger: the standard mutation path for visit counters.
//!
//! All counter edits flow through `EntitlementLedger`, which re-derives the
//! status after every change. The one escape hatch is `override_status`,
//! which writes the status directly and reports whether it contradicts the
//! counters — the caller journals that contradiction as a data-quality
//! signal rather than rejecting it.

use tracing::{debug, warn};

use carelog_contracts::{
    discipline::Discipline,
    entitlement::{CountField, EntitlementRecord, EntitlementSet, EntitlementStatus},
};

/// Owns the entitlement slice and enforces status re-derivation on the
/// standard mutation path.
#[derive(Debug, Clone, Default)]
pub struct EntitlementLedger {
    records: EntitlementSet,
}

impl EntitlementLedger {
    /// A fresh ledger with every discipline at the intake defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a set fetched from the backend. Statuses are taken verbatim —
    /// a stored manual override must survive a refetch.
    pub fn from_set(records: EntitlementSet) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &EntitlementSet {
        &self.records
    }

    pub fn record(&self, discipline: Discipline) -> &EntitlementRecord {
        self.records.record(discipline)
    }

    /// Clone the slice for a full-replacement broadcast.
    pub fn snapshot(&self) -> EntitlementSet {
        self.records.clone()
    }

    /// Apply raw user input to the approved counter and re-derive status.
    pub fn set_approved(&mut self, discipline: Discipline, raw: &str) -> &EntitlementRecord {
        let record = self.records.record_mut(discipline);
        record.approved = CountField::parse(raw);
        record.status = record.derived_status();
        debug!(
            discipline = %discipline,
            approved = record.approved.effective(),
            status = %record.status,
            "approved count updated"
        );
        self.records.record(discipline)
    }

    /// Apply raw user input to the used counter and re-derive status.
    ///
    /// No cap against `approved` is enforced here — the source only caps the
    /// rendered input, never the state.
    pub fn set_used(&mut self, discipline: Discipline, raw: &str) -> &EntitlementRecord {
        let record = self.records.record_mut(discipline);
        record.used = CountField::parse(raw);
        record.status = record.derived_status();
        debug!(
            discipline = %discipline,
            used = record.used.effective(),
            status = %record.status,
            "used count updated"
        );
        self.records.record(discipline)
    }

    /// Write the status directly, bypassing derivation.
    ///
    /// Returns true when the override contradicts what the counters imply.
    /// The contradiction is logged and reported, never blocked.
    pub fn override_status(&mut self, discipline: Discipline, status: EntitlementStatus) -> bool {
        let record = self.records.record_mut(discipline);
        let derived = record.derived_status();
        let contradicts = status != derived;
        record.status = status;

        if contradicts {
            warn!(
                discipline = %discipline,
                manual = %status,
                derived = %derived,
                approved = record.approved.effective(),
                used = record.used.effective(),
                "manual status override contradicts counters"
            );
        }
        contradicts
    }

    /// Reset one discipline back to the intake defaults. Records are reset,
    /// never deleted.
    pub fn reset(&mut self, discipline: Discipline) {
        *self.records.record_mut(discipline) = EntitlementRecord::default();
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
