//! In-memory implementation of `ChangeJournal`.
//!
//! `InMemoryJournal` is the reference implementation of the store's
//! `ChangeJournal` seam.  It keeps all entries in a `Vec` protected by a
//! `Mutex`, making it safe to share between the store and review tooling.
//!
//! Use `export()` to obtain a sealed `JournalExport`, `verify_integrity()`
//! to confirm the chain has not been tampered with in memory, and
//! `flagged_overrides()` to pull the data-quality signals out for review.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;

use carelog_contracts::{
    change::ChangeRecord,
    error::{CarelogError, CarelogResult},
};
use carelog_store::traits::ChangeJournal;

use crate::{
    chain::{hash_entry, verify_chain},
    entry::{JournalEntry, JournalExport},
};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryJournal`.
pub(crate) struct JournalState {
    /// All entries written so far, in append order.
    pub(crate) entries: Vec<JournalEntry>,

    /// The next sequence number to assign (starts at 0).
    pub(crate) sequence: u64,

    /// The `this_hash` of the last written entry, or `GENESIS_HASH` before
    /// any entry has been written.
    pub(crate) last_hash: String,
}

// ── Public journal ────────────────────────────────────────────────────────────

/// An in-memory, append-only change journal backed by a SHA-256 hash chain.
///
/// # Thread safety
///
/// `append()` acquires a `Mutex` internally.  Multiple threads may hold
/// clones of the journal without additional synchronization.
#[derive(Clone)]
pub struct InMemoryJournal {
    patient_id: String,
    pub(crate) state: Arc<Mutex<JournalState>>,
}

impl InMemoryJournal {
    /// Create a new journal for the given patient.
    ///
    /// The internal `last_hash` is initialized to `JournalEntry::GENESIS_HASH`
    /// so the first entry's `prev_hash` is automatically correct.
    pub fn new(patient_id: impl Into<String>) -> Self {
        let state = JournalState {
            entries: Vec::new(),
            sequence: 0,
            last_hash: JournalEntry::GENESIS_HASH.to_string(),
        };
        Self {
            patient_id: patient_id.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Export a sealed snapshot containing all entries written so far.
    ///
    /// The `terminal_hash` is the `this_hash` of the last entry, or an empty
    /// string when no entries have been written.
    pub fn export(&self) -> JournalExport {
        let state = self.state.lock().expect("journal state lock poisoned");
        let terminal_hash = state
            .entries
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        JournalExport {
            patient_id: self.patient_id.clone(),
            entries: state.entries.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Verify that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        let state = self.state.lock().expect("journal state lock poisoned");
        verify_chain(&state.entries)
    }

    /// All records whose manual status override contradicted the derived
    /// status — the data-quality review queue.
    pub fn flagged_overrides(&self) -> Vec<ChangeRecord> {
        let state = self.state.lock().expect("journal state lock poisoned");
        state
            .entries
            .iter()
            .filter(|e| e.record.override_flag)
            .map(|e| e.record.clone())
            .collect()
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.state.lock().expect("journal state lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Log a summary line for the journal; used when a page closes.
    pub fn seal(&self) {
        let state = self.state.lock().expect("journal state lock poisoned");
        info!(
            patient_id = %self.patient_id,
            entry_count = state.entries.len(),
            terminal_hash = %state.last_hash,
            "change journal sealed"
        );
    }
}

// ── ChangeJournal impl ────────────────────────────────────────────────────────

impl ChangeJournal for InMemoryJournal {
    /// Append one change record to the hash chain.
    ///
    /// Computes `this_hash` from (patient_id, sequence, prev_hash, record),
    /// wraps the record in a `JournalEntry`, appends it, then advances the
    /// sequence counter and `last_hash`.
    ///
    /// Returns `Err(JournalWriteFailed)` only if the internal mutex is
    /// poisoned, which cannot happen under normal operation.
    fn append(&self, record: &ChangeRecord) -> CarelogResult<()> {
        let mut state = self.state.lock().map_err(|e| CarelogError::JournalWriteFailed {
            reason: format!("journal state lock poisoned: {}", e),
        })?;

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;

        let this_hash = hash_entry(&self.patient_id, sequence, record, &prev_hash);

        let entry = JournalEntry {
            sequence,
            patient_id: self.patient_id.clone(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        };

        state.entries.push(entry);
        state.sequence += 1;
        state.last_hash = this_hash;

        Ok(())
    }
}
