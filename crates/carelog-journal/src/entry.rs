//! Journal entry and export types.
//!
//! `JournalEntry` is a single link in the hash chain — it wraps a
//! `ChangeRecord` with sequence numbering and the SHA-256 hashes that make
//! tampering detectable.  `JournalExport` is the sealed view produced on
//! demand for review tooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carelog_contracts::change::ChangeRecord;

/// A single entry in the SHA-256 hash chain for one patient.
///
/// Each entry commits to the previous entry via `prev_hash`, forming an
/// append-only chain.  Modifying any field — including those of the embedded
/// `record` — invalidates `this_hash` and every subsequent `prev_hash`,
/// which `verify_chain` detects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Monotonically increasing position in the chain, starting at 0.
    pub sequence: u64,

    /// The patient whose state this entry changed.
    pub patient_id: String,

    /// The immutable change record produced by the store.
    pub record: ChangeRecord,

    /// SHA-256 hash (hex) of the previous entry, or `GENESIS_HASH` for the
    /// first entry.
    pub prev_hash: String,

    /// SHA-256 hash (hex) of this entry's canonical content.
    pub this_hash: String,
}

impl JournalEntry {
    /// The sentinel `prev_hash` used for the first entry in every chain.
    ///
    /// 64 hex zeros — a value that can never be the SHA-256 of real data,
    /// making genesis detection unambiguous.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A sealed snapshot of one patient's journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalExport {
    /// The patient whose mutations are recorded here.
    pub patient_id: String,

    /// All entries in chain order (sequence 0 first).
    pub entries: Vec<JournalEntry>,

    /// Wall-clock time (UTC) the snapshot was taken.
    pub exported_at: DateTime<Utc>,

    /// The `this_hash` of the last entry.  Empty string if the journal is
    /// empty.
    pub terminal_hash: String,
}
