//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. patient_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. canonical JSON of record (serde_json with no pretty-printing)

use sha2::{Digest, Sha256};

use carelog_contracts::change::ChangeRecord;

use crate::entry::JournalEntry;

/// Compute the SHA-256 hash for a single journal entry.
///
/// The hash commits to every field that uniquely identifies an entry:
/// its position in the chain (`sequence`), the patient it belongs to
/// (`patient_id`), its link to the previous entry (`prev_hash`), and the
/// full change record (`record`).
///
/// Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `record` cannot be serialized to JSON — which cannot happen
/// for the well-formed `ChangeRecord` type.
pub fn hash_entry(
    patient_id: &str,
    sequence: u64,
    record: &ChangeRecord,
    prev_hash: &str,
) -> String {
    let record_json =
        serde_json::to_vec(record).expect("ChangeRecord must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(patient_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    hex::encode(hasher.finalize())
}

/// Verify the integrity of a journal chain.
///
/// Returns `true` when the chain is valid according to both rules:
///
/// 1. **Prev-hash linkage** — each entry's `prev_hash` equals the
///    `this_hash` of the preceding entry (or `GENESIS_HASH` for entry 0).
/// 2. **Hash correctness** — each entry's `this_hash` matches the value
///    recomputed from its own fields.
///
/// Returns `false` the moment any mismatch is detected.  An empty chain
/// is defined as valid.
pub fn verify_chain(entries: &[JournalEntry]) -> bool {
    let mut expected_prev = JournalEntry::GENESIS_HASH.to_string();

    for entry in entries {
        if entry.prev_hash != expected_prev {
            return false;
        }

        let recomputed = hash_entry(
            &entry.patient_id,
            entry.sequence,
            &entry.record,
            &entry.prev_hash,
        );
        if entry.this_hash != recomputed {
            return false;
        }

        expected_prev = entry.this_hash.clone();
    }

    true
}
