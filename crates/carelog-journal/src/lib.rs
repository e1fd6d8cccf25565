//! # carelog-journal
//!
//! Immutable, append-only, SHA-256 hash-chained journal of applied patient
//! mutations.
//!
//! ## Overview
//!
//! Every mutation the store applies is wrapped in a `JournalEntry` that
//! links to the previous entry via its SHA-256 hash.  Tampering with any
//! entry — even a single byte — breaks the chain and is detected by
//! `verify_chain`.  Entries whose `override_flag` is set form the
//! data-quality review queue for manual status overrides.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use carelog_journal::InMemoryJournal;
//! use carelog_store::traits::ChangeJournal;
//!
//! let journal = InMemoryJournal::new("patient-7");
//! journal.append(&change_record)?;
//!
//! assert!(journal.verify_integrity());
//! let export = journal.export();
//! ```

pub mod chain;
pub mod entry;
pub mod memory;

pub use chain::{hash_entry, verify_chain};
pub use entry::{JournalEntry, JournalExport};
pub use memory::InMemoryJournal;

// ── Tests ─────────────────────────────────────────────────────────────────────
