//! # carelog-validate
//!
//! Client-side intent screening for the carelog store.
//!
//! Combines JSON Schema structural validation with field rules
//! (`RequiredField`, `AllowedValues`, `DatePair`) evaluated against intent
//! payloads before any network call.  A failing report rejects the intent
//! with a single notice carrying every failure.

pub mod engine;
pub mod schemas;

pub use engine::IntentValidator;
pub use schemas::default_validator;

// ── Tests ─────────────────────────────────────────────────────────────────────
