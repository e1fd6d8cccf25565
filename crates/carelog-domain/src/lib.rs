//! # carelog-domain
//!
//! Pure domain logic for the carelog practice-coordination core:
//!
//! - [`entitlement::EntitlementLedger`] — the standard mutation path for
//!   approved/used visit counters with central status derivation
//! - [`certification::CertificationTimeline`] — the certification window
//!   state machine (single-active invariant, latest-end-date promotion)
//! - [`certification::progress`] — pure elapsed/remaining window metrics
//! - [`staffing`] — directory role filters for slot candidates
//!
//! Nothing here performs I/O; persistence and broadcast live in
//! carelog-store.

pub mod certification;
pub mod entitlement;
pub mod staffing;

pub use certification::{default_end_date, progress, CertificationTimeline};
pub use entitlement::EntitlementLedger;
