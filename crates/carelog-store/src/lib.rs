//! # carelog-store
//!
//! The reconciliation store for a patient page.
//!
//! This crate provides:
//! - The four seam traits (`PracticeGateway`, `ChangeJournal`,
//!   `IntentScreener`, `SyncListener`)
//! - The `PatientStore` that wires them into a fixed dispatch pipeline
//!
//! ## Usage
//!
//! ```rust,ignore
//! use carelog_store::{PatientStore, traits::{PracticeGateway, ChangeJournal}};
//! ```

pub mod store;
pub mod traits;

pub use store::PatientStore;
