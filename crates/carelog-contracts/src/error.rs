//! Error types for the carelog coordination pipeline.
//!
//! All fallible operations in the workspace return `CarelogResult<T>`.
//! Variants carry enough context to render a useful inline notice; the store
//! converts most of them into dismissible notices rather than propagating.

use thiserror::Error;

/// The unified error type for the carelog workspace.
#[derive(Debug, Error)]
pub enum CarelogError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// The backend answered with a non-2xx status.
    #[error("backend returned status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    /// An intent payload failed client-side validation before any network call.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// A backend payload could not be decoded into the expected shape.
    #[error("malformed backend payload: {reason}")]
    Decode { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The change journal could not persist a record.
    ///
    /// This is treated as fatal — a mutation that cannot be journaled must
    /// not stand.
    #[error("journal write failed: {reason}")]
    JournalWriteFailed { reason: String },

    /// An illegal certification-timeline operation (e.g. deleting the only
    /// remaining window).
    #[error("timeline rule violation: {reason}")]
    TimelineRule { reason: String },
}

/// Convenience alias used throughout the carelog crates.
pub type CarelogResult<T> = Result<T, CarelogError>;
