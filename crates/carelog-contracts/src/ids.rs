//! Identifier newtypes shared across the workspace.
//!
//! Backend identifiers arrive as opaque strings; the store never parses or
//! orders them. Locally generated identifiers (provisional windows, visits)
//! are UUID-backed.

use serde::{Deserialize, Serialize};

/// Backend identifier for a patient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientId(pub String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Backend identifier for a staff directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StaffId(pub String);

impl StaffId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Identifier for a certification window.
///
/// Windows created through the backend carry its identifier verbatim.
/// Windows added locally after a failed create call carry a provisional
/// `local-<uuid>` identifier until a later refetch replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a provisional local identifier for a window the backend has not
    /// acknowledged.
    pub fn provisional() -> Self {
        Self(format!("local-{}", uuid::Uuid::new_v4()))
    }

    /// True when this identifier was minted locally rather than assigned by
    /// the backend.
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with("local-")
    }
}

/// Identifier for a scheduled visit.
///
/// Backend-assigned ids are kept verbatim; locally minted ones are UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitId(pub String);

impl VisitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh local identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
