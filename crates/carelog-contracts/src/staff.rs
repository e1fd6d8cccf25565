//! Staff directory projections and phone normalization.

use serde::{Deserialize, Serialize};

use crate::ids::StaffId;

/// A read-only projection of a staff directory entry.
///
/// Fetched from the backend and cached by id; never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRef {
    pub id: StaffId,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Role token as the directory reports it: `PT`, `PTA`, `OT`, `COTA`,
    /// `ST`, `STA`, `agency`, …
    pub role: String,
}

/// Strip a phone number down to its raw digits for transmission.
///
/// A leading country code `1` on an 11-digit number is dropped so the wire
/// always carries the 10 local digits.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits[1..].to_string()
    } else {
        digits
    }
}

/// Format a normalized number as `(XXX) XXX-XXXX` for display.
///
/// Anything that is not exactly 10 digits after normalization is returned
/// unchanged — display formatting never destroys data it cannot parse.
pub fn format_phone(raw: &str) -> String {
    let digits = normalize_phone(raw);
    if digits.len() != 10 {
        return raw.to_string();
    }
    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
}
