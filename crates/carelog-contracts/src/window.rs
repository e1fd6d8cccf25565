//! Certification window types and progress metrics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::WindowId;

/// Lifecycle status of a certification window.
///
/// At most one window in a patient's timeline is `Active`; the timeline
/// state machine in carelog-domain maintains that invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    Active,
    Expired,
}

/// An insurer-approved date range authorizing therapy visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationWindow {
    pub id: WindowId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub insurance: String,
    pub policy_number: String,
    pub agency: String,
    pub status: WindowStatus,
    /// True for a window added locally after the backend create call failed.
    /// Carries a `local-` identifier until a refetch replaces it.
    #[serde(default)]
    pub provisional: bool,
}

/// Elapsed/remaining metrics for a window at a given date.
///
/// Produced by `carelog_domain::certification::progress`; a pure function of
/// `(start_date, end_date, now)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Rounded percentage of the window elapsed, 0–100.
    pub percentage: u32,
    pub days_remaining: i64,
    pub days_elapsed: i64,
}

/// Urgency band for the days remaining in the active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainingBand {
    Red,
    Amber,
    Green,
}

impl RemainingBand {
    /// Business thresholds: under 12 days is red, under 30 amber, else green.
    pub fn classify(days_remaining: i64) -> RemainingBand {
        if days_remaining < 12 {
            RemainingBand::Red
        } else if days_remaining < 30 {
            RemainingBand::Amber
        } else {
            RemainingBand::Green
        }
    }
}
