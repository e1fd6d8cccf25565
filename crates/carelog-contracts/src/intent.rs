//! Intents, sync events, and dispatch outcomes.
//!
//! Editors never mutate shared state directly: they submit an `Intent` to
//! the store, which validates, persists, applies, journals, and then
//! broadcasts `SyncEvent`s carrying the FULL replacement payload of each
//! touched slice — never a diff. Sibling views overwrite their copy with the
//! broadcast payload, which is the whole consistency contract.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    discipline::{Discipline, SlotKind},
    entitlement::{EntitlementSet, EntitlementStatus},
    ids::{StaffId, WindowId},
    staffing::StaffingSet,
    visit::VisitRef,
    window::CertificationWindow,
};

/// A mutation request submitted by one of the editing views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum Intent {
    /// Medical-info view: the user retyped the approved count. `raw` is the
    /// untouched input text — empty means "cleared".
    SetApproved { discipline: Discipline, raw: String },
    /// Medical-info view: the user retyped the used count.
    SetUsed { discipline: Discipline, raw: String },
    /// Manual status override. Accepted even when it contradicts the
    /// counters; the contradiction is journaled, not rejected.
    OverrideStatus {
        discipline: Discipline,
        status: EntitlementStatus,
    },
    /// Disciplines view: put a therapist in a slot.
    AssignStaff {
        discipline: Discipline,
        slot: SlotKind,
        staff_id: StaffId,
    },
    /// Disciplines view: clear a slot.
    UnassignStaff { discipline: Discipline, slot: SlotKind },
    /// Disciplines view: set the visit frequency text. No-ops silently when
    /// no certification period is in scope.
    SetFrequency {
        discipline: Discipline,
        frequency: String,
    },
    /// Certification view: open a new window. A missing end date defaults to
    /// start + 60 calendar days.
    AddWindow {
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        insurance: String,
        policy_number: String,
        agency: String,
    },
    /// Certification view: make a historical window the active one.
    SelectWindow { window: WindowId },
    /// Certification view: remove a window. Only legal while at least two
    /// windows exist.
    DeleteWindow { window: WindowId },
    /// Generic patient field update; only the changed fields are sent.
    UpdatePatient { fields: Vec<(String, String)> },
    /// Schedule view: persist one new visit.
    ScheduleVisit { visit: VisitRef },
    /// Schedule view broadcast: replace the schedule slice wholesale after
    /// the editor saved through its own endpoints.
    ReplaceSchedule { visits: Vec<VisitRef> },
    /// Refetch the staffing slice from the backend.
    RefreshStaffing,
    /// Refetch the certification timeline from the backend.
    RefreshTimeline,
}

impl Intent {
    /// The stable discriminant used for journaling and validation lookup.
    /// Matches the serde tag spelling.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::SetApproved { .. } => "set-approved",
            Intent::SetUsed { .. } => "set-used",
            Intent::OverrideStatus { .. } => "override-status",
            Intent::AssignStaff { .. } => "assign-staff",
            Intent::UnassignStaff { .. } => "unassign-staff",
            Intent::SetFrequency { .. } => "set-frequency",
            Intent::AddWindow { .. } => "add-window",
            Intent::SelectWindow { .. } => "select-window",
            Intent::DeleteWindow { .. } => "delete-window",
            Intent::UpdatePatient { .. } => "update-patient",
            Intent::ScheduleVisit { .. } => "schedule-visit",
            Intent::ReplaceSchedule { .. } => "replace-schedule",
            Intent::RefreshStaffing => "refresh-staffing",
            Intent::RefreshTimeline => "refresh-timeline",
        }
    }

    /// Compact human-readable descriptor for journal records.
    pub fn summary(&self) -> String {
        match self {
            Intent::SetApproved { discipline, raw } => {
                format!("{}: approved = '{}'", discipline, raw)
            }
            Intent::SetUsed { discipline, raw } => format!("{}: used = '{}'", discipline, raw),
            Intent::OverrideStatus { discipline, status } => {
                format!("{}: status override -> {}", discipline, status)
            }
            Intent::AssignStaff {
                discipline,
                slot,
                staff_id,
            } => format!("{}: assign {:?} -> {}", discipline, slot, staff_id.0),
            Intent::UnassignStaff { discipline, slot } => {
                format!("{}: unassign {:?}", discipline, slot)
            }
            Intent::SetFrequency {
                discipline,
                frequency,
            } => format!("{}: frequency = '{}'", discipline, frequency),
            Intent::AddWindow { start_date, .. } => format!("add window starting {}", start_date),
            Intent::SelectWindow { window } => format!("select window {}", window.0),
            Intent::DeleteWindow { window } => format!("delete window {}", window.0),
            Intent::UpdatePatient { fields } => format!("update patient ({} field(s))", fields.len()),
            Intent::ScheduleVisit { visit } => {
                format!("schedule {} visit on {}", visit.discipline, visit.visit_date)
            }
            Intent::ReplaceSchedule { visits } => {
                format!("replace schedule ({} visit(s))", visits.len())
            }
            Intent::RefreshStaffing => "refresh staffing".to_string(),
            Intent::RefreshTimeline => "refresh timeline".to_string(),
        }
    }
}

/// A broadcast emitted after the store applies an intent.
///
/// Every variant carries the full replacement value of one slice. Listeners
/// overwrite — they never merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "slice", rename_all = "snake_case")]
pub enum SyncEvent {
    EntitlementsReplaced { entitlements: EntitlementSet },
    StaffingReplaced { staffing: StaffingSet },
    TimelineReplaced { windows: Vec<CertificationWindow> },
    ScheduleReplaced { visits: Vec<VisitRef> },
}

/// Severity of an inline notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Warning,
    Error,
}

/// A dismissible inline message surfaced to the user.
///
/// The store accumulates these instead of propagating soft failures; the UI
/// renders them as banners and dismisses by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub severity: NoticeSeverity,
    pub message: String,
}

/// What became of a dispatched intent.
#[derive(Debug)]
pub enum Outcome {
    /// The intent was applied; `events` were broadcast. `warning` is set for
    /// degraded applications (e.g. a provisional window after a failed
    /// backend create).
    Applied {
        events: Vec<SyncEvent>,
        warning: Option<Notice>,
    },
    /// The intent was not applied; a notice explains why. Never an `Err` —
    /// soft failures leave the store fully usable.
    Rejected { notice: Notice },
    /// The intent was a defined no-op in the current state (e.g. setting a
    /// frequency with no certification period in scope).
    Ignored { reason: String },
}
