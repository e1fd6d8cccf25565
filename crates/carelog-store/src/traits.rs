//! Seam trait definitions for the reconciliation store.
//!
//! Four traits bound the store's collaborators:
//!
//! - `PracticeGateway` — the persistence backend (HTTP in production,
//!   in-memory in tests and the demo)
//! - `ChangeJournal`   — the append-only record of applied mutations
//! - `IntentScreener`  — client-side validation run before any network call
//! - `SyncListener`    — sibling views receiving full-payload broadcasts
//!
//! The store wires them together in a fixed order per intent:
//! screen → persist → apply → derive → journal → broadcast.

use chrono::NaiveDate;

use carelog_contracts::{
    change::ChangeRecord,
    entitlement::EntitlementSet,
    error::CarelogResult,
    ids::{PatientId, StaffId, WindowId},
    intent::{Intent, SyncEvent},
    screen::ScreenReport,
    staff::StaffRef,
    staffing::StaffingSet,
    visit::VisitRef,
    window::CertificationWindow,
};

/// The persistence backend the store saves through.
///
/// Implementations are the repository seam: the store always sends full
/// replacement values (never diffs), and an implementation is free to map
/// that onto patch semantics later without touching store logic.
///
/// Every method is a single backend round trip. Implementations must not
/// retry — retry policy belongs to the caller, and the source system has
/// none.
pub trait PracticeGateway: Send + Sync {
    /// `GET /staff/` — the full staff directory. Role filtering happens
    /// client-side.
    fn list_staff(&self) -> CarelogResult<Vec<StaffRef>>;

    /// `GET /patients/{id}` — the entitlement counters embedded in the
    /// patient payload (`approved_pt`, `used_pt`, `status_pt`, …).
    ///
    /// A patient with no stored counters yields the intake defaults.
    fn patient_entitlements(&self, patient: &PatientId) -> CarelogResult<EntitlementSet>;

    /// `GET /patient/{id}/cert-periods`.
    ///
    /// A 404 means "no data yet" and must surface as an empty list, not an
    /// error.
    fn cert_periods(&self, patient: &PatientId) -> CarelogResult<Vec<CertificationWindow>>;

    /// `POST /patients/{id}/certification-period` with `{start_date, end_date}`.
    /// Returns the created window with its backend-assigned id.
    fn create_cert_period(
        &self,
        patient: &PatientId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CarelogResult<CertificationWindow>;

    /// `PUT /cert-periods/{id}` — partial update; only the provided fields
    /// change (e.g. `{"pt_frequency": "3x/week"}` or `{"status": "expired"}`).
    fn update_cert_period(
        &self,
        window: &WindowId,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> CarelogResult<()>;

    /// `DELETE /cert-periods/{id}`.
    fn delete_cert_period(&self, window: &WindowId) -> CarelogResult<()>;

    /// `GET /patient/{id}/assigned-staff?cert_period_id=` — the decoded
    /// staffing slice. Implementations own the wire-key-to-discipline
    /// mapping so no caller ever string-builds `assigned_pt`-style keys.
    fn assigned_staff(
        &self,
        patient: &PatientId,
        cert_period: Option<&WindowId>,
    ) -> CarelogResult<StaffingSet>;

    /// `POST /assign-staff?patient_id=&staff_id=&discipline=`.
    ///
    /// `discipline_token` is the slot token: the bare code for a main slot,
    /// code + `A` for an assistant slot.
    fn assign_staff(
        &self,
        patient: &PatientId,
        staff: &StaffId,
        discipline_token: &str,
    ) -> CarelogResult<()>;

    /// `DELETE /unassign-staff?patient_id=&discipline=` with the same slot
    /// token scheme.
    fn unassign_staff(&self, patient: &PatientId, discipline_token: &str) -> CarelogResult<()>;

    /// `PUT /patients/{id}` — changed fields only, sent as query-string
    /// parameters.
    fn update_patient(&self, patient: &PatientId, fields: &[(String, String)]) -> CarelogResult<()>;

    /// `GET /visits/certperiod/{id}`.
    fn visits_for_period(&self, cert_period: &WindowId) -> CarelogResult<Vec<VisitRef>>;

    /// `POST /visits/assign`. Returns the visit as the backend stored it.
    fn assign_visit(&self, patient: &PatientId, visit: &VisitRef) -> CarelogResult<VisitRef>;
}

/// The append-only journal of applied mutations.
///
/// Every applied intent produces exactly one `ChangeRecord`. A failed
/// append is fatal to the dispatch — an unjournaled mutation must not
/// stand.
pub trait ChangeJournal: Send + Sync {
    /// Append one change record.
    ///
    /// Implementations must treat this as append-only; records are never
    /// modified or deleted.
    fn append(&self, record: &ChangeRecord) -> CarelogResult<()>;
}

/// Client-side intent validation, run before any network call.
pub trait IntentScreener: Send + Sync {
    /// Screen the intent. A failing report rejects the intent with a
    /// notice; the gateway is never called.
    fn screen(&self, intent: &Intent) -> CarelogResult<ScreenReport>;
}

/// A sibling view subscribed to slice broadcasts.
///
/// Events carry the FULL replacement payload of the touched slice.
/// Listeners overwrite their copy; they never merge.
pub trait SyncListener: Send + Sync {
    fn on_sync(&self, event: &SyncEvent);
}
