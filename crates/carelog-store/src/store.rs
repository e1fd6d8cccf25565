//! The patient-page reconciliation store.
//!
//! One `PatientStore` per open patient page. It owns the shared slices the
//! three editing views used to prop-drill (`entitlements`, `staffing`,
//! `timeline`, `schedule`), and runs every mutation through a fixed
//! pipeline:
//!
//!   Intent → Screen → Persist → Apply → Derive → Journal → Broadcast
//!
//! Soft failures (transport, non-2xx, screening) become dismissible
//! `Notice`s and an `Outcome` variant — `dispatch` only returns `Err` when
//! the journal cannot record an applied mutation.
//!
//! Refetching slices carry a monotonic request ticket; a response is applied
//! only when its ticket is the latest issued for that slice. That turns the
//! source's "last response wins" race into "last request wins".

use chrono::Utc;
use tracing::{debug, info, warn};

use carelog_contracts::{
    change::{ChangeRecord, SliceKind},
    discipline::{Discipline, SlotKind},
    entitlement::{CountField, EntitlementSet, EntitlementStatus},
    error::CarelogResult,
    ids::{PatientId, StaffId, WindowId},
    intent::{Intent, Notice, NoticeSeverity, Outcome, SyncEvent},
    staff::normalize_phone,
    staffing::StaffingSet,
    visit::VisitRef,
    window::{CertificationWindow, WindowStatus},
};
use carelog_domain::{certification::default_end_date, CertificationTimeline, EntitlementLedger};

use crate::traits::{ChangeJournal, IntentScreener, PracticeGateway, SyncListener};

/// Which entitlement counter a SetApproved/SetUsed intent targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CounterKind {
    Approved,
    Used,
}

impl CounterKind {
    /// Wire prefix for the patient-update field key.
    fn wire_prefix(&self) -> &'static str {
        match self {
            CounterKind::Approved => "approved",
            CounterKind::Used => "used",
        }
    }
}

/// Latest-issued request tickets, one per refetching slice.
#[derive(Debug, Default)]
struct SliceTickets {
    staffing: u64,
    timeline: u64,
    schedule: u64,
}

/// The shared-state store for one patient page.
pub struct PatientStore {
    patient_id: PatientId,
    ledger: EntitlementLedger,
    staffing: StaffingSet,
    timeline: CertificationTimeline,
    schedule: Vec<VisitRef>,
    notices: Vec<Notice>,
    next_notice_id: u64,
    tickets: SliceTickets,
    gateway: Box<dyn PracticeGateway>,
    journal: Box<dyn ChangeJournal>,
    screener: Box<dyn IntentScreener>,
    listeners: Vec<Box<dyn SyncListener>>,
}

impl PatientStore {
    /// Create an empty store for the given patient. Call [`hydrate`] to pull
    /// the initial slices from the backend.
    ///
    /// [`hydrate`]: PatientStore::hydrate
    pub fn new(
        patient_id: PatientId,
        gateway: Box<dyn PracticeGateway>,
        journal: Box<dyn ChangeJournal>,
        screener: Box<dyn IntentScreener>,
    ) -> Self {
        Self {
            patient_id,
            ledger: EntitlementLedger::new(),
            staffing: StaffingSet::default(),
            timeline: CertificationTimeline::new(),
            schedule: Vec::new(),
            notices: Vec::new(),
            next_notice_id: 0,
            tickets: SliceTickets::default(),
            gateway,
            journal,
            screener,
            listeners: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn patient_id(&self) -> &PatientId {
        &self.patient_id
    }

    pub fn entitlements(&self) -> &EntitlementSet {
        self.ledger.records()
    }

    pub fn staffing(&self) -> &StaffingSet {
        &self.staffing
    }

    pub fn timeline(&self) -> &CertificationTimeline {
        &self.timeline
    }

    pub fn schedule(&self) -> &[VisitRef] {
        &self.schedule
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Register a sibling view for slice broadcasts.
    pub fn subscribe(&mut self, listener: Box<dyn SyncListener>) {
        self.listeners.push(listener);
    }

    /// Dismiss a notice by id. Returns false when the id is unknown.
    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    // ── Initial load ──────────────────────────────────────────────────────────

    /// Fetch every slice from the backend.
    ///
    /// Per-slice failures become notices rather than aborting the page —
    /// the one exception the gateway already absorbs is a 404 on the
    /// certification-period fetch, which arrives here as an empty list.
    pub fn hydrate(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();

        match self.gateway.patient_entitlements(&self.patient_id) {
            Ok(set) => {
                // Stored statuses are adopted verbatim — a manual override
                // must survive a refetch.
                self.ledger = EntitlementLedger::from_set(set);
                events.push(SyncEvent::EntitlementsReplaced {
                    entitlements: self.ledger.snapshot(),
                });
            }
            Err(e) => {
                warn!(error = %e, "entitlement fetch failed");
                self.push_notice(NoticeSeverity::Error, e.to_string());
            }
        }

        let ticket = self.begin_timeline_refetch();
        match self.gateway.cert_periods(&self.patient_id) {
            Ok(windows) => {
                if self.apply_timeline(ticket, windows) {
                    events.push(SyncEvent::TimelineReplaced {
                        windows: self.timeline.snapshot(),
                    });
                }
            }
            Err(e) => {
                warn!(error = %e, "certification period fetch failed");
                self.push_notice(NoticeSeverity::Error, e.to_string());
            }
        }

        let ticket = self.begin_staffing_refetch();
        let scope = self.timeline.active_id();
        match self.gateway.assigned_staff(&self.patient_id, scope.as_ref()) {
            Ok(staffing) => {
                if self.apply_staffing(ticket, staffing) {
                    events.push(SyncEvent::StaffingReplaced {
                        staffing: self.staffing.clone(),
                    });
                }
            }
            Err(e) => {
                warn!(error = %e, "assigned staff fetch failed");
                self.push_notice(NoticeSeverity::Error, e.to_string());
            }
        }

        if let Some(window) = self.timeline.active_id() {
            let ticket = self.begin_schedule_refetch();
            match self.gateway.visits_for_period(&window) {
                Ok(visits) => {
                    if self.apply_schedule(ticket, visits) {
                        events.push(SyncEvent::ScheduleReplaced {
                            visits: self.schedule.clone(),
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, "visit fetch failed");
                    self.push_notice(NoticeSeverity::Error, e.to_string());
                }
            }
        }

        self.broadcast(&events);
        events
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Run one intent through the pipeline.
    ///
    /// # Errors
    ///
    /// Only a journal write failure returns `Err`. Screening and gateway
    /// failures are valid `Outcome` variants, with a notice recorded on the
    /// store.
    pub fn dispatch(&mut self, intent: Intent) -> CarelogResult<Outcome> {
        debug!(
            patient = %self.patient_id.0,
            kind = intent.kind(),
            "dispatching intent"
        );

        // ── Screen: client-side validation before any network call ──────────
        let report = self.screener.screen(&intent)?;
        if !report.passed {
            let reasons = report
                .failures
                .iter()
                .map(|f| format!("[{}] {}", f.rule_id, f.message))
                .collect::<Vec<_>>()
                .join("; ");
            warn!(kind = intent.kind(), %reasons, "intent rejected by screening");
            let notice = self.push_notice(NoticeSeverity::Error, reasons);
            return Ok(Outcome::Rejected { notice });
        }

        let kind = intent.kind();
        let summary = intent.summary();

        match intent {
            Intent::SetApproved { discipline, raw } => {
                self.set_count(discipline, CounterKind::Approved, &raw, kind, summary)
            }
            Intent::SetUsed { discipline, raw } => {
                self.set_count(discipline, CounterKind::Used, &raw, kind, summary)
            }
            Intent::OverrideStatus { discipline, status } => {
                self.override_status(discipline, status, kind, summary)
            }
            Intent::AssignStaff {
                discipline,
                slot,
                staff_id,
            } => self.assign_staff(discipline, slot, staff_id, kind, summary),
            Intent::UnassignStaff { discipline, slot } => {
                self.unassign_staff(discipline, slot, kind, summary)
            }
            Intent::SetFrequency {
                discipline,
                frequency,
            } => self.set_frequency(discipline, frequency, kind, summary),
            Intent::AddWindow {
                start_date,
                end_date,
                insurance,
                policy_number,
                agency,
            } => self.add_window(start_date, end_date, insurance, policy_number, agency, kind, summary),
            Intent::SelectWindow { window } => self.select_window(window, kind, summary),
            Intent::DeleteWindow { window } => self.delete_window(window, kind, summary),
            Intent::UpdatePatient { fields } => self.update_patient(fields, kind, summary),
            Intent::ScheduleVisit { visit } => self.schedule_visit(visit, kind, summary),
            Intent::ReplaceSchedule { visits } => self.replace_schedule(visits, kind, summary),
            Intent::RefreshStaffing => self.refresh_staffing(),
            Intent::RefreshTimeline => self.refresh_timeline(),
        }
    }

    // ── Entitlement arms ──────────────────────────────────────────────────────

    /// Shared path for SetApproved/SetUsed: persist the effective value,
    /// then apply the raw input and re-derive status.
    fn set_count(
        &mut self,
        discipline: Discipline,
        counter: CounterKind,
        raw: &str,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        let field = format!(
            "{}_{}",
            counter.wire_prefix(),
            discipline.code().to_lowercase()
        );
        // A blank input persists as 0; the blank itself is UI state only.
        let value = CountField::parse(raw).effective().to_string();

        if let Err(e) = self
            .gateway
            .update_patient(&self.patient_id, &[(field, value)])
        {
            warn!(error = %e, discipline = %discipline, counter = counter.wire_prefix(), "count update failed");
            let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
            return Ok(Outcome::Rejected { notice });
        }

        match counter {
            CounterKind::Approved => self.ledger.set_approved(discipline, raw),
            CounterKind::Used => self.ledger.set_used(discipline, raw),
        };

        self.journal_change(SliceKind::Entitlements, kind, summary, false)?;
        let events = vec![SyncEvent::EntitlementsReplaced {
            entitlements: self.ledger.snapshot(),
        }];
        self.broadcast(&events);
        Ok(Outcome::Applied {
            events,
            warning: None,
        })
    }

    fn override_status(
        &mut self,
        discipline: Discipline,
        status: EntitlementStatus,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        let field = format!("status_{}", discipline.code().to_lowercase());
        if let Err(e) = self
            .gateway
            .update_patient(&self.patient_id, &[(field, status.to_string())])
        {
            warn!(error = %e, discipline = %discipline, "status override persist failed");
            let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
            return Ok(Outcome::Rejected { notice });
        }

        // The override is applied as given; a contradiction with the
        // counters is journaled as a data-quality signal, never blocked.
        let contradicts = self.ledger.override_status(discipline, status);
        self.journal_change(SliceKind::Entitlements, kind, summary, contradicts)?;

        let events = vec![SyncEvent::EntitlementsReplaced {
            entitlements: self.ledger.snapshot(),
        }];
        self.broadcast(&events);
        Ok(Outcome::Applied {
            events,
            warning: None,
        })
    }

    // ── Staffing arms ─────────────────────────────────────────────────────────

    fn assign_staff(
        &mut self,
        discipline: Discipline,
        slot: SlotKind,
        staff_id: StaffId,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        let token = discipline.slot_token(slot);
        if let Err(e) = self
            .gateway
            .assign_staff(&self.patient_id, &staff_id, &token)
        {
            warn!(error = %e, %token, "staff assignment failed");
            let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
            return Ok(Outcome::Rejected { notice });
        }

        self.journal_change(SliceKind::Staffing, kind, summary, false)?;
        self.refetch_staffing_after_mutation()
    }

    fn unassign_staff(
        &mut self,
        discipline: Discipline,
        slot: SlotKind,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        let token = discipline.slot_token(slot);
        if let Err(e) = self.gateway.unassign_staff(&self.patient_id, &token) {
            warn!(error = %e, %token, "staff unassignment failed");
            let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
            return Ok(Outcome::Rejected { notice });
        }

        self.journal_change(SliceKind::Staffing, kind, summary, false)?;
        self.refetch_staffing_after_mutation()
    }

    fn set_frequency(
        &mut self,
        discipline: Discipline,
        frequency: String,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        // Frequency lives on the certification period; without one in scope
        // there is nothing to write to. Defined no-op, not an error.
        let Some(window) = self.timeline.active_id() else {
            debug!(discipline = %discipline, "no certification period in scope; frequency edit ignored");
            return Ok(Outcome::Ignored {
                reason: "no certification period in scope".to_string(),
            });
        };

        let mut fields = serde_json::Map::new();
        fields.insert(
            discipline.frequency_field(),
            serde_json::Value::String(frequency),
        );
        if let Err(e) = self.gateway.update_cert_period(&window, &fields) {
            warn!(error = %e, discipline = %discipline, "frequency update failed");
            let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
            return Ok(Outcome::Rejected { notice });
        }

        self.journal_change(SliceKind::Staffing, kind, summary, false)?;
        self.refetch_staffing_after_mutation()
    }

    /// The disciplines view never merges optimistically — every successful
    /// mutation is followed by a full refetch of the staffing slice.
    fn refetch_staffing_after_mutation(&mut self) -> CarelogResult<Outcome> {
        let ticket = self.begin_staffing_refetch();
        let scope = self.timeline.active_id();
        match self.gateway.assigned_staff(&self.patient_id, scope.as_ref()) {
            Ok(staffing) => {
                self.apply_staffing(ticket, staffing);
                let events = vec![SyncEvent::StaffingReplaced {
                    staffing: self.staffing.clone(),
                }];
                self.broadcast(&events);
                Ok(Outcome::Applied {
                    events,
                    warning: None,
                })
            }
            Err(e) => {
                // The mutation persisted; only the refresh failed. Keep the
                // stale slice and say so.
                warn!(error = %e, "staffing refetch after mutation failed");
                let warning = self.push_notice(
                    NoticeSeverity::Warning,
                    format!("saved, but refreshing assignments failed: {}", e),
                );
                Ok(Outcome::Applied {
                    events: vec![],
                    warning: Some(warning),
                })
            }
        }
    }

    // ── Timeline arms ─────────────────────────────────────────────────────────

    fn add_window(
        &mut self,
        start_date: chrono::NaiveDate,
        end_date: Option<chrono::NaiveDate>,
        insurance: String,
        policy_number: String,
        agency: String,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        let end_date = end_date.unwrap_or_else(|| default_end_date(start_date));

        let (window, warning) = match self
            .gateway
            .create_cert_period(&self.patient_id, start_date, end_date)
        {
            Ok(mut created) => {
                created.insurance = insurance;
                created.policy_number = policy_number;
                created.agency = agency;
                (created, None)
            }
            Err(e) => {
                // Deliberate fallback: keep the window locally under a
                // provisional id so the page stays consistent, and warn.
                warn!(error = %e, "certification period create failed; keeping provisional window");
                let warning = self.push_notice(
                    NoticeSeverity::Warning,
                    format!("certification period saved locally only: {}", e),
                );
                let window = CertificationWindow {
                    id: WindowId::provisional(),
                    start_date,
                    end_date,
                    insurance,
                    policy_number,
                    agency,
                    status: WindowStatus::Active,
                    provisional: true,
                };
                (window, Some(warning))
            }
        };

        self.timeline.add(window);
        self.journal_change(SliceKind::Timeline, kind, summary, false)?;

        let events = vec![SyncEvent::TimelineReplaced {
            windows: self.timeline.snapshot(),
        }];
        self.broadcast(&events);
        Ok(Outcome::Applied { events, warning })
    }

    fn select_window(
        &mut self,
        window: WindowId,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        let before = self.window_statuses();
        if let Err(e) = self.timeline.select(&window) {
            let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
            return Ok(Outcome::Rejected { notice });
        }

        let warning = self.persist_status_changes(&before);
        self.journal_change(SliceKind::Timeline, kind, summary, false)?;

        let events = vec![SyncEvent::TimelineReplaced {
            windows: self.timeline.snapshot(),
        }];
        self.broadcast(&events);
        Ok(Outcome::Applied { events, warning })
    }

    fn delete_window(
        &mut self,
        window: WindowId,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        let provisional = match self.timeline.get(&window) {
            Some(target) => target.provisional,
            None => {
                let notice = self.push_notice(
                    NoticeSeverity::Error,
                    format!("unknown certification period '{}'", window.0),
                );
                return Ok(Outcome::Rejected { notice });
            }
        };

        if self.timeline.len() < 2 {
            let notice = self.push_notice(
                NoticeSeverity::Error,
                "cannot delete the only certification period".to_string(),
            );
            return Ok(Outcome::Rejected { notice });
        }

        // A provisional window only exists locally; there is nothing to
        // delete on the backend.
        if !provisional {
            if let Err(e) = self.gateway.delete_cert_period(&window) {
                warn!(error = %e, window = %window.0, "certification period delete failed");
                let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
                return Ok(Outcome::Rejected { notice });
            }
        }

        let before = self.window_statuses();
        // Existence and count were checked above; a failure here means the
        // timeline changed underneath us, which is a rejection, not a crash.
        if let Err(e) = self.timeline.delete(&window) {
            let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
            return Ok(Outcome::Rejected { notice });
        }

        let warning = self.persist_status_changes(&before);
        self.journal_change(SliceKind::Timeline, kind, summary, false)?;

        let events = vec![SyncEvent::TimelineReplaced {
            windows: self.timeline.snapshot(),
        }];
        self.broadcast(&events);
        Ok(Outcome::Applied { events, warning })
    }

    /// Snapshot of window statuses keyed by id, taken before a transition.
    fn window_statuses(&self) -> Vec<(WindowId, WindowStatus)> {
        self.timeline
            .windows()
            .iter()
            .map(|w| (w.id.clone(), w.status))
            .collect()
    }

    /// Push status flips produced by a local transition to the backend.
    ///
    /// Best-effort per window: a failed flip keeps the local state and
    /// degrades to a warning notice. Provisional windows are skipped.
    fn persist_status_changes(
        &mut self,
        before: &[(WindowId, WindowStatus)],
    ) -> Option<Notice> {
        let mut failed: Vec<String> = Vec::new();

        let changed: Vec<(WindowId, WindowStatus)> = self
            .timeline
            .windows()
            .iter()
            .filter(|w| !w.provisional)
            .filter(|w| {
                before
                    .iter()
                    .find(|(id, _)| *id == w.id)
                    .map(|(_, status)| *status != w.status)
                    .unwrap_or(false)
            })
            .map(|w| (w.id.clone(), w.status))
            .collect();

        for (id, status) in changed {
            let mut fields = serde_json::Map::new();
            let value = match status {
                WindowStatus::Active => "active",
                WindowStatus::Expired => "expired",
            };
            fields.insert("status".to_string(), serde_json::Value::String(value.to_string()));
            if let Err(e) = self.gateway.update_cert_period(&id, &fields) {
                warn!(error = %e, window = %id.0, "status flip persist failed");
                failed.push(id.0);
            }
        }

        if failed.is_empty() {
            None
        } else {
            Some(self.push_notice(
                NoticeSeverity::Warning,
                format!("period status not saved for: {}", failed.join(", ")),
            ))
        }
    }

    // ── Patient / schedule arms ───────────────────────────────────────────────

    fn update_patient(
        &mut self,
        fields: Vec<(String, String)>,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        // Phone fields go over the wire as raw digits.
        let fields: Vec<(String, String)> = fields
            .into_iter()
            .map(|(k, v)| {
                if k.contains("phone") {
                    let normalized = normalize_phone(&v);
                    (k, normalized)
                } else {
                    (k, v)
                }
            })
            .collect();

        if let Err(e) = self.gateway.update_patient(&self.patient_id, &fields) {
            warn!(error = %e, "patient update failed");
            let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
            return Ok(Outcome::Rejected { notice });
        }

        self.journal_change(SliceKind::Patient, kind, summary, false)?;
        Ok(Outcome::Applied {
            events: vec![],
            warning: None,
        })
    }

    fn schedule_visit(
        &mut self,
        visit: VisitRef,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        let saved = match self.gateway.assign_visit(&self.patient_id, &visit) {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %e, "visit assignment failed");
                let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
                return Ok(Outcome::Rejected { notice });
            }
        };

        // Refetch within the active period when one exists; otherwise the
        // saved visit is appended directly.
        if let Some(window) = self.timeline.active_id() {
            let ticket = self.begin_schedule_refetch();
            match self.gateway.visits_for_period(&window) {
                Ok(visits) => {
                    self.apply_schedule(ticket, visits);
                }
                Err(e) => {
                    warn!(error = %e, "schedule refetch after visit assignment failed");
                    self.schedule.push(saved);
                }
            }
        } else {
            self.schedule.push(saved);
        }

        self.journal_change(SliceKind::Schedule, kind, summary, false)?;
        let events = vec![SyncEvent::ScheduleReplaced {
            visits: self.schedule.clone(),
        }];
        self.broadcast(&events);
        Ok(Outcome::Applied {
            events,
            warning: None,
        })
    }

    fn replace_schedule(
        &mut self,
        visits: Vec<VisitRef>,
        kind: &str,
        summary: String,
    ) -> CarelogResult<Outcome> {
        // The schedule editor persisted through its own endpoints; this is
        // the sideways sync path, so the slice is replaced wholesale.
        self.schedule = visits;
        self.journal_change(SliceKind::Schedule, kind, summary, false)?;

        let events = vec![SyncEvent::ScheduleReplaced {
            visits: self.schedule.clone(),
        }];
        self.broadcast(&events);
        Ok(Outcome::Applied {
            events,
            warning: None,
        })
    }

    // ── Refresh arms ──────────────────────────────────────────────────────────

    fn refresh_staffing(&mut self) -> CarelogResult<Outcome> {
        let ticket = self.begin_staffing_refetch();
        let scope = self.timeline.active_id();
        match self.gateway.assigned_staff(&self.patient_id, scope.as_ref()) {
            Ok(staffing) => {
                self.apply_staffing(ticket, staffing);
                let events = vec![SyncEvent::StaffingReplaced {
                    staffing: self.staffing.clone(),
                }];
                self.broadcast(&events);
                Ok(Outcome::Applied {
                    events,
                    warning: None,
                })
            }
            Err(e) => {
                warn!(error = %e, "staffing refresh failed");
                let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
                Ok(Outcome::Rejected { notice })
            }
        }
    }

    fn refresh_timeline(&mut self) -> CarelogResult<Outcome> {
        let ticket = self.begin_timeline_refetch();
        match self.gateway.cert_periods(&self.patient_id) {
            Ok(windows) => {
                self.apply_timeline(ticket, windows);
                let events = vec![SyncEvent::TimelineReplaced {
                    windows: self.timeline.snapshot(),
                }];
                self.broadcast(&events);
                Ok(Outcome::Applied {
                    events,
                    warning: None,
                })
            }
            Err(e) => {
                warn!(error = %e, "timeline refresh failed");
                let notice = self.push_notice(NoticeSeverity::Error, e.to_string());
                Ok(Outcome::Rejected { notice })
            }
        }
    }

    // ── Request tickets ───────────────────────────────────────────────────────
    //
    // The synchronous dispatch path always applies its own response, but the
    // begin/apply pair is public so async front-ends can route late
    // responses through the same guard — and drop the stale ones.

    /// Issue a new staffing refetch ticket, invalidating earlier ones.
    pub fn begin_staffing_refetch(&mut self) -> u64 {
        self.tickets.staffing += 1;
        self.tickets.staffing
    }

    /// Apply a staffing response. Returns false (and changes nothing) when
    /// a newer request has been issued since this ticket.
    pub fn apply_staffing(&mut self, ticket: u64, staffing: StaffingSet) -> bool {
        if ticket != self.tickets.staffing {
            debug!(ticket, latest = self.tickets.staffing, "stale staffing response discarded");
            return false;
        }
        self.staffing = staffing;
        true
    }

    /// Issue a new timeline refetch ticket, invalidating earlier ones.
    pub fn begin_timeline_refetch(&mut self) -> u64 {
        self.tickets.timeline += 1;
        self.tickets.timeline
    }

    /// Apply a timeline response unless a newer request supersedes it.
    pub fn apply_timeline(&mut self, ticket: u64, windows: Vec<CertificationWindow>) -> bool {
        if ticket != self.tickets.timeline {
            debug!(ticket, latest = self.tickets.timeline, "stale timeline response discarded");
            return false;
        }
        self.timeline = CertificationTimeline::from_fetched(windows);
        true
    }

    /// Issue a new schedule refetch ticket, invalidating earlier ones.
    pub fn begin_schedule_refetch(&mut self) -> u64 {
        self.tickets.schedule += 1;
        self.tickets.schedule
    }

    /// Apply a schedule response unless a newer request supersedes it.
    pub fn apply_schedule(&mut self, ticket: u64, visits: Vec<VisitRef>) -> bool {
        if ticket != self.tickets.schedule {
            debug!(ticket, latest = self.tickets.schedule, "stale schedule response discarded");
            return false;
        }
        self.schedule = visits;
        true
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn push_notice(&mut self, severity: NoticeSeverity, message: String) -> Notice {
        let notice = Notice {
            id: self.next_notice_id,
            severity,
            message,
        };
        self.next_notice_id += 1;
        self.notices.push(notice.clone());
        notice
    }

    fn journal_change(
        &self,
        slice: SliceKind,
        kind: &str,
        summary: String,
        override_flag: bool,
    ) -> CarelogResult<()> {
        let record = ChangeRecord {
            slice,
            intent_kind: kind.to_string(),
            summary,
            override_flag,
            timestamp: Utc::now(),
        };
        self.journal.append(&record)
    }

    fn broadcast(&self, events: &[SyncEvent]) {
        for event in events {
            for listener in &self.listeners {
                listener.on_sync(event);
            }
        }
        if !events.is_empty() {
            info!(
                patient = %self.patient_id.0,
                count = events.len(),
                listeners = self.listeners.len(),
                "slices broadcast"
            );
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use carelog_contracts::{
        change::{ChangeRecord, SliceKind},
        discipline::{Discipline, SlotKind},
        entitlement::{EntitlementSet, EntitlementStatus},
        error::{CarelogError, CarelogResult},
        ids::{PatientId, StaffId, WindowId},
        intent::{Intent, Outcome, SyncEvent},
        screen::{ScreenFailure, ScreenReport},
        staff::StaffRef,
        staffing::StaffingSet,
        visit::VisitRef,
        window::{CertificationWindow, WindowStatus},
    };

    use crate::traits::{ChangeJournal, IntentScreener, PracticeGateway, SyncListener};

    use super::PatientStore;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn staff(id: &str, name: &str, role: &str) -> StaffRef {
        StaffRef {
            id: StaffId::new(id),
            name: name.to_string(),
            email: format!("{}@harborhh.example", id),
            phone: "5551234567".to_string(),
            role: role.to_string(),
        }
    }

    fn window(id: &str, start: &str, end: &str, status: WindowStatus) -> CertificationWindow {
        CertificationWindow {
            id: WindowId::new(id),
            start_date: date(start),
            end_date: date(end),
            insurance: "Blue Shield PPO".to_string(),
            policy_number: "BSP-4417".to_string(),
            agency: "Harbor Home Health".to_string(),
            status,
            provisional: false,
        }
    }

    /// A gateway that records every call and can be told to fail specific
    /// operations.
    #[derive(Clone)]
    struct MockGateway {
        calls: Arc<Mutex<Vec<String>>>,
        fail_ops: Arc<Mutex<HashSet<String>>>,
        staffing: Arc<Mutex<StaffingSet>>,
        windows: Arc<Mutex<Vec<CertificationWindow>>>,
        created: Arc<Mutex<u32>>,
    }

    impl MockGateway {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(vec![])),
                fail_ops: Arc::new(Mutex::new(HashSet::new())),
                staffing: Arc::new(Mutex::new(StaffingSet::default())),
                windows: Arc::new(Mutex::new(vec![])),
                created: Arc::new(Mutex::new(0)),
            }
        }

        fn fail(&self, op: &str) {
            self.fail_ops.lock().unwrap().insert(op.to_string());
        }

        fn gate(&self, op: &str) -> CarelogResult<()> {
            if self.fail_ops.lock().unwrap().contains(op) {
                Err(CarelogError::Transport {
                    reason: format!("{} unreachable", op),
                })
            } else {
                Ok(())
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PracticeGateway for MockGateway {
        fn list_staff(&self) -> CarelogResult<Vec<StaffRef>> {
            self.record("list-staff".to_string());
            self.gate("list-staff")?;
            Ok(vec![])
        }

        fn patient_entitlements(&self, patient: &PatientId) -> CarelogResult<EntitlementSet> {
            self.record(format!("patient-entitlements {}", patient.0));
            self.gate("patient-entitlements")?;
            Ok(EntitlementSet::default())
        }

        fn cert_periods(&self, patient: &PatientId) -> CarelogResult<Vec<CertificationWindow>> {
            self.record(format!("cert-periods {}", patient.0));
            self.gate("cert-periods")?;
            Ok(self.windows.lock().unwrap().clone())
        }

        fn create_cert_period(
            &self,
            patient: &PatientId,
            start_date: NaiveDate,
            end_date: NaiveDate,
        ) -> CarelogResult<CertificationWindow> {
            self.record(format!(
                "create-cert-period {} {} {}",
                patient.0, start_date, end_date
            ));
            self.gate("create-cert-period")?;
            let mut created = self.created.lock().unwrap();
            *created += 1;
            Ok(CertificationWindow {
                id: WindowId::new(format!("cp-{}", *created)),
                start_date,
                end_date,
                insurance: String::new(),
                policy_number: String::new(),
                agency: String::new(),
                status: WindowStatus::Active,
                provisional: false,
            })
        }

        fn update_cert_period(
            &self,
            window: &WindowId,
            fields: &serde_json::Map<String, serde_json::Value>,
        ) -> CarelogResult<()> {
            self.record(format!(
                "update-cert-period {} {}",
                window.0,
                serde_json::Value::Object(fields.clone())
            ));
            self.gate("update-cert-period")
        }

        fn delete_cert_period(&self, window: &WindowId) -> CarelogResult<()> {
            self.record(format!("delete-cert-period {}", window.0));
            self.gate("delete-cert-period")
        }

        fn assigned_staff(
            &self,
            patient: &PatientId,
            cert_period: Option<&WindowId>,
        ) -> CarelogResult<StaffingSet> {
            self.record(format!(
                "assigned-staff {} scope={:?}",
                patient.0,
                cert_period.map(|w| w.0.clone())
            ));
            self.gate("assigned-staff")?;
            Ok(self.staffing.lock().unwrap().clone())
        }

        fn assign_staff(
            &self,
            patient: &PatientId,
            staff: &StaffId,
            discipline_token: &str,
        ) -> CarelogResult<()> {
            self.record(format!(
                "assign-staff {} {} {}",
                patient.0, staff.0, discipline_token
            ));
            self.gate("assign-staff")
        }

        fn unassign_staff(&self, patient: &PatientId, discipline_token: &str) -> CarelogResult<()> {
            self.record(format!("unassign-staff {} {}", patient.0, discipline_token));
            self.gate("unassign-staff")
        }

        fn update_patient(
            &self,
            patient: &PatientId,
            fields: &[(String, String)],
        ) -> CarelogResult<()> {
            self.record(format!("update-patient {} {:?}", patient.0, fields));
            self.gate("update-patient")
        }

        fn visits_for_period(&self, cert_period: &WindowId) -> CarelogResult<Vec<VisitRef>> {
            self.record(format!("visits-for-period {}", cert_period.0));
            self.gate("visits-for-period")?;
            Ok(vec![])
        }

        fn assign_visit(&self, patient: &PatientId, visit: &VisitRef) -> CarelogResult<VisitRef> {
            self.record(format!("assign-visit {} {}", patient.0, visit.visit_date));
            self.gate("assign-visit")?;
            Ok(visit.clone())
        }
    }

    /// A journal that records every append and can be made to fail.
    #[derive(Clone)]
    struct MockJournal {
        records: Arc<Mutex<Vec<ChangeRecord>>>,
        fail: bool,
    }

    impl MockJournal {
        fn new() -> Self {
            Self {
                records: Arc::new(Mutex::new(vec![])),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                records: Arc::new(Mutex::new(vec![])),
                fail: true,
            }
        }

        fn records(&self) -> Vec<ChangeRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    impl ChangeJournal for MockJournal {
        fn append(&self, record: &ChangeRecord) -> CarelogResult<()> {
            if self.fail {
                return Err(CarelogError::JournalWriteFailed {
                    reason: "journal store offline".to_string(),
                });
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    /// A screener that always passes.
    struct PassScreener;

    impl IntentScreener for PassScreener {
        fn screen(&self, _intent: &Intent) -> CarelogResult<ScreenReport> {
            Ok(ScreenReport {
                passed: true,
                failures: vec![],
            })
        }
    }

    /// A screener that always fails with one configured rule.
    struct FailScreener;

    impl IntentScreener for FailScreener {
        fn screen(&self, _intent: &Intent) -> CarelogResult<ScreenReport> {
            Ok(ScreenReport {
                passed: false,
                failures: vec![ScreenFailure {
                    rule_id: "req-start-date".to_string(),
                    message: "field 'start_date' is missing or null".to_string(),
                }],
            })
        }
    }

    /// A listener that records every broadcast event.
    #[derive(Clone)]
    struct RecordingListener {
        events: Arc<Mutex<Vec<SyncEvent>>>,
    }

    impl RecordingListener {
        fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(vec![])),
            }
        }

        fn events(&self) -> Vec<SyncEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SyncListener for RecordingListener {
        fn on_sync(&self, event: &SyncEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn make_store(gateway: &MockGateway, journal: &MockJournal) -> PatientStore {
        PatientStore::new(
            PatientId::new("patient-7"),
            Box::new(gateway.clone()),
            Box::new(journal.clone()),
            Box::new(PassScreener),
        )
    }

    // ── Entitlement dispatch ─────────────────────────────────────────────────

    #[test]
    fn set_counts_persist_derive_and_broadcast() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let listener = RecordingListener::new();
        let mut store = make_store(&gateway, &journal);
        store.subscribe(Box::new(listener.clone()));

        store
            .dispatch(Intent::SetApproved {
                discipline: Discipline::Pt,
                raw: "12".to_string(),
            })
            .unwrap();
        store
            .dispatch(Intent::SetUsed {
                discipline: Discipline::Pt,
                raw: "3".to_string(),
            })
            .unwrap();

        let record = store.entitlements().record(Discipline::Pt);
        assert_eq!(record.status, EntitlementStatus::Active);
        assert_eq!(record.remaining(), 9);

        let calls = gateway.calls();
        assert!(calls[0].contains("approved_pt") && calls[0].contains("12"), "{:?}", calls);
        assert!(calls[1].contains("used_pt"), "{:?}", calls);

        // Two applied intents → two full-payload broadcasts, two journal rows.
        assert_eq!(listener.events().len(), 2);
        assert_eq!(journal.records().len(), 2);
        assert!(journal
            .records()
            .iter()
            .all(|r| r.slice == SliceKind::Entitlements && !r.override_flag));
    }

    /// A gateway failure rejects the intent: no local change, no journal
    /// row, no broadcast — just a dismissible notice.
    #[test]
    fn gateway_failure_rejects_without_local_change() {
        let gateway = MockGateway::new();
        gateway.fail("update-patient");
        let journal = MockJournal::new();
        let listener = RecordingListener::new();
        let mut store = make_store(&gateway, &journal);
        store.subscribe(Box::new(listener.clone()));

        let outcome = store
            .dispatch(Intent::SetApproved {
                discipline: Discipline::Ot,
                raw: "9".to_string(),
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Rejected { .. }));
        assert_eq!(
            store.entitlements().record(Discipline::Ot).status,
            EntitlementStatus::Waiting
        );
        assert!(journal.records().is_empty());
        assert!(listener.events().is_empty());
        assert_eq!(store.notices().len(), 1);
    }

    #[test]
    fn screening_failure_blocks_before_any_network_call() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = PatientStore::new(
            PatientId::new("patient-7"),
            Box::new(gateway.clone()),
            Box::new(journal.clone()),
            Box::new(FailScreener),
        );

        let outcome = store
            .dispatch(Intent::AddWindow {
                start_date: date("2025-02-15"),
                end_date: None,
                insurance: "Medicare A".to_string(),
                policy_number: "MA-100".to_string(),
                agency: "Harbor Home Health".to_string(),
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Rejected { .. }));
        assert!(gateway.calls().is_empty(), "the gateway must not be touched");
        assert!(journal.records().is_empty());
    }

    /// A manual override that contradicts the counters is applied anyway,
    /// and the journal row carries the data-quality flag.
    #[test]
    fn contradictory_override_is_applied_and_flagged() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        store
            .dispatch(Intent::SetApproved {
                discipline: Discipline::Pt,
                raw: "6".to_string(),
            })
            .unwrap();
        store
            .dispatch(Intent::SetUsed {
                discipline: Discipline::Pt,
                raw: "6".to_string(),
            })
            .unwrap();
        store
            .dispatch(Intent::OverrideStatus {
                discipline: Discipline::Pt,
                status: EntitlementStatus::Active,
            })
            .unwrap();

        assert_eq!(
            store.entitlements().record(Discipline::Pt).status,
            EntitlementStatus::Active
        );
        let records = journal.records();
        let last = records.last().unwrap();
        assert_eq!(last.intent_kind, "override-status");
        assert!(last.override_flag, "contradiction must be flagged");
    }

    // ── Timeline dispatch ────────────────────────────────────────────────────

    #[test]
    fn add_window_defaults_end_date_and_keeps_single_active() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        let outcome = store
            .dispatch(Intent::AddWindow {
                start_date: date("2025-02-15"),
                end_date: None,
                insurance: "Medicare A".to_string(),
                policy_number: "MA-100".to_string(),
                agency: "Harbor Home Health".to_string(),
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Applied { warning: None, .. }));
        assert_eq!(store.timeline().active_count(), 1);

        let active = store.timeline().active().unwrap();
        assert_eq!(active.id, WindowId::new("cp-1"));
        assert_eq!(active.end_date, date("2025-04-16"));
        assert_eq!(active.insurance, "Medicare A");
        assert!(!active.provisional);
    }

    /// When the backend create fails, the window is still added locally
    /// under a provisional id and a warning notice is raised.
    #[test]
    fn add_window_failure_keeps_provisional_window() {
        let gateway = MockGateway::new();
        gateway.fail("create-cert-period");
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        let outcome = store
            .dispatch(Intent::AddWindow {
                start_date: date("2025-02-15"),
                end_date: None,
                insurance: "Medicare A".to_string(),
                policy_number: "MA-100".to_string(),
                agency: "Harbor Home Health".to_string(),
            })
            .unwrap();

        match outcome {
            Outcome::Applied { warning, .. } => assert!(warning.is_some()),
            other => panic!("expected Applied with warning, got {:?}", other),
        }

        let active = store.timeline().active().unwrap();
        assert!(active.provisional);
        assert!(active.id.is_provisional());
        assert_eq!(active.end_date, date("2025-04-16"));
        assert_eq!(store.notices().len(), 1);
        // The applied provisional change is journaled like any other.
        assert_eq!(journal.records().len(), 1);
    }

    #[test]
    fn delete_only_window_is_rejected() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        store
            .dispatch(Intent::AddWindow {
                start_date: date("2025-02-15"),
                end_date: None,
                insurance: String::new(),
                policy_number: String::new(),
                agency: String::new(),
            })
            .unwrap();

        let outcome = store
            .dispatch(Intent::DeleteWindow {
                window: WindowId::new("cp-1"),
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Rejected { .. }));
        assert_eq!(store.timeline().len(), 1);
    }

    /// Deleting the active window among three promotes the survivor with
    /// the latest end date, and the status flips reach the backend.
    #[test]
    fn delete_active_window_promotes_and_persists_flips() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        let ticket = store.begin_timeline_refetch();
        store.apply_timeline(
            ticket,
            vec![
                window("a", "2025-03-01", "2025-05-01", WindowStatus::Active),
                window("b", "2025-04-01", "2025-06-01", WindowStatus::Expired),
                window("c", "2025-02-01", "2025-04-01", WindowStatus::Expired),
            ],
        );

        let outcome = store
            .dispatch(Intent::DeleteWindow {
                window: WindowId::new("a"),
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Applied { .. }));
        assert_eq!(store.timeline().active_id(), Some(WindowId::new("b")));
        assert_eq!(store.timeline().active_count(), 1);

        let calls = gateway.calls();
        assert!(calls.iter().any(|c| c.starts_with("delete-cert-period a")), "{:?}", calls);
        assert!(
            calls
                .iter()
                .any(|c| c.starts_with("update-cert-period b") && c.contains("active")),
            "{:?}",
            calls
        );
    }

    #[test]
    fn select_window_activates_exactly_one() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        let ticket = store.begin_timeline_refetch();
        store.apply_timeline(
            ticket,
            vec![
                window("a", "2025-01-01", "2025-03-02", WindowStatus::Expired),
                window("b", "2025-03-03", "2025-05-02", WindowStatus::Active),
            ],
        );

        store
            .dispatch(Intent::SelectWindow {
                window: WindowId::new("a"),
            })
            .unwrap();

        assert_eq!(store.timeline().active_id(), Some(WindowId::new("a")));
        assert_eq!(store.timeline().active_count(), 1);
    }

    // ── Staffing dispatch ────────────────────────────────────────────────────

    #[test]
    fn assign_staff_sends_slot_token_and_refetches() {
        let gateway = MockGateway::new();
        {
            let mut staffing = gateway.staffing.lock().unwrap();
            staffing.plan_mut(Discipline::Pt).assigned_assistant =
                Some(staff("s-02", "J. Reyes", "PTA"));
        }
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        let outcome = store
            .dispatch(Intent::AssignStaff {
                discipline: Discipline::Pt,
                slot: SlotKind::Assistant,
                staff_id: StaffId::new("s-02"),
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Applied { .. }));

        let calls = gateway.calls();
        assert!(
            calls.iter().any(|c| c.contains("assign-staff") && c.ends_with("PTA")),
            "{:?}",
            calls
        );
        assert!(calls.iter().any(|c| c.starts_with("assigned-staff")), "{:?}", calls);

        // The slice reflects the refetched map, not an optimistic merge.
        let plan = store.staffing().plan(Discipline::Pt);
        assert!(plan.is_active());
        assert_eq!(
            plan.assigned_assistant.as_ref().unwrap().id,
            StaffId::new("s-02")
        );
    }

    /// The OT assistant unassigns with the suffixed code "OTA", not the
    /// staff-directory role "COTA".
    #[test]
    fn unassign_ot_assistant_uses_suffixed_token() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        store
            .dispatch(Intent::UnassignStaff {
                discipline: Discipline::Ot,
                slot: SlotKind::Assistant,
            })
            .unwrap();

        let calls = gateway.calls();
        assert!(
            calls.iter().any(|c| c.contains("unassign-staff") && c.ends_with("OTA")),
            "{:?}",
            calls
        );
    }

    #[test]
    fn set_frequency_without_period_is_a_silent_noop() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        let outcome = store
            .dispatch(Intent::SetFrequency {
                discipline: Discipline::Pt,
                frequency: "3x/week".to_string(),
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Ignored { .. }));
        assert!(gateway.calls().is_empty());
        assert!(journal.records().is_empty());
    }

    #[test]
    fn set_frequency_with_period_updates_the_period() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        store
            .dispatch(Intent::AddWindow {
                start_date: date("2025-02-15"),
                end_date: None,
                insurance: String::new(),
                policy_number: String::new(),
                agency: String::new(),
            })
            .unwrap();

        store
            .dispatch(Intent::SetFrequency {
                discipline: Discipline::Pt,
                frequency: "3x/week".to_string(),
            })
            .unwrap();

        let calls = gateway.calls();
        assert!(
            calls
                .iter()
                .any(|c| c.starts_with("update-cert-period cp-1") && c.contains("pt_frequency")),
            "{:?}",
            calls
        );
    }

    // ── Stale-response guard ─────────────────────────────────────────────────

    /// An older response must be discarded once a newer request is issued:
    /// last request wins, not last response.
    #[test]
    fn stale_staffing_response_is_discarded() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        let mut older = StaffingSet::default();
        older.plan_mut(Discipline::Pt).assigned_main = Some(staff("s-01", "M. Okafor", "PT"));
        let mut newer = StaffingSet::default();
        newer.plan_mut(Discipline::Pt).assigned_main = Some(staff("s-09", "R. Calder", "PT"));

        let first = store.begin_staffing_refetch();
        let second = store.begin_staffing_refetch();

        assert!(!store.apply_staffing(first, older), "stale ticket must be discarded");
        assert!(store.apply_staffing(second, newer));

        let plan = store.staffing().plan(Discipline::Pt);
        assert_eq!(plan.assigned_main.as_ref().unwrap().id, StaffId::new("s-09"));
    }

    // ── Journal fatality ─────────────────────────────────────────────────────

    /// A journal write failure is the one hard error dispatch propagates.
    #[test]
    fn journal_failure_is_fatal() {
        let gateway = MockGateway::new();
        let journal = MockJournal::failing();
        let mut store = make_store(&gateway, &journal);

        let result = store.dispatch(Intent::SetApproved {
            discipline: Discipline::Pt,
            raw: "4".to_string(),
        });

        assert!(matches!(
            result,
            Err(CarelogError::JournalWriteFailed { .. })
        ));
    }

    // ── Notices ──────────────────────────────────────────────────────────────

    #[test]
    fn notices_are_dismissible_by_id() {
        let gateway = MockGateway::new();
        gateway.fail("update-patient");
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        store
            .dispatch(Intent::SetApproved {
                discipline: Discipline::Pt,
                raw: "1".to_string(),
            })
            .unwrap();

        let id = store.notices()[0].id;
        assert!(store.dismiss_notice(id));
        assert!(store.notices().is_empty());
        assert!(!store.dismiss_notice(id), "double dismiss is a no-op");
    }

    // ── Hydration ────────────────────────────────────────────────────────────

    /// An empty backend (the 404 case, absorbed by the gateway) hydrates to
    /// empty slices without notices.
    #[test]
    fn hydrate_from_empty_backend() {
        let gateway = MockGateway::new();
        let journal = MockJournal::new();
        let listener = RecordingListener::new();
        let mut store = make_store(&gateway, &journal);
        store.subscribe(Box::new(listener.clone()));

        let events = store.hydrate();

        assert!(store.timeline().is_empty());
        assert!(store.schedule().is_empty());
        assert!(store.notices().is_empty());
        // Entitlement, timeline, and staffing broadcasts fire; no schedule
        // without an active window.
        assert_eq!(events.len(), 3);
        assert_eq!(listener.events().len(), 3);
    }

    #[test]
    fn hydrate_fetches_visits_for_active_window() {
        let gateway = MockGateway::new();
        gateway
            .windows
            .lock()
            .unwrap()
            .push(window("cp-9", "2025-01-01", "2025-03-02", WindowStatus::Active));
        let journal = MockJournal::new();
        let mut store = make_store(&gateway, &journal);

        let events = store.hydrate();

        assert_eq!(events.len(), 4);
        assert!(gateway
            .calls()
            .iter()
            .any(|c| c.starts_with("visits-for-period cp-9")));
    }
}
