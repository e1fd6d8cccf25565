//! In-memory implementation of `PracticeGateway`.
//!
//! A deterministic, in-process stand-in for the practice REST backend,
//! used by the store tests and the demo CLI.  All data is hardcoded and
//! fictional.  Individual operations can be scripted to fail so callers can
//! exercise the notice and provisional-window paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::debug;

use carelog_contracts::{
    discipline::{Discipline, SlotKind},
    entitlement::{CountField, EntitlementSet, EntitlementStatus},
    error::{CarelogError, CarelogResult},
    ids::{PatientId, StaffId, VisitId, WindowId},
    staff::StaffRef,
    staffing::StaffingSet,
    visit::VisitRef,
    window::{CertificationWindow, WindowStatus},
};
use carelog_store::traits::PracticeGateway;

// ── Internal state ────────────────────────────────────────────────────────────

struct MemoryState {
    staff: Vec<StaffRef>,
    /// Certification windows by patient id.
    windows: HashMap<String, Vec<CertificationWindow>>,
    /// Staffing assignments by patient id.
    staffing: HashMap<String, StaffingSet>,
    /// Frequencies by window id, keyed by discipline.
    frequencies: HashMap<String, HashMap<Discipline, String>>,
    /// Visits by window id.
    visits: HashMap<String, Vec<VisitRef>>,
    /// Append log of patient field updates, by patient id.
    patient_updates: HashMap<String, Vec<(String, String)>>,
    next_period: u32,
    next_visit: u32,
    fail_ops: HashSet<String>,
}

fn seeded_staff() -> Vec<StaffRef> {
    let entry = |id: &str, name: &str, phone: &str, role: &str| StaffRef {
        id: StaffId::new(id),
        name: name.to_string(),
        email: format!("{}@harborhh.example", id),
        phone: phone.to_string(),
        role: role.to_string(),
    };

    vec![
        entry("s-01", "M. Okafor", "5550114421", "PT"),
        entry("s-02", "J. Reyes", "5550117733", "PTA"),
        entry("s-03", "L. Tran", "5550112214", "OT"),
        entry("s-04", "K. Whitfield", "5550118090", "COTA"),
        entry("s-05", "A. Dimas", "5550113345", "ST"),
        entry("s-06", "R. Calder", "5550116528", "STA"),
        entry("s-07", "Harbor Home Health", "5550110001", "agency"),
    ]
}

// ── Public gateway ────────────────────────────────────────────────────────────

/// An in-memory `PracticeGateway` with a seeded, fictional staff directory.
///
/// Clones share state, so a test can keep a handle for inspection while the
/// store owns its boxed copy.
#[derive(Clone)]
pub struct InMemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                staff: seeded_staff(),
                windows: HashMap::new(),
                staffing: HashMap::new(),
                frequencies: HashMap::new(),
                visits: HashMap::new(),
                patient_updates: HashMap::new(),
                next_period: 0,
                next_visit: 0,
                fail_ops: HashSet::new(),
            })),
        }
    }

    /// Script an operation to fail with a transport error until healed.
    pub fn fail_on(&self, op: &str) {
        self.state.lock().expect("gateway state lock poisoned").fail_ops.insert(op.to_string());
    }

    /// Remove a scripted failure.
    pub fn heal(&self, op: &str) {
        self.state.lock().expect("gateway state lock poisoned").fail_ops.remove(op);
    }

    /// The first directory entry holding the given role, if any.
    pub fn staff_with_role(&self, role: &str) -> Option<StaffRef> {
        let state = self.state.lock().expect("gateway state lock poisoned");
        state.staff.iter().find(|s| s.role == role).cloned()
    }

    /// Every field update recorded for a patient, in arrival order.
    pub fn patient_updates(&self, patient: &PatientId) -> Vec<(String, String)> {
        let state = self.state.lock().expect("gateway state lock poisoned");
        state
            .patient_updates
            .get(&patient.0)
            .cloned()
            .unwrap_or_default()
    }

    fn gate(state: &MemoryState, op: &str) -> CarelogResult<()> {
        if state.fail_ops.contains(op) {
            debug!(op, "scripted gateway failure");
            Err(CarelogError::Transport {
                reason: format!("{}: connection refused", op),
            })
        } else {
            Ok(())
        }
    }

    /// Resolve a slot token (`PT`, `PTA`, `OTA`, …) to its discipline and
    /// slot. Unknown tokens are a 422 from the backend's point of view.
    fn resolve_token(token: &str) -> CarelogResult<(Discipline, SlotKind)> {
        for discipline in Discipline::ALL {
            if token == discipline.slot_token(SlotKind::Main) {
                return Ok((discipline, SlotKind::Main));
            }
            if token == discipline.slot_token(SlotKind::Assistant) {
                return Ok((discipline, SlotKind::Assistant));
            }
        }
        Err(CarelogError::ApiStatus {
            status: 422,
            body: format!("unknown discipline token '{}'", token),
        })
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PracticeGateway for InMemoryGateway {
    fn list_staff(&self) -> CarelogResult<Vec<StaffRef>> {
        let state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "list-staff")?;
        Ok(state.staff.clone())
    }

    fn patient_entitlements(&self, patient: &PatientId) -> CarelogResult<EntitlementSet> {
        let state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "patient-entitlements")?;

        // Replay the recorded patient updates in arrival order so the last
        // write wins, manual status overrides included.
        let mut set = EntitlementSet::default();
        if let Some(updates) = state.patient_updates.get(&patient.0) {
            for (key, value) in updates {
                for discipline in Discipline::ALL {
                    let code = discipline.code().to_lowercase();
                    let record = set.record_mut(discipline);

                    if *key == format!("approved_{}", code) {
                        record.approved = CountField::Value(value.parse().unwrap_or(0));
                        record.status = record.derived_status();
                    } else if *key == format!("used_{}", code) {
                        record.used = CountField::Value(value.parse().unwrap_or(0));
                        record.status = record.derived_status();
                    } else if *key == format!("status_{}", code) {
                        record.status = match value.as_str() {
                            "active" => EntitlementStatus::Active,
                            "no_more" => EntitlementStatus::NoMore,
                            _ => EntitlementStatus::Waiting,
                        };
                    }
                }
            }
        }
        Ok(set)
    }

    fn cert_periods(&self, patient: &PatientId) -> CarelogResult<Vec<CertificationWindow>> {
        let state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "cert-periods")?;
        // An unknown patient has no periods yet — the 404-as-empty case.
        Ok(state.windows.get(&patient.0).cloned().unwrap_or_default())
    }

    fn create_cert_period(
        &self,
        patient: &PatientId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CarelogResult<CertificationWindow> {
        let mut state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "create-cert-period")?;

        state.next_period += 1;
        let window = CertificationWindow {
            id: WindowId::new(format!("cp-{}", state.next_period)),
            start_date,
            end_date,
            insurance: String::new(),
            policy_number: String::new(),
            agency: String::new(),
            status: WindowStatus::Active,
            provisional: false,
        };

        let windows = state.windows.entry(patient.0.clone()).or_default();
        for existing in windows.iter_mut() {
            existing.status = WindowStatus::Expired;
        }
        windows.push(window.clone());
        Ok(window)
    }

    fn update_cert_period(
        &self,
        window: &WindowId,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> CarelogResult<()> {
        let mut state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "update-cert-period")?;

        for (key, value) in fields {
            if key == "status" {
                let status = match value.as_str() {
                    Some("active") => WindowStatus::Active,
                    _ => WindowStatus::Expired,
                };
                for windows in state.windows.values_mut() {
                    for w in windows.iter_mut().filter(|w| w.id == *window) {
                        w.status = status;
                    }
                }
                continue;
            }

            // "{code}_frequency" keys land in the per-window frequency map.
            if let Some(discipline) = Discipline::ALL
                .iter()
                .find(|d| d.frequency_field() == *key)
            {
                if let Some(text) = value.as_str() {
                    state
                        .frequencies
                        .entry(window.0.clone())
                        .or_default()
                        .insert(*discipline, text.to_string());
                }
            }
        }
        Ok(())
    }

    fn delete_cert_period(&self, window: &WindowId) -> CarelogResult<()> {
        let mut state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "delete-cert-period")?;

        for windows in state.windows.values_mut() {
            let before = windows.len();
            windows.retain(|w| w.id != *window);
            if windows.len() != before {
                return Ok(());
            }
        }
        Err(CarelogError::ApiStatus {
            status: 404,
            body: format!("unknown certification period '{}'", window.0),
        })
    }

    fn assigned_staff(
        &self,
        patient: &PatientId,
        cert_period: Option<&WindowId>,
    ) -> CarelogResult<StaffingSet> {
        let state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "assigned-staff")?;

        let mut set = state
            .staffing
            .get(&patient.0)
            .cloned()
            .unwrap_or_default();

        // Frequencies are scoped to a certification period.
        if let Some(window) = cert_period {
            if let Some(frequencies) = state.frequencies.get(&window.0) {
                for (discipline, text) in frequencies {
                    set.plan_mut(*discipline).frequency = Some(text.clone());
                }
            }
        }
        Ok(set)
    }

    fn assign_staff(
        &self,
        patient: &PatientId,
        staff: &StaffId,
        discipline_token: &str,
    ) -> CarelogResult<()> {
        let mut state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "assign-staff")?;

        let member = state
            .staff
            .iter()
            .find(|s| s.id == *staff)
            .cloned()
            .ok_or_else(|| CarelogError::ApiStatus {
                status: 404,
                body: format!("unknown staff member '{}'", staff.0),
            })?;

        let (discipline, slot) = Self::resolve_token(discipline_token)?;
        let plan = state
            .staffing
            .entry(patient.0.clone())
            .or_default()
            .plan_mut(discipline);
        match slot {
            SlotKind::Main => plan.assigned_main = Some(member),
            SlotKind::Assistant => plan.assigned_assistant = Some(member),
        }
        Ok(())
    }

    fn unassign_staff(&self, patient: &PatientId, discipline_token: &str) -> CarelogResult<()> {
        let mut state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "unassign-staff")?;

        let (discipline, slot) = Self::resolve_token(discipline_token)?;
        let plan = state
            .staffing
            .entry(patient.0.clone())
            .or_default()
            .plan_mut(discipline);
        match slot {
            SlotKind::Main => plan.assigned_main = None,
            SlotKind::Assistant => plan.assigned_assistant = None,
        }
        Ok(())
    }

    fn update_patient(&self, patient: &PatientId, fields: &[(String, String)]) -> CarelogResult<()> {
        let mut state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "update-patient")?;

        state
            .patient_updates
            .entry(patient.0.clone())
            .or_default()
            .extend(fields.iter().cloned());
        Ok(())
    }

    fn visits_for_period(&self, cert_period: &WindowId) -> CarelogResult<Vec<VisitRef>> {
        let state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "visits-for-period")?;
        Ok(state.visits.get(&cert_period.0).cloned().unwrap_or_default())
    }

    fn assign_visit(&self, patient: &PatientId, visit: &VisitRef) -> CarelogResult<VisitRef> {
        let mut state = self.state.lock().expect("gateway state lock poisoned");
        Self::gate(&state, "assign-visit")?;

        let active = state
            .windows
            .get(&patient.0)
            .and_then(|ws| ws.iter().find(|w| w.status == WindowStatus::Active))
            .map(|w| w.id.clone())
            .ok_or_else(|| CarelogError::ApiStatus {
                status: 422,
                body: "no active certification period for visit".to_string(),
            })?;

        state.next_visit += 1;
        let saved = VisitRef {
            id: VisitId::new(format!("v-{}", state.next_visit)),
            ..visit.clone()
        };
        state.visits.entry(active.0).or_default().push(saved.clone());
        Ok(saved)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn patient() -> PatientId {
        PatientId::new("patient-7")
    }

    #[test]
    fn test_unknown_patient_has_no_periods() {
        let gateway = InMemoryGateway::new();
        let periods = gateway.cert_periods(&patient()).unwrap();
        assert!(periods.is_empty());
    }

    #[test]
    fn test_create_expires_previous_periods() {
        let gateway = InMemoryGateway::new();
        let first = gateway
            .create_cert_period(&patient(), date("2025-01-01"), date("2025-03-02"))
            .unwrap();
        let second = gateway
            .create_cert_period(&patient(), date("2025-03-03"), date("2025-05-02"))
            .unwrap();

        let periods = gateway.cert_periods(&patient()).unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(
            periods.iter().find(|w| w.id == first.id).unwrap().status,
            WindowStatus::Expired
        );
        assert_eq!(
            periods.iter().find(|w| w.id == second.id).unwrap().status,
            WindowStatus::Active
        );
    }

    #[test]
    fn test_assign_and_unassign_round_trip() {
        let gateway = InMemoryGateway::new();
        let pta = gateway.staff_with_role("PTA").unwrap();

        gateway.assign_staff(&patient(), &pta.id, "PTA").unwrap();
        let set = gateway.assigned_staff(&patient(), None).unwrap();
        assert_eq!(
            set.plan(Discipline::Pt).assigned_assistant.as_ref().unwrap().id,
            pta.id
        );

        gateway.unassign_staff(&patient(), "PTA").unwrap();
        let set = gateway.assigned_staff(&patient(), None).unwrap();
        assert!(set.plan(Discipline::Pt).assigned_assistant.is_none());
    }

    /// The OT assistant slot is addressed by the suffixed token "OTA",
    /// even though the directory role is "COTA".
    #[test]
    fn test_ota_token_reaches_the_cota_slot() {
        let gateway = InMemoryGateway::new();
        let cota = gateway.staff_with_role("COTA").unwrap();

        gateway.assign_staff(&patient(), &cota.id, "OTA").unwrap();
        let set = gateway.assigned_staff(&patient(), None).unwrap();
        assert_eq!(
            set.plan(Discipline::Ot).assigned_assistant.as_ref().unwrap().role,
            "COTA"
        );

        gateway.unassign_staff(&patient(), "OTA").unwrap();
        let set = gateway.assigned_staff(&patient(), None).unwrap();
        assert!(!set.plan(Discipline::Ot).is_active());
    }

    #[test]
    fn test_unknown_token_is_a_422() {
        let gateway = InMemoryGateway::new();
        let pt = gateway.staff_with_role("PT").unwrap();

        let result = gateway.assign_staff(&patient(), &pt.id, "COTA");
        assert!(matches!(
            result,
            Err(CarelogError::ApiStatus { status: 422, .. })
        ));
    }

    #[test]
    fn test_frequency_is_scoped_to_a_period() {
        let gateway = InMemoryGateway::new();
        let window = gateway
            .create_cert_period(&patient(), date("2025-01-01"), date("2025-03-02"))
            .unwrap();

        let mut fields = serde_json::Map::new();
        fields.insert(
            "pt_frequency".to_string(),
            serde_json::Value::String("3x/week".to_string()),
        );
        gateway.update_cert_period(&window.id, &fields).unwrap();

        let scoped = gateway.assigned_staff(&patient(), Some(&window.id)).unwrap();
        assert_eq!(scoped.plan(Discipline::Pt).frequency.as_deref(), Some("3x/week"));

        let unscoped = gateway.assigned_staff(&patient(), None).unwrap();
        assert!(unscoped.plan(Discipline::Pt).frequency.is_none());
    }

    /// Counters written through `update_patient` come back out of the
    /// entitlement fetch, with the last write winning.
    #[test]
    fn test_entitlements_replay_patient_updates() {
        let gateway = InMemoryGateway::new();
        gateway
            .update_patient(
                &patient(),
                &[
                    ("approved_pt".to_string(), "12".to_string()),
                    ("used_pt".to_string(), "3".to_string()),
                ],
            )
            .unwrap();
        gateway
            .update_patient(&patient(), &[("used_pt".to_string(), "12".to_string())])
            .unwrap();
        gateway
            .update_patient(&patient(), &[("status_pt".to_string(), "active".to_string())])
            .unwrap();

        let set = gateway.patient_entitlements(&patient()).unwrap();
        let record = set.record(Discipline::Pt);
        assert_eq!(record.approved.effective(), 12);
        assert_eq!(record.used.effective(), 12);
        // The stored manual override survives the refetch.
        assert_eq!(record.status, EntitlementStatus::Active);
    }

    #[test]
    fn test_scripted_failure_and_heal() {
        let gateway = InMemoryGateway::new();
        gateway.fail_on("list-staff");

        assert!(matches!(
            gateway.list_staff(),
            Err(CarelogError::Transport { .. })
        ));

        gateway.heal("list-staff");
        assert!(gateway.list_staff().is_ok());
    }

    #[test]
    fn test_assign_visit_requires_active_period() {
        let gateway = InMemoryGateway::new();
        let visit = VisitRef {
            id: VisitId::generate(),
            visit_date: date("2025-03-10"),
            discipline: Discipline::Pt,
            staff_id: None,
            note: None,
        };

        let result = gateway.assign_visit(&patient(), &visit);
        assert!(matches!(
            result,
            Err(CarelogError::ApiStatus { status: 422, .. })
        ));

        let window = gateway
            .create_cert_period(&patient(), date("2025-03-01"), date("2025-04-30"))
            .unwrap();
        let saved = gateway.assign_visit(&patient(), &visit).unwrap();
        assert_eq!(saved.id, VisitId::new("v-1"));

        let visits = gateway.visits_for_period(&window.id).unwrap();
        assert_eq!(visits.len(), 1);
    }
}
