//! HTTP implementation of `PracticeGateway`.
//!
//! A thin blocking `reqwest` client over the practice REST backend.  All
//! wire decoding lives in the `wire` module so the endpoint methods stay
//! one-screen simple and the decoders stay testable without a server.
//!
//! Error mapping follows the store's taxonomy: request failures become
//! `Transport`, non-2xx responses become `ApiStatus`, and unparsable
//! payloads become `Decode`.  The one special case: a 404 on the
//! certification-period fetch means "no data yet" and decodes to an empty
//! list.

use chrono::NaiveDate;
use tracing::debug;

use carelog_contracts::{
    error::{CarelogError, CarelogResult},
    ids::{PatientId, StaffId, WindowId},
    staff::StaffRef,
    staffing::StaffingSet,
    visit::VisitRef,
    window::CertificationWindow,
};
use carelog_store::traits::PracticeGateway;

use crate::settings::GatewaySettings;

// ── Wire decoding ─────────────────────────────────────────────────────────────

/// Decoders for the backend's JSON shapes.  This module is the single place
/// discipline-keyed wire fields (`assigned_pt`, `pt_frequency`, …) are
/// interpreted; nothing outside it string-builds property names.
pub mod wire {
    use serde::Deserialize;

    use carelog_contracts::{
        discipline::Discipline,
        entitlement::{CountField, EntitlementSet, EntitlementStatus},
        error::{CarelogError, CarelogResult},
        ids::{StaffId, VisitId, WindowId},
        staff::StaffRef,
        staffing::StaffingSet,
        visit::VisitRef,
        window::{CertificationWindow, WindowStatus},
    };

    /// Backend ids arrive as numbers or strings; both become strings here.
    fn id_string(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    #[derive(Debug, Deserialize)]
    struct WirePeriod {
        id: serde_json::Value,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        #[serde(default)]
        insurance: String,
        #[serde(default)]
        policy_number: String,
        #[serde(default)]
        agency: String,
        #[serde(default)]
        status: Option<String>,
    }

    impl From<WirePeriod> for CertificationWindow {
        fn from(p: WirePeriod) -> Self {
            CertificationWindow {
                id: WindowId::new(id_string(&p.id)),
                start_date: p.start_date,
                end_date: p.end_date,
                insurance: p.insurance,
                policy_number: p.policy_number,
                agency: p.agency,
                status: match p.status.as_deref() {
                    Some("active") => WindowStatus::Active,
                    _ => WindowStatus::Expired,
                },
                provisional: false,
            }
        }
    }

    #[derive(Debug, Deserialize)]
    struct WireStaff {
        id: serde_json::Value,
        #[serde(default)]
        name: String,
        #[serde(default)]
        email: String,
        #[serde(default)]
        phone: String,
        #[serde(default)]
        role: String,
    }

    impl From<WireStaff> for StaffRef {
        fn from(s: WireStaff) -> Self {
            StaffRef {
                id: StaffId::new(id_string(&s.id)),
                name: s.name,
                email: s.email,
                phone: s.phone,
                role: s.role,
            }
        }
    }

    #[derive(Debug, Deserialize)]
    struct WireVisit {
        id: serde_json::Value,
        visit_date: chrono::NaiveDate,
        discipline: String,
        #[serde(default)]
        staff_id: Option<serde_json::Value>,
        #[serde(default)]
        note: Option<String>,
    }

    /// Decode `GET /patient/{id}/cert-periods`.
    pub fn decode_periods(value: serde_json::Value) -> CarelogResult<Vec<CertificationWindow>> {
        let periods: Vec<WirePeriod> =
            serde_json::from_value(value).map_err(|e| CarelogError::Decode {
                reason: format!("certification period list: {}", e),
            })?;
        Ok(periods.into_iter().map(Into::into).collect())
    }

    /// Decode a single created period from `POST .../certification-period`.
    pub fn decode_period(value: serde_json::Value) -> CarelogResult<CertificationWindow> {
        let period: WirePeriod =
            serde_json::from_value(value).map_err(|e| CarelogError::Decode {
                reason: format!("certification period: {}", e),
            })?;
        Ok(period.into())
    }

    /// Decode `GET /staff/`.
    pub fn decode_staff_list(value: serde_json::Value) -> CarelogResult<Vec<StaffRef>> {
        let staff: Vec<WireStaff> =
            serde_json::from_value(value).map_err(|e| CarelogError::Decode {
                reason: format!("staff directory: {}", e),
            })?;
        Ok(staff.into_iter().map(Into::into).collect())
    }

    /// Decode `GET /patient/{id}/assigned-staff`.
    ///
    /// The backend keys assignments by role token (`assigned_pt`,
    /// `assigned_cota`, …) and frequencies by `{code}_frequency`; this is
    /// where those dynamic keys become the typed `StaffingSet`.
    pub fn decode_staffing(value: serde_json::Value) -> CarelogResult<StaffingSet> {
        let mut set = StaffingSet::default();

        for discipline in Discipline::ALL {
            let main_key = format!("assigned_{}", discipline.code().to_lowercase());
            let assistant_key =
                format!("assigned_{}", discipline.assistant_role().to_lowercase());

            let plan = set.plan_mut(discipline);

            if let Some(raw) = value.get(&main_key).filter(|v| !v.is_null()) {
                let staff: WireStaff = serde_json::from_value(raw.clone()).map_err(|e| {
                    CarelogError::Decode {
                        reason: format!("{}: {}", main_key, e),
                    }
                })?;
                plan.assigned_main = Some(staff.into());
            }

            if let Some(raw) = value.get(&assistant_key).filter(|v| !v.is_null()) {
                let staff: WireStaff = serde_json::from_value(raw.clone()).map_err(|e| {
                    CarelogError::Decode {
                        reason: format!("{}: {}", assistant_key, e),
                    }
                })?;
                plan.assigned_assistant = Some(staff.into());
            }

            if let Some(frequency) = value
                .get(&discipline.frequency_field())
                .and_then(|v| v.as_str())
            {
                plan.frequency = Some(frequency.to_string());
            }
        }

        Ok(set)
    }

    /// Decode the entitlement counters embedded in a patient payload
    /// (`approved_pt`, `used_pt`, `status_pt`, …). Absent counters keep
    /// their intake defaults.
    pub fn decode_entitlements(value: &serde_json::Value) -> EntitlementSet {
        let mut set = EntitlementSet::default();

        for discipline in Discipline::ALL {
            let code = discipline.code().to_lowercase();
            let record = set.record_mut(discipline);

            if let Some(n) = value.get(format!("approved_{}", code)).and_then(|v| v.as_u64()) {
                record.approved = CountField::Value(n as u32);
            }
            if let Some(n) = value.get(format!("used_{}", code)).and_then(|v| v.as_u64()) {
                record.used = CountField::Value(n as u32);
            }
            record.status = match value
                .get(format!("status_{}", code))
                .and_then(|v| v.as_str())
            {
                Some("active") => EntitlementStatus::Active,
                Some("no_more") => EntitlementStatus::NoMore,
                Some("waiting") => EntitlementStatus::Waiting,
                // No stored status: fall back to what the counters imply.
                _ => record.derived_status(),
            };
        }

        set
    }

    /// Decode `GET /visits/certperiod/{id}`.
    pub fn decode_visits(value: serde_json::Value) -> CarelogResult<Vec<VisitRef>> {
        let visits: Vec<WireVisit> =
            serde_json::from_value(value).map_err(|e| CarelogError::Decode {
                reason: format!("visit list: {}", e),
            })?;

        visits
            .into_iter()
            .map(|v| {
                let discipline = Discipline::from_code(&v.discipline).ok_or_else(|| {
                    CarelogError::Decode {
                        reason: format!("unknown visit discipline '{}'", v.discipline),
                    }
                })?;
                Ok(VisitRef {
                    id: VisitId::new(id_string(&v.id)),
                    visit_date: v.visit_date,
                    discipline,
                    staff_id: v.staff_id.map(|s| StaffId::new(id_string(&s))),
                    note: v.note,
                })
            })
            .collect()
    }

    /// Best-effort decode of a saved visit; falls back to the submitted one
    /// when the backend answers with an empty or unexpected body.
    pub fn decode_visit_or(value: serde_json::Value, fallback: &VisitRef) -> VisitRef {
        decode_visits(serde_json::Value::Array(vec![value]))
            .ok()
            .and_then(|mut v| v.pop())
            .unwrap_or_else(|| fallback.clone())
    }
}

// ── HTTP gateway ──────────────────────────────────────────────────────────────

/// `PracticeGateway` over HTTP, one blocking request per call, no retries.
pub struct HttpGateway {
    client: reqwest::blocking::Client,
    settings: GatewaySettings,
}

impl HttpGateway {
    /// Build a gateway from settings. Fails only if the underlying client
    /// cannot be constructed.
    pub fn new(settings: GatewaySettings) -> CarelogResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CarelogError::Config {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Send a request, mapping transport failures and non-2xx statuses into
    /// the store's error taxonomy.
    fn execute(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> CarelogResult<reqwest::blocking::Response> {
        let response = request.send().map_err(|e| CarelogError::Transport {
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(CarelogError::ApiStatus {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Read a response body as JSON. An empty body decodes to `null`.
    fn json_body(response: reqwest::blocking::Response) -> CarelogResult<serde_json::Value> {
        let text = response.text().map_err(|e| CarelogError::Transport {
            reason: e.to_string(),
        })?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| CarelogError::Decode {
            reason: format!("response body is not JSON: {}", e),
        })
    }
}

impl PracticeGateway for HttpGateway {
    fn list_staff(&self) -> CarelogResult<Vec<StaffRef>> {
        debug!("GET /staff/");
        let response = self.execute(self.client.get(self.url("/staff/")))?;
        wire::decode_staff_list(Self::json_body(response)?)
    }

    fn patient_entitlements(
        &self,
        patient: &PatientId,
    ) -> CarelogResult<carelog_contracts::entitlement::EntitlementSet> {
        let path = format!("/patients/{}", patient.0);
        debug!(%path, "GET patient");

        let response = self.execute(self.client.get(self.url(&path)))?;
        Ok(wire::decode_entitlements(&Self::json_body(response)?))
    }

    fn cert_periods(&self, patient: &PatientId) -> CarelogResult<Vec<CertificationWindow>> {
        let path = format!("/patient/{}/cert-periods", patient.0);
        debug!(%path, "GET cert periods");

        match self.execute(self.client.get(self.url(&path))) {
            Ok(response) => wire::decode_periods(Self::json_body(response)?),
            // 404 is "no data yet", not an error.
            Err(CarelogError::ApiStatus { status: 404, .. }) => Ok(vec![]),
            Err(e) => Err(e),
        }
    }

    fn create_cert_period(
        &self,
        patient: &PatientId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CarelogResult<CertificationWindow> {
        let path = format!("/patients/{}/certification-period", patient.0);
        debug!(%path, %start_date, %end_date, "POST certification period");

        let body = serde_json::json!({
            "start_date": start_date,
            "end_date": end_date,
        });
        let response = self.execute(self.client.post(self.url(&path)).json(&body))?;
        wire::decode_period(Self::json_body(response)?)
    }

    fn update_cert_period(
        &self,
        window: &WindowId,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> CarelogResult<()> {
        let path = format!("/cert-periods/{}", window.0);
        debug!(%path, field_count = fields.len(), "PUT cert period");

        self.execute(self.client.put(self.url(&path)).json(fields))?;
        Ok(())
    }

    fn delete_cert_period(&self, window: &WindowId) -> CarelogResult<()> {
        let path = format!("/cert-periods/{}", window.0);
        debug!(%path, "DELETE cert period");

        self.execute(self.client.delete(self.url(&path)))?;
        Ok(())
    }

    fn assigned_staff(
        &self,
        patient: &PatientId,
        cert_period: Option<&WindowId>,
    ) -> CarelogResult<StaffingSet> {
        let path = format!("/patient/{}/assigned-staff", patient.0);
        debug!(%path, scope = ?cert_period.map(|w| &w.0), "GET assigned staff");

        let mut request = self.client.get(self.url(&path));
        if let Some(window) = cert_period {
            request = request.query(&[("cert_period_id", window.0.as_str())]);
        }
        let response = self.execute(request)?;
        wire::decode_staffing(Self::json_body(response)?)
    }

    fn assign_staff(
        &self,
        patient: &PatientId,
        staff: &StaffId,
        discipline_token: &str,
    ) -> CarelogResult<()> {
        debug!(patient = %patient.0, staff = %staff.0, token = discipline_token, "POST assign staff");

        self.execute(self.client.post(self.url("/assign-staff")).query(&[
            ("patient_id", patient.0.as_str()),
            ("staff_id", staff.0.as_str()),
            ("discipline", discipline_token),
        ]))?;
        Ok(())
    }

    fn unassign_staff(&self, patient: &PatientId, discipline_token: &str) -> CarelogResult<()> {
        debug!(patient = %patient.0, token = discipline_token, "DELETE unassign staff");

        self.execute(self.client.delete(self.url("/unassign-staff")).query(&[
            ("patient_id", patient.0.as_str()),
            ("discipline", discipline_token),
        ]))?;
        Ok(())
    }

    fn update_patient(&self, patient: &PatientId, fields: &[(String, String)]) -> CarelogResult<()> {
        let path = format!("/patients/{}", patient.0);
        debug!(%path, field_count = fields.len(), "PUT patient");

        // Changed fields only, as query-string parameters.
        self.execute(self.client.put(self.url(&path)).query(fields))?;
        Ok(())
    }

    fn visits_for_period(&self, cert_period: &WindowId) -> CarelogResult<Vec<VisitRef>> {
        let path = format!("/visits/certperiod/{}", cert_period.0);
        debug!(%path, "GET visits");

        let response = self.execute(self.client.get(self.url(&path)))?;
        wire::decode_visits(Self::json_body(response)?)
    }

    fn assign_visit(&self, patient: &PatientId, visit: &VisitRef) -> CarelogResult<VisitRef> {
        debug!(patient = %patient.0, date = %visit.visit_date, "POST assign visit");

        let body = serde_json::json!({
            "patient_id": patient.0,
            "visit": visit,
        });
        let response = self.execute(self.client.post(self.url("/visits/assign")).json(&body))?;
        Ok(wire::decode_visit_or(Self::json_body(response)?, visit))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
