//! Certification timeline state machine and window progress math.
//!
//! The timeline owns a patient's certification windows and maintains the
//! single invariant the rest of the system leans on: at most one window is
//! `Active` at a time.
//!
//! Transitions:
//!   add(w)            → every existing window becomes Expired, w enters Active
//!   select(id)        → id becomes Active, all others Expired
//!   delete(non-active)→ no transitions
//!   delete(active)    → survivor with the latest end date becomes Active
//!
//! Deleting is only legal while at least two windows exist.

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use carelog_contracts::{
    error::{CarelogError, CarelogResult},
    ids::WindowId,
    window::{CertificationWindow, Progress, WindowStatus},
};

/// Certification periods default to 60 calendar days.
pub const DEFAULT_WINDOW_DAYS: i64 = 60;

/// The end date a new or re-dated window defaults to: start + 60 calendar
/// days. Windows fetched from the backend keep their explicit end dates and
/// are never re-derived.
pub fn default_end_date(start_date: NaiveDate) -> NaiveDate {
    start_date + Duration::days(DEFAULT_WINDOW_DAYS)
}

/// Compute elapsed/remaining metrics for a window at `today`.
///
/// Pure function of `(start_date, end_date, today)`. The boundary is exact:
/// `today == end_date` is NOT "past the end" — it takes the in-range branch
/// and yields `days_remaining = 0, percentage = 100`.
pub fn progress(window: &CertificationWindow, today: NaiveDate) -> Progress {
    let total_days = (window.end_date - window.start_date).num_days();

    if today > window.end_date {
        return Progress {
            percentage: 100,
            days_remaining: 0,
            days_elapsed: total_days,
        };
    }
    if today < window.start_date {
        return Progress {
            percentage: 0,
            days_remaining: total_days,
            days_elapsed: 0,
        };
    }

    let days_remaining = (window.end_date - today).num_days();
    let days_elapsed = total_days - days_remaining;
    let percentage = if total_days > 0 {
        ((days_elapsed as f64 / total_days as f64) * 100.0).round() as u32
    } else {
        // Zero-length window inside its own range: fully elapsed.
        100
    };

    Progress {
        percentage,
        days_remaining,
        days_elapsed,
    }
}

/// A patient's ordered set of certification windows.
#[derive(Debug, Clone, Default)]
pub struct CertificationTimeline {
    windows: Vec<CertificationWindow>,
}

impl CertificationTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt windows fetched from the backend verbatim — statuses and end
    /// dates are the backend's to own.
    pub fn from_fetched(windows: Vec<CertificationWindow>) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &[CertificationWindow] {
        &self.windows
    }

    /// Clone the slice for a full-replacement broadcast.
    pub fn snapshot(&self) -> Vec<CertificationWindow> {
        self.windows.clone()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// The currently active window, if any.
    pub fn active(&self) -> Option<&CertificationWindow> {
        self.windows.iter().find(|w| w.status == WindowStatus::Active)
    }

    pub fn active_id(&self) -> Option<WindowId> {
        self.active().map(|w| w.id.clone())
    }

    pub fn get(&self, id: &WindowId) -> Option<&CertificationWindow> {
        self.windows.iter().find(|w| w.id == *id)
    }

    /// Add a new window. Every existing window expires; the newcomer enters
    /// active regardless of the status it arrived with.
    pub fn add(&mut self, mut window: CertificationWindow) {
        for existing in &mut self.windows {
            existing.status = WindowStatus::Expired;
        }
        window.status = WindowStatus::Active;
        info!(
            window = %window.id.0,
            start = %window.start_date,
            end = %window.end_date,
            provisional = window.provisional,
            "certification window added"
        );
        self.windows.push(window);
    }

    /// Make a historical window the active one; all others expire.
    pub fn select(&mut self, id: &WindowId) -> CarelogResult<()> {
        if self.get(id).is_none() {
            return Err(CarelogError::TimelineRule {
                reason: format!("unknown certification period '{}'", id.0),
            });
        }
        for window in &mut self.windows {
            window.status = if window.id == *id {
                WindowStatus::Active
            } else {
                WindowStatus::Expired
            };
        }
        debug!(window = %id.0, "certification window selected");
        Ok(())
    }

    /// Delete a window.
    ///
    /// Only legal while at least two windows exist. Deleting the active
    /// window promotes the survivor with the latest end date; deleting an
    /// expired one changes nothing else.
    pub fn delete(&mut self, id: &WindowId) -> CarelogResult<()> {
        let index = self
            .windows
            .iter()
            .position(|w| w.id == *id)
            .ok_or_else(|| CarelogError::TimelineRule {
                reason: format!("unknown certification period '{}'", id.0),
            })?;

        if self.windows.len() < 2 {
            return Err(CarelogError::TimelineRule {
                reason: "cannot delete the only certification period".to_string(),
            });
        }

        let removed = self.windows.remove(index);
        if removed.status == WindowStatus::Active {
            self.promote_latest();
            info!(
                deleted = %removed.id.0,
                promoted = ?self.active_id().map(|w| w.0),
                "active certification window deleted"
            );
        } else {
            debug!(deleted = %removed.id.0, "expired certification window deleted");
        }
        Ok(())
    }

    /// Promote the window with the maximum end date to active; everything
    /// else expires.
    fn promote_latest(&mut self) {
        let latest = self
            .windows
            .iter()
            .enumerate()
            .max_by_key(|(_, w)| w.end_date)
            .map(|(i, _)| i);

        if let Some(promoted) = latest {
            for (i, window) in self.windows.iter_mut().enumerate() {
                window.status = if i == promoted {
                    WindowStatus::Active
                } else {
                    WindowStatus::Expired
                };
            }
        }
    }

    /// Count of active windows — the invariant says this is ≤ 1 always,
    /// and exactly 1 whenever the timeline is non-empty and started valid.
    pub fn active_count(&self) -> usize {
        self.windows
            .iter()
            .filter(|w| w.status == WindowStatus::Active)
            .count()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
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

    // ── Default end date ─────────────────────────────────────────────────────

    /// The default end date is exactly start + 60 calendar days.
    #[test]
    fn default_end_date_is_sixty_calendar_days() {
        assert_eq!(default_end_date(date("2025-02-15")), date("2025-04-16"));
        assert_eq!(default_end_date(date("2025-01-01")), date("2025-03-02"));
        // Leap year February.
        assert_eq!(default_end_date(date("2024-01-15")), date("2024-03-15"));
    }

    // ── Progress math ────────────────────────────────────────────────────────

    #[test]
    fn progress_before_start() {
        let w = window("a", "2025-03-01", "2025-04-30", WindowStatus::Active);
        let p = progress(&w, date("2025-02-01"));
        assert_eq!(p.percentage, 0);
        assert_eq!(p.days_elapsed, 0);
        assert_eq!(p.days_remaining, 60);
    }

    #[test]
    fn progress_after_end() {
        let w = window("a", "2025-03-01", "2025-04-30", WindowStatus::Active);
        let p = progress(&w, date("2025-05-15"));
        assert_eq!(p.percentage, 100);
        assert_eq!(p.days_remaining, 0);
        assert_eq!(p.days_elapsed, 60);
    }

    #[test]
    fn progress_mid_window() {
        let w = window("a", "2025-01-01", "2025-03-02", WindowStatus::Active);
        let p = progress(&w, date("2025-01-31"));
        assert_eq!(p.days_elapsed, 30);
        assert_eq!(p.days_remaining, 30);
        assert_eq!(p.percentage, 50);
    }

    /// today == end_date takes the in-range branch: remaining 0, 100%.
    /// The comparison is strict — equality is not "past the end".
    #[test]
    fn progress_on_end_date_boundary() {
        let w = window("a", "2025-01-01", "2025-03-02", WindowStatus::Active);
        let p = progress(&w, date("2025-03-02"));
        assert_eq!(p.days_remaining, 0);
        assert_eq!(p.days_elapsed, 60);
        assert_eq!(p.percentage, 100);
    }

    /// progress is a pure function: identical inputs, identical outputs.
    #[test]
    fn progress_is_idempotent() {
        let w = window("a", "2025-01-01", "2025-03-02", WindowStatus::Active);
        let today = date("2025-02-10");
        assert_eq!(progress(&w, today), progress(&w, today));
    }

    // ── Timeline transitions ─────────────────────────────────────────────────

    #[test]
    fn add_expires_existing_windows() {
        let mut timeline = CertificationTimeline::new();
        timeline.add(window("a", "2025-01-01", "2025-03-02", WindowStatus::Active));
        timeline.add(window("b", "2025-03-03", "2025-05-02", WindowStatus::Expired));

        assert_eq!(timeline.active_count(), 1);
        assert_eq!(timeline.active_id(), Some(WindowId::new("b")));
        assert_eq!(timeline.get(&WindowId::new("a")).unwrap().status, WindowStatus::Expired);
    }

    #[test]
    fn select_activates_exactly_one() {
        let mut timeline = CertificationTimeline::new();
        timeline.add(window("a", "2025-01-01", "2025-03-02", WindowStatus::Active));
        timeline.add(window("b", "2025-03-03", "2025-05-02", WindowStatus::Active));

        timeline.select(&WindowId::new("a")).unwrap();
        assert_eq!(timeline.active_count(), 1);
        assert_eq!(timeline.active_id(), Some(WindowId::new("a")));
    }

    #[test]
    fn select_unknown_window_is_an_error() {
        let mut timeline = CertificationTimeline::new();
        timeline.add(window("a", "2025-01-01", "2025-03-02", WindowStatus::Active));

        let result = timeline.select(&WindowId::new("ghost"));
        assert!(matches!(result, Err(CarelogError::TimelineRule { .. })));
    }

    /// Deleting the active window among A(end 5/1), B(end 6/1), C(end 4/1)
    /// promotes B — the survivor with the maximum end date.
    #[test]
    fn delete_active_promotes_latest_end_date() {
        let mut timeline = CertificationTimeline::from_fetched(vec![
            window("a", "2025-03-01", "2025-05-01", WindowStatus::Active),
            window("b", "2025-04-01", "2025-06-01", WindowStatus::Expired),
            window("c", "2025-02-01", "2025-04-01", WindowStatus::Expired),
        ]);

        timeline.delete(&WindowId::new("a")).unwrap();

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.active_count(), 1);
        assert_eq!(timeline.active_id(), Some(WindowId::new("b")));
    }

    #[test]
    fn delete_expired_window_changes_no_statuses() {
        let mut timeline = CertificationTimeline::from_fetched(vec![
            window("a", "2025-03-01", "2025-05-01", WindowStatus::Active),
            window("b", "2025-01-01", "2025-03-01", WindowStatus::Expired),
        ]);

        timeline.delete(&WindowId::new("b")).unwrap();
        assert_eq!(timeline.active_id(), Some(WindowId::new("a")));
        assert_eq!(timeline.active_count(), 1);
    }

    #[test]
    fn delete_only_window_is_rejected() {
        let mut timeline = CertificationTimeline::new();
        timeline.add(window("a", "2025-01-01", "2025-03-02", WindowStatus::Active));

        let result = timeline.delete(&WindowId::new("a"));
        assert!(matches!(result, Err(CarelogError::TimelineRule { .. })));
        assert_eq!(timeline.len(), 1, "the window must survive the rejected delete");
    }

    /// From a valid single-active state, any add/select/delete sequence
    /// keeps exactly one window active.
    #[test]
    fn exactly_one_active_through_mixed_sequence() {
        let mut timeline = CertificationTimeline::new();
        timeline.add(window("a", "2025-01-01", "2025-03-02", WindowStatus::Active));
        assert_eq!(timeline.active_count(), 1);

        timeline.add(window("b", "2025-03-03", "2025-05-02", WindowStatus::Expired));
        assert_eq!(timeline.active_count(), 1);

        timeline.select(&WindowId::new("a")).unwrap();
        assert_eq!(timeline.active_count(), 1);

        timeline.add(window("c", "2025-05-03", "2025-07-02", WindowStatus::Expired));
        assert_eq!(timeline.active_count(), 1);

        timeline.delete(&WindowId::new("c")).unwrap();
        assert_eq!(timeline.active_count(), 1);

        timeline.delete(&WindowId::new("b")).unwrap();
        assert_eq!(timeline.active_count(), 1);
        assert_eq!(timeline.active_id(), Some(WindowId::new("a")));
    }
}
