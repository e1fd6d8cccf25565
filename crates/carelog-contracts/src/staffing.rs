//! Per-discipline staffing plans: assigned therapists and visit frequency.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{discipline::Discipline, staff::StaffRef};

/// Staff assignments and visit frequency for one discipline.
///
/// The plan is rebuilt from a backend fetch after every mutation — there is
/// no optimistic merge, so these fields always reflect the last fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitFrequencyPlan {
    /// Primary therapist (PT/OT/ST).
    pub assigned_main: Option<StaffRef>,
    /// Assistant therapist (PTA/COTA/STA).
    pub assigned_assistant: Option<StaffRef>,
    /// Free-text schedule token, e.g. `"3x/week"`. Presets are offered as
    /// suggestions only; any text is accepted.
    pub frequency: Option<String>,
}

impl VisitFrequencyPlan {
    /// A discipline is active for the patient once either slot is filled.
    pub fn is_active(&self) -> bool {
        self.assigned_main.is_some() || self.assigned_assistant.is_some()
    }
}

/// The full staffing slice: one plan per discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingSet {
    pub plans: BTreeMap<Discipline, VisitFrequencyPlan>,
}

impl Default for StaffingSet {
    fn default() -> Self {
        let plans = Discipline::ALL
            .iter()
            .map(|d| (*d, VisitFrequencyPlan::default()))
            .collect();
        Self { plans }
    }
}

impl StaffingSet {
    pub fn plan(&self, discipline: Discipline) -> &VisitFrequencyPlan {
        &self.plans[&discipline]
    }

    pub fn plan_mut(&mut self, discipline: Discipline) -> &mut VisitFrequencyPlan {
        self.plans.entry(discipline).or_default()
    }

    /// Disciplines currently active (either slot assigned), in display order.
    pub fn active_disciplines(&self) -> Vec<Discipline> {
        Discipline::ALL
            .iter()
            .copied()
            .filter(|d| self.plan(*d).is_active())
            .collect()
    }
}
