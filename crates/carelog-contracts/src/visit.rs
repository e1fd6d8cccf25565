//! Scheduled visit projections.
//!
//! Visit lifecycle (notes, completion, signatures) belongs to the backend;
//! the store only holds the schedule slice so sibling views can stay in
//! sync after the schedule editor saves.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    discipline::Discipline,
    ids::{StaffId, VisitId},
};

/// One scheduled visit as the schedule view sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRef {
    pub id: VisitId,
    pub visit_date: NaiveDate,
    pub discipline: Discipline,
    pub staff_id: Option<StaffId>,
    pub note: Option<String>,
}
