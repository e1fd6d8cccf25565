//! Therapy disciplines and staffing slots.
//!
//! The backend speaks in string tokens (`"PT"`, `"PTA"`, `"OTA"`, …); this
//! module is the single place those tokens are built, so no other crate
//! string-concatenates discipline names.

use serde::{Deserialize, Serialize};

/// The three therapy disciplines a patient can be certified for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Discipline {
    /// Physical Therapy.
    Pt,
    /// Occupational Therapy.
    Ot,
    /// Speech Therapy.
    St,
}

/// Which staffing slot of a discipline an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// Primary therapist (PT/OT/ST).
    Main,
    /// Assistant therapist (PTA/COTA/STA).
    Assistant,
}

impl Discipline {
    /// All disciplines in stable display order.
    pub const ALL: [Discipline; 3] = [Discipline::Pt, Discipline::Ot, Discipline::St];

    /// The wire code for the discipline itself: `"PT"`, `"OT"`, `"ST"`.
    pub fn code(&self) -> &'static str {
        match self {
            Discipline::Pt => "PT",
            Discipline::Ot => "OT",
            Discipline::St => "ST",
        }
    }

    /// The staff-directory role held by this discipline's assistant:
    /// `"PTA"`, `"COTA"`, `"STA"`.
    pub fn assistant_role(&self) -> &'static str {
        match self {
            Discipline::Pt => "PTA",
            Discipline::Ot => "COTA",
            Discipline::St => "STA",
        }
    }

    /// The discipline-role token the assign/unassign endpoints expect.
    ///
    /// Main slots use the bare code; assistant slots append `A` to the code.
    /// Note the OT assistant therefore unassigns as `"OTA"` even though the
    /// staff-directory role is `"COTA"` — the backend contract, preserved.
    pub fn slot_token(&self, slot: SlotKind) -> String {
        match slot {
            SlotKind::Main => self.code().to_string(),
            SlotKind::Assistant => format!("{}A", self.code()),
        }
    }

    /// The partial-update field key that carries this discipline's visit
    /// frequency on a certification period: `"pt_frequency"`, etc.
    pub fn frequency_field(&self) -> String {
        format!("{}_frequency", self.code().to_lowercase())
    }

    /// Parse a wire code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Discipline> {
        match code.to_uppercase().as_str() {
            "PT" => Some(Discipline::Pt),
            "OT" => Some(Discipline::Ot),
            "ST" => Some(Discipline::St),
            _ => None,
        }
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
