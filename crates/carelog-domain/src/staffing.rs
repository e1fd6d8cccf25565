//! Staffing directory rules: who can fill which slot.
//!
//! The staff directory arrives as a flat list; these helpers express the
//! role filters the disciplines view applies before offering candidates.
//! Note the asymmetry with the wire tokens: directory filtering uses the
//! staff role (`COTA` for the OT assistant), while the assign/unassign
//! endpoints use the suffixed code (`OTA`).

use carelog_contracts::{
    discipline::{Discipline, SlotKind},
    staff::StaffRef,
};

/// Directory entries holding exactly the given role token.
pub fn with_role<'a>(directory: &'a [StaffRef], role: &str) -> Vec<&'a StaffRef> {
    directory.iter().filter(|s| s.role == role).collect()
}

/// Directory entries representing agencies rather than therapists.
pub fn agency_entries(directory: &[StaffRef]) -> Vec<&StaffRef> {
    with_role(directory, "agency")
}

/// Candidates eligible for a discipline slot: the discipline code for the
/// main slot, the assistant role for the assistant slot.
pub fn candidates_for(
    directory: &[StaffRef],
    discipline: Discipline,
    slot: SlotKind,
) -> Vec<&StaffRef> {
    let role = match slot {
        SlotKind::Main => discipline.code(),
        SlotKind::Assistant => discipline.assistant_role(),
    };
    with_role(directory, role)
}

/// Look up a directory entry by id.
pub fn find_by_id<'a>(directory: &'a [StaffRef], id: &carelog_contracts::ids::StaffId) -> Option<&'a StaffRef> {
    directory.iter().find(|s| s.id == *id)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_contracts::ids::StaffId;

    fn staff(id: &str, name: &str, role: &str) -> StaffRef {
        StaffRef {
            id: StaffId::new(id),
            name: name.to_string(),
            email: format!("{}@harborhh.example", id),
            phone: "5551234567".to_string(),
            role: role.to_string(),
        }
    }

    fn directory() -> Vec<StaffRef> {
        vec![
            staff("s-01", "M. Okafor", "PT"),
            staff("s-02", "J. Reyes", "PTA"),
            staff("s-03", "L. Tran", "OT"),
            staff("s-04", "K. Whitfield", "COTA"),
            staff("s-05", "A. Dimas", "ST"),
            staff("s-06", "Harbor Home Health", "agency"),
        ]
    }

    #[test]
    fn main_slot_candidates_match_discipline_code() {
        let dir = directory();
        let pts = candidates_for(&dir, Discipline::Pt, SlotKind::Main);
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].name, "M. Okafor");
    }

    /// The OT assistant slot filters by the COTA staff role, even though the
    /// unassign endpoint token for that slot is "OTA".
    #[test]
    fn ot_assistant_candidates_use_cota_role() {
        let dir = directory();
        let cotas = candidates_for(&dir, Discipline::Ot, SlotKind::Assistant);
        assert_eq!(cotas.len(), 1);
        assert_eq!(cotas[0].role, "COTA");
        assert_eq!(Discipline::Ot.slot_token(SlotKind::Assistant), "OTA");
    }

    #[test]
    fn agency_entries_are_filtered_out_of_therapist_slots() {
        let dir = directory();
        assert_eq!(agency_entries(&dir).len(), 1);
        let sts = candidates_for(&dir, Discipline::St, SlotKind::Assistant);
        assert!(sts.is_empty(), "no STA in the directory");
    }

    #[test]
    fn find_by_id_resolves() {
        let dir = directory();
        assert!(find_by_id(&dir, &StaffId::new("s-03")).is_some());
        assert!(find_by_id(&dir, &StaffId::new("nope")).is_none());
    }
}
