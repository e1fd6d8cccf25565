//! # carelog-contracts
//!
//! Shared types, events, and error contracts for the carelog
//! practice-coordination core.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, derived accessors, and error types.

pub mod change;
pub mod discipline;
pub mod entitlement;
pub mod error;
pub mod ids;
pub mod intent;
pub mod screen;
pub mod staff;
pub mod staffing;
pub mod visit;
pub mod window;

#[cfg(test)]
mod tests {
    use super::*;
    use discipline::{Discipline, SlotKind};
    use entitlement::{CountField, EntitlementSet, EntitlementStatus};
    use error::CarelogError;
    use intent::Intent;
    use staff::{format_phone, normalize_phone};
    use window::RemainingBand;

    // ── Discipline tokens ────────────────────────────────────────────────────

    #[test]
    fn discipline_codes_and_assistant_roles() {
        assert_eq!(Discipline::Pt.code(), "PT");
        assert_eq!(Discipline::Ot.code(), "OT");
        assert_eq!(Discipline::St.code(), "ST");

        assert_eq!(Discipline::Pt.assistant_role(), "PTA");
        assert_eq!(Discipline::Ot.assistant_role(), "COTA");
        assert_eq!(Discipline::St.assistant_role(), "STA");
    }

    /// The unassign endpoint token is code + "A" for assistants. The OT
    /// assistant therefore goes over the wire as "OTA", not "COTA".
    #[test]
    fn slot_tokens_append_a_for_assistants() {
        assert_eq!(Discipline::Pt.slot_token(SlotKind::Main), "PT");
        assert_eq!(Discipline::Pt.slot_token(SlotKind::Assistant), "PTA");
        assert_eq!(Discipline::Ot.slot_token(SlotKind::Assistant), "OTA");
        assert_eq!(Discipline::St.slot_token(SlotKind::Assistant), "STA");
    }

    #[test]
    fn frequency_field_keys_are_lowercased() {
        assert_eq!(Discipline::Pt.frequency_field(), "pt_frequency");
        assert_eq!(Discipline::Ot.frequency_field(), "ot_frequency");
        assert_eq!(Discipline::St.frequency_field(), "st_frequency");
    }

    #[test]
    fn discipline_from_code_is_case_insensitive() {
        assert_eq!(Discipline::from_code("pt"), Some(Discipline::Pt));
        assert_eq!(Discipline::from_code("OT"), Some(Discipline::Ot));
        assert_eq!(Discipline::from_code("St"), Some(Discipline::St));
        assert_eq!(Discipline::from_code("PTA"), None);
    }

    // ── CountField parsing ───────────────────────────────────────────────────

    #[test]
    fn count_field_empty_string_stays_blank() {
        assert_eq!(CountField::parse(""), CountField::Blank);
        assert_eq!(CountField::parse("   "), CountField::Blank);
        assert_eq!(CountField::Blank.effective(), 0);
    }

    /// Malformed numeric input silently becomes 0 — the parseInt(x) || 0
    /// fallback preserved exactly.
    #[test]
    fn count_field_malformed_input_becomes_zero() {
        assert_eq!(CountField::parse("abc"), CountField::Value(0));
        assert_eq!(CountField::parse("-3"), CountField::Value(0));
        assert_eq!(CountField::parse("12"), CountField::Value(12));
    }

    // ── Status serde spellings ───────────────────────────────────────────────

    #[test]
    fn entitlement_status_round_trips_with_snake_case() {
        for (status, wire) in [
            (EntitlementStatus::Waiting, "\"waiting\""),
            (EntitlementStatus::Active, "\"active\""),
            (EntitlementStatus::NoMore, "\"no_more\""),
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, wire);
            let decoded: EntitlementStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(decoded, status);
        }
    }

    #[test]
    fn entitlement_set_seeds_all_disciplines_waiting() {
        let set = EntitlementSet::default();
        for d in Discipline::ALL {
            let record = set.record(d);
            assert_eq!(record.approved.effective(), 0);
            assert_eq!(record.used.effective(), 0);
            assert_eq!(record.status, EntitlementStatus::Waiting);
        }
    }

    // ── Intent discriminants ─────────────────────────────────────────────────

    /// `Intent::kind()` must match the serde tag spelling — journals and
    /// screening schemas key on it.
    #[test]
    fn intent_kind_matches_serde_tag() {
        let intent = Intent::SetApproved {
            discipline: Discipline::Pt,
            raw: "12".to_string(),
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["kind"], intent.kind());

        let intent = Intent::RefreshStaffing;
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["kind"], intent.kind());
    }

    // ── Remaining-days bands ─────────────────────────────────────────────────

    #[test]
    fn remaining_band_thresholds() {
        assert_eq!(RemainingBand::classify(0), RemainingBand::Red);
        assert_eq!(RemainingBand::classify(11), RemainingBand::Red);
        assert_eq!(RemainingBand::classify(12), RemainingBand::Amber);
        assert_eq!(RemainingBand::classify(29), RemainingBand::Amber);
        assert_eq!(RemainingBand::classify(30), RemainingBand::Green);
        assert_eq!(RemainingBand::classify(60), RemainingBand::Green);
    }

    // ── Phone normalization ──────────────────────────────────────────────────

    #[test]
    fn phone_normalizes_to_ten_digits() {
        assert_eq!(normalize_phone("(555) 123-4567"), "5551234567");
        assert_eq!(normalize_phone("1-555-123-4567"), "5551234567");
        assert_eq!(normalize_phone("555.123.4567"), "5551234567");
    }

    #[test]
    fn phone_formats_for_display_and_round_trips() {
        let formatted = format_phone("5551234567");
        assert_eq!(formatted, "(555) 123-4567");
        assert_eq!(normalize_phone(&formatted), "5551234567");
    }

    /// Display formatting never destroys input it cannot parse.
    #[test]
    fn phone_format_leaves_unparsable_input_alone() {
        assert_eq!(format_phone("ext. 42"), "ext. 42");
        assert_eq!(format_phone("12345"), "12345");
    }

    // ── Error display messages ───────────────────────────────────────────────

    #[test]
    fn error_api_status_display() {
        let err = CarelogError::ApiStatus {
            status: 422,
            body: "missing start_date".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("missing start_date"));
    }

    #[test]
    fn error_timeline_rule_display() {
        let err = CarelogError::TimelineRule {
            reason: "cannot delete the only certification period".to_string(),
        };
        assert!(err.to_string().contains("timeline rule violation"));
    }

    #[test]
    fn error_journal_write_display() {
        let err = CarelogError::JournalWriteFailed {
            reason: "lock poisoned".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("journal write failed"));
        assert!(msg.contains("lock poisoned"));
    }

    // ── Provisional window ids ───────────────────────────────────────────────

    #[test]
    fn provisional_ids_are_unique_and_flagged() {
        let a = ids::WindowId::provisional();
        let b = ids::WindowId::provisional();
        assert_ne!(a, b);
        assert!(a.is_provisional());
        assert!(!ids::WindowId::new("cp-12").is_provisional());
    }
}
