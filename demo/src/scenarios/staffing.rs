//! Scenario 4: Staffing
//!
//! Drives the disciplines view: assigning main and assistant therapists by
//! slot token, setting a visit frequency scoped to the active certification
//! period, and unassigning with the suffixed token scheme. Every mutation
//! is followed by a full refetch — the slice always mirrors the backend.

use carelog_contracts::{
    discipline::{Discipline, SlotKind},
    error::CarelogResult,
    intent::{Intent, Outcome},
};

use super::wired_store;

pub fn run_scenario() -> CarelogResult<()> {
    println!("=== Scenario 4: Staffing ===");
    println!();

    let (mut store, gateway, _journal) = wired_store("patient-104");

    // ── Frequency with no period in scope: defined no-op ──────────────────────

    let outcome = store.dispatch(Intent::SetFrequency {
        discipline: Discipline::Pt,
        frequency: "3x/week".to_string(),
    })?;
    match outcome {
        Outcome::Ignored { reason } => {
            println!("  Frequency before any period: ignored ({})", reason);
        }
        other => println!("  Unexpected outcome: {:?}", other),
    }

    // ── Open a period so frequency edits have somewhere to live ───────────────

    store.dispatch(Intent::AddWindow {
        start_date: "2025-03-01".parse().expect("demo dates are literal ISO dates"),
        end_date: None,
        insurance: "Blue Shield PPO".to_string(),
        policy_number: "BSP-4417".to_string(),
        agency: "Harbor Home Health".to_string(),
    })?;

    // ── Assign PT main + assistant ────────────────────────────────────────────

    let (Some(pt), Some(pta), Some(cota)) = (
        gateway.staff_with_role("PT"),
        gateway.staff_with_role("PTA"),
        gateway.staff_with_role("COTA"),
    ) else {
        println!("  Seeded directory is missing expected roles; aborting scenario.");
        return Ok(());
    };

    store.dispatch(Intent::AssignStaff {
        discipline: Discipline::Pt,
        slot: SlotKind::Main,
        staff_id: pt.id.clone(),
    })?;
    store.dispatch(Intent::AssignStaff {
        discipline: Discipline::Pt,
        slot: SlotKind::Assistant,
        staff_id: pta.id.clone(),
    })?;

    let plan = store.staffing().plan(Discipline::Pt);
    println!(
        "  PT staffed:             {} + {} (active: {})",
        pt.name,
        pta.name,
        plan.is_active()
    );

    // ── Frequency now persists onto the period ────────────────────────────────

    store.dispatch(Intent::SetFrequency {
        discipline: Discipline::Pt,
        frequency: "3x/week".to_string(),
    })?;
    let plan = store.staffing().plan(Discipline::Pt);
    println!(
        "  PT frequency:           {}",
        plan.frequency.as_deref().unwrap_or("(none)")
    );

    // ── The OTA token quirk ───────────────────────────────────────────────────

    store.dispatch(Intent::AssignStaff {
        discipline: Discipline::Ot,
        slot: SlotKind::Assistant,
        staff_id: cota.id.clone(),
    })?;
    println!(
        "  OT assistant assigned:  {} (directory role COTA, wire token {})",
        cota.name,
        Discipline::Ot.slot_token(SlotKind::Assistant)
    );

    store.dispatch(Intent::UnassignStaff {
        discipline: Discipline::Ot,
        slot: SlotKind::Assistant,
    })?;
    let plan = store.staffing().plan(Discipline::Ot);
    println!("  OT after unassign:      active: {}", plan.is_active());

    println!(
        "  Active disciplines:     {:?}",
        store
            .staffing()
            .active_disciplines()
            .iter()
            .map(|d| d.code())
            .collect::<Vec<_>>()
    );

    println!();
    println!("  Scenario 4 complete.");
    println!();
    Ok(())
}
