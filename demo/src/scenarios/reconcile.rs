//! Scenario 2: Entitlement Reconciliation
//!
//! Walks the medical-info view's edits through the store: approved/used
//! counts with central status derivation, then a manual override that
//! contradicts the counters — applied as the source allows, but flagged in
//! the journal as a data-quality signal.

use carelog_contracts::{
    discipline::Discipline,
    entitlement::EntitlementStatus,
    error::CarelogResult,
    intent::Intent,
};

use super::wired_store;

pub fn run_scenario() -> CarelogResult<()> {
    println!("=== Scenario 2: Entitlement Reconciliation ===");
    println!();

    let (mut store, _gateway, journal) = wired_store("patient-102");

    // ── Standard path: counts drive the status ────────────────────────────────

    store.dispatch(Intent::SetApproved {
        discipline: Discipline::Pt,
        raw: "12".to_string(),
    })?;
    store.dispatch(Intent::SetUsed {
        discipline: Discipline::Pt,
        raw: "3".to_string(),
    })?;

    let record = store.entitlements().record(Discipline::Pt);
    println!("  PT approved 12, used 3:");
    println!(
        "    status {} | remaining {} | utilization {}%",
        record.status,
        record.remaining(),
        record.utilization_percent()
    );

    store.dispatch(Intent::SetUsed {
        discipline: Discipline::Pt,
        raw: "12".to_string(),
    })?;
    let record = store.entitlements().record(Discipline::Pt);
    println!("  PT used raised to 12:");
    println!(
        "    status {} | remaining {} | utilization {}%",
        record.status,
        record.remaining(),
        record.utilization_percent()
    );

    // ── Cleared input stays blank, derives as zero ────────────────────────────

    store.dispatch(Intent::SetApproved {
        discipline: Discipline::Ot,
        raw: "".to_string(),
    })?;
    let record = store.entitlements().record(Discipline::Ot);
    println!(
        "  OT approved cleared:    blank kept in state, status {}",
        record.status
    );

    // ── Manual override against the counters ──────────────────────────────────

    store.dispatch(Intent::OverrideStatus {
        discipline: Discipline::Pt,
        status: EntitlementStatus::Active,
    })?;
    let record = store.entitlements().record(Discipline::Pt);
    println!("  PT manually set active while fully consumed:");
    println!("    status {} (override applied, never re-validated)", record.status);

    let flagged = journal.flagged_overrides();
    println!("  Journal review queue:   {} flagged override(s)", flagged.len());
    for record in &flagged {
        println!("    - {}", record.summary);
    }
    println!("  Journal chain valid:    {}", journal.verify_integrity());

    println!();
    println!("  Scenario 2 complete.");
    println!();
    Ok(())
}
