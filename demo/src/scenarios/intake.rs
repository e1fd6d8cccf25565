//! Scenario 1: Patient Intake
//!
//! Opens a patient page, creates the initial certification window with the
//! 60-day default end date, shows the progress metrics and urgency band,
//! then demonstrates the provisional-window fallback when the backend
//! refuses the create call.

use chrono::Utc;

use carelog_contracts::{
    error::CarelogResult,
    intent::{Intent, Outcome},
    window::RemainingBand,
};
use carelog_domain::{progress, staffing as directory};
use carelog_store::traits::PracticeGateway;

use super::wired_store;

pub fn run_scenario() -> CarelogResult<()> {
    println!("=== Scenario 1: Patient Intake ===");
    println!();

    let (mut store, gateway, journal) = wired_store("patient-101");

    // ── Hydrate an empty page ─────────────────────────────────────────────────

    let events = store.hydrate();
    println!("  Hydrated patient-101: {} slice broadcast(s), no periods yet", events.len());

    // ── Staff directory ───────────────────────────────────────────────────────

    let staff = gateway.list_staff()?;
    let pts = directory::candidates_for(&staff, carelog_contracts::discipline::Discipline::Pt, carelog_contracts::discipline::SlotKind::Main);
    let agencies = directory::agency_entries(&staff);
    println!("  Staff directory:        {} entries ({} PT, {} agency)", staff.len(), pts.len(), agencies.len());

    // ── First certification window, end date defaulted ────────────────────────

    let today = Utc::now().date_naive();
    store.dispatch(Intent::AddWindow {
        start_date: today,
        end_date: None,
        insurance: "Blue Shield PPO".to_string(),
        policy_number: "BSP-4417".to_string(),
        agency: "Harbor Home Health".to_string(),
    })?;

    if let Some(active) = store.timeline().active() {
        println!(
            "  Window created:         {} ({} to {})",
            active.id.0, active.start_date, active.end_date
        );

        let metrics = progress(active, today);
        let band = RemainingBand::classify(metrics.days_remaining);
        println!(
            "  Progress today:         {}% elapsed, {} day(s) remaining -> {:?}",
            metrics.percentage, metrics.days_remaining, band
        );
    }

    // ── Provisional fallback when the backend is down ─────────────────────────

    gateway.fail_on("create-cert-period");
    let outcome = store.dispatch(Intent::AddWindow {
        start_date: today,
        end_date: None,
        insurance: "Medicare A".to_string(),
        policy_number: "MA-100".to_string(),
        agency: "Harbor Home Health".to_string(),
    })?;
    gateway.heal("create-cert-period");

    match outcome {
        Outcome::Applied { warning: Some(notice), .. } => {
            println!("  Backend down on create: window kept locally");
            println!("  Inline warning:         {}", notice.message);
        }
        other => println!("  Unexpected outcome: {:?}", other),
    }

    if let Some(active) = store.timeline().active() {
        println!(
            "  Active window now:      {} (provisional: {})",
            active.id.0, active.provisional
        );
    }

    println!("  Journal:                {} entr(ies), chain valid: {}", journal.len(), journal.verify_integrity());
    println!();
    println!("  Scenario 1 complete.");
    println!();
    Ok(())
}
