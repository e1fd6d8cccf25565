//! Scenario 3: Certification Rollover
//!
//! Exercises the timeline state machine: adding windows expires the rest,
//! selecting from history re-activates one, and deleting the active window
//! promotes the survivor with the latest end date. Exactly one window is
//! active after every step.

use carelog_contracts::{
    error::CarelogResult,
    ids::WindowId,
    intent::{Intent, Outcome},
};

use super::wired_store;

fn print_timeline(store: &carelog_store::PatientStore) {
    for window in store.timeline().windows() {
        println!(
            "    {} {} to {}  [{}]",
            window.id.0,
            window.start_date,
            window.end_date,
            match window.status {
                carelog_contracts::window::WindowStatus::Active => "ACTIVE",
                carelog_contracts::window::WindowStatus::Expired => "expired",
            }
        );
    }
    println!("    active windows: {}", store.timeline().active_count());
}

pub fn run_scenario() -> CarelogResult<()> {
    println!("=== Scenario 3: Certification Rollover ===");
    println!();

    let (mut store, _gateway, _journal) = wired_store("patient-103");

    let add = |start: &str, end: &str| Intent::AddWindow {
        start_date: start.parse().expect("scenario dates are literals"),
        end_date: Some(end.parse().expect("scenario dates are literals")),
        insurance: "Blue Shield PPO".to_string(),
        policy_number: "BSP-4417".to_string(),
        agency: "Harbor Home Health".to_string(),
    };

    println!("  Adding three periods (each add expires the rest):");
    store.dispatch(add("2025-03-01", "2025-05-01"))?;
    store.dispatch(add("2025-04-01", "2025-06-01"))?;
    store.dispatch(add("2025-02-01", "2025-04-01"))?;
    print_timeline(&store);

    println!();
    println!("  Selecting cp-1 from history:");
    store.dispatch(Intent::SelectWindow {
        window: WindowId::new("cp-1"),
    })?;
    print_timeline(&store);

    println!();
    println!("  Deleting the active window (cp-1):");
    store.dispatch(Intent::DeleteWindow {
        window: WindowId::new("cp-1"),
    })?;
    print_timeline(&store);
    println!("    promotion went to the survivor with the latest end date");

    println!();
    println!("  Deleting down to one window, then trying to delete it:");
    store.dispatch(Intent::DeleteWindow {
        window: WindowId::new("cp-3"),
    })?;
    let outcome = store.dispatch(Intent::DeleteWindow {
        window: WindowId::new("cp-2"),
    })?;
    match outcome {
        Outcome::Rejected { notice } => {
            println!("    rejected as expected: {}", notice.message);
        }
        other => println!("    unexpected outcome: {:?}", other),
    }
    print_timeline(&store);

    println!();
    println!("  Scenario 3 complete.");
    println!();
    Ok(())
}
