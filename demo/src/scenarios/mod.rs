//! Demo scenarios for the carelog coordination core.
//!
//! Each scenario wires a `PatientStore` to the in-memory gateway, the
//! hash-chained journal, and the stock intent screener, then drives it the
//! way the three editing views would.

pub mod cert_rollover;
pub mod intake;
pub mod reconcile;
pub mod staffing;

use carelog_contracts::{
    ids::PatientId,
    intent::SyncEvent,
};
use carelog_gateway::InMemoryGateway;
use carelog_journal::InMemoryJournal;
use carelog_store::{traits::SyncListener, PatientStore};
use carelog_validate::default_validator;

/// A listener that narrates every broadcast, standing in for the sibling
/// views that would overwrite their copies.
pub struct PrintingListener;

impl SyncListener for PrintingListener {
    fn on_sync(&self, event: &SyncEvent) {
        let slice = match event {
            SyncEvent::EntitlementsReplaced { .. } => "entitlements",
            SyncEvent::StaffingReplaced { .. } => "staffing",
            SyncEvent::TimelineReplaced { .. } => "timeline",
            SyncEvent::ScheduleReplaced { .. } => "schedule",
        };
        println!("  [sync] {} slice replaced for all sibling views", slice);
    }
}

/// Build a fully wired store plus handles to its gateway and journal.
pub fn wired_store(patient: &str) -> (PatientStore, InMemoryGateway, InMemoryJournal) {
    let gateway = InMemoryGateway::new();
    let journal = InMemoryJournal::new(patient);

    let mut store = PatientStore::new(
        PatientId::new(patient),
        Box::new(gateway.clone()),
        Box::new(journal.clone()),
        Box::new(default_validator()),
    );
    store.subscribe(Box::new(PrintingListener));

    (store, gateway, journal)
}
