//! carelog — Practice Coordination Demo CLI
//!
//! Runs one or all of the four coordination scenarios.  Each scenario uses
//! real carelog components (store, screener, journal, gateway) wired
//! together with the in-memory backend and its seeded staff directory.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- intake
//!   cargo run -p demo -- reconcile
//!   cargo run -p demo -- cert-rollover
//!   cargo run -p demo -- staffing

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod scenarios;

// ── CLI definition ────────────────────────────────────────────────────────────

/// carelog — patient-page coordination demo.
///
/// Each subcommand runs one or all of the four scenarios, demonstrating the
/// store's screen → persist → apply → journal → broadcast pipeline.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "carelog practice coordination demo",
    long_about = "Runs carelog demo scenarios showing entitlement derivation,\n\
                  certification window rollover, staffing assignment, and the\n\
                  hash-chained change journal."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: Patient intake (default window, progress bands, provisional fallback).
    Intake,
    /// Scenario 2: Entitlement reconciliation (derivation + flagged override).
    Reconcile,
    /// Scenario 3: Certification rollover (add / select / delete promotion).
    CertRollover,
    /// Scenario 4: Staffing (slot tokens, frequency, refetch-after-mutation).
    Staffing,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Structured logging. Set RUST_LOG=debug for the full pipeline trace.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::Intake => scenarios::intake::run_scenario(),
        Command::Reconcile => scenarios::reconcile::run_scenario(),
        Command::CertRollover => scenarios::cert_rollover::run_scenario(),
        Command::Staffing => scenarios::staffing::run_scenario(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> carelog_contracts::error::CarelogResult<()> {
    scenarios::intake::run_scenario()?;
    scenarios::reconcile::run_scenario()?;
    scenarios::cert_rollover::run_scenario()?;
    scenarios::staffing::run_scenario()?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("carelog — Practice Coordination Core");
    println!("Demo scenarios");
    println!("====================================");
    println!();
    println!("Store pipeline per intent:");
    println!("  [1] Screener validates the payload — bad intents never reach the network");
    println!("  [2] Gateway persists the change (no retries, no optimistic merge)");
    println!("  [3] Slice applied + derived fields recomputed centrally");
    println!("  [4] Change appended to the SHA-256 hash-chained journal");
    println!("  [5] Full replacement payload broadcast to every sibling view");
    println!();
}
