//! `sequpd status` – show persisted per-component check history.

use crate::cli::context::RunContext;

pub fn run_status(ctx: &RunContext) {
    let records = ctx.metadata.records();
    if records.is_empty() {
        println!("No update checks recorded.");
        return;
    }
    println!(
        "{:<34} {:<7} {:<12} {:<7} {}",
        "ID", "CHECKS", "LAST", "ERROR", "AVAILABLE"
    );
    for (id, rec) in records {
        let last = rec
            .last_checked
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<34} {:<7} {:<12} {:<7} {}",
            id,
            rec.check_count,
            last,
            rec.last_error,
            rec.available_version.as_deref().unwrap_or("-")
        );
    }
}
