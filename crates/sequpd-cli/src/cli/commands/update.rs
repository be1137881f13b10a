//! `sequpd update` – check every configured component through the update service.

use anyhow::{Context, Result};
use sequpd_core::manifest::ManifestUpdateChecker;
use sequpd_core::service::UpdateService;
use std::sync::Arc;

use crate::cli::context::RunContext;

pub async fn run_update(ctx: &RunContext) -> Result<()> {
    let service = UpdateService::new(
        Arc::clone(&ctx.configurator),
        Arc::clone(&ctx.metadata),
        ManifestUpdateChecker::factory(),
    );
    for c in &ctx.cfg.components {
        service.register_component(c.clone())?;
    }

    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    service.check_for_updates(Box::new(move || {
        let _ = done_tx.send(());
    }))?;
    done_rx.await.context("update pass ended without finishing")?;

    ctx.save_metadata()?;

    let components = service.components();
    if components.is_empty() {
        println!("No components configured.");
        return Ok(());
    }
    println!("{:<34} {:<14} {}", "ID", "INSTALLED", "STATUS");
    for c in components {
        let status = service
            .status(&c.id)
            .map(|s| s.label())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<34} {:<14} {}", c.id, c.version, status);
    }
    if let Some(left) = service.throttled_for() {
        println!("Server asks to retry after {}s.", left.as_secs());
    }
    Ok(())
}
