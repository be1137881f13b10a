//! `sequpd check [ids..]` – one sequential batch check, fail-fast.

use anyhow::Result;
use sequpd_core::manifest::ManifestUpdateChecker;
use sequpd_core::update_checker::{self, CheckRequest, SequentialUpdateChecker, UpdateStatus};
use std::sync::Arc;

use crate::cli::context::RunContext;

/// Ids to check: the explicit list, or every configured component.
/// Explicit ids must be configured, since the check needs their installed version.
pub(crate) fn select_ids(ctx: &RunContext, ids: &[String]) -> Result<Vec<String>> {
    if ids.is_empty() {
        let all: Vec<String> = ctx.cfg.components.iter().map(|c| c.id.clone()).collect();
        if all.is_empty() {
            anyhow::bail!("no components to check: add [[components]] to the config or pass ids");
        }
        return Ok(all);
    }
    if let Some(unknown) = ids
        .iter()
        .find(|id| !ctx.cfg.components.iter().any(|c| &c.id == *id))
    {
        anyhow::bail!("unknown component: {unknown} (not in config)");
    }
    Ok(ids.to_vec())
}

/// Batch request for `ids` carrying the run's attributes and update flag.
pub(crate) fn build_request(ctx: &RunContext, ids: &[String]) -> CheckRequest {
    CheckRequest {
        session_id: format!("{{sequpd-cli-{}}}", std::process::id()),
        ids: ids.to_vec(),
        components: ctx.component_map(),
        additional_attributes: ctx.configurator.extra_attributes().clone(),
        enabled_component_updates: ctx.configurator.enabled_component_updates(),
    }
}

/// Ids whose outcome this run should record. A failed check stops at the
/// failing id: the last one requested. Ids after it were never checked.
fn outcome_ids(ids: &[String], before: &[u64], ctx: &RunContext, success: bool) -> Vec<String> {
    if success {
        return ids.to_vec();
    }
    ids.iter()
        .zip(before)
        .filter(|(id, count)| ctx.metadata.get(id).map_or(0, |r| r.check_count) > **count)
        .map(|(id, _)| id.clone())
        .last()
        .into_iter()
        .collect()
}

pub async fn run_check(ctx: &RunContext, ids: &[String]) -> Result<()> {
    let ids = select_ids(ctx, ids)?;
    let request = build_request(ctx, &ids);
    let before: Vec<u64> = ids
        .iter()
        .map(|id| ctx.metadata.get(id).map_or(0, |r| r.check_count))
        .collect();

    let mut checker = SequentialUpdateChecker::new(
        Arc::clone(&ctx.configurator),
        Arc::clone(&ctx.metadata),
        ManifestUpdateChecker::factory(),
    );
    let result = update_checker::check(&mut checker, request).await?;

    for id in outcome_ids(&ids, &before, ctx, result.is_success()) {
        ctx.metadata.record_outcome(&id, &result);
    }
    ctx.save_metadata()?;

    if !result.is_success() {
        anyhow::bail!(
            "update check failed: category {:?}, error {}",
            result.error_category,
            result.error
        );
    }

    let list = result.results.map(|r| r.list).unwrap_or_default();
    println!("{:<34} {:<14} {}", "ID", "STATUS", "NEXT VERSION");
    for u in &list {
        let status = match &u.status {
            UpdateStatus::NoUpdate => "no-update".to_string(),
            UpdateStatus::UpdateAvailable => "update".to_string(),
            UpdateStatus::Error(msg) => format!("error: {msg}"),
        };
        println!(
            "{:<34} {:<14} {}",
            u.app_id,
            status,
            u.next_version.as_deref().unwrap_or("-")
        );
        if let Some(codebase) = &u.codebase {
            println!("    {codebase}");
        }
    }
    if !result.retry_after.is_zero() {
        println!("Server asks to retry after {}s.", result.retry_after.as_secs());
    }
    Ok(())
}
