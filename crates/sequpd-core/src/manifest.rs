//! Update checker answered from a local JSON manifest.
//!
//! The manifest lists the latest version of each component:
//!
//! ```json
//! { "retry_after_secs": 0,
//!   "components": { "widevine": { "version": "4.10.2391", "codebase": "https://..." } } }
//! ```
//!
//! One manifest read answers the whole batch, so this checker behaves like a
//! batching update server. Wrap it in `SequentialUpdateChecker` to get one
//! read per component.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::configurator::Configurator;
use crate::persisted_data::PersistedData;
use crate::update_checker::{
    CheckRequest, CheckResult, CheckerError, CheckerFactory, ErrorCategory, ProtocolError,
    ProtocolResults, UpdateCheckCallback, UpdateChecker, UpdateResult, UpdateStatus,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Retry-after hint attached to every response.
    #[serde(default)]
    pub retry_after_secs: u64,
    pub components: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub version: String,
    /// Download URL; defaults to `<update_url>/<id>/<version>`.
    #[serde(default)]
    pub codebase: Option<String>,
}

/// Read and parse a manifest file.
pub async fn load_manifest(path: &Path) -> Result<Manifest> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read manifest: {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse manifest: {}", path.display()))
}

/// Compare dotted numeric versions; missing trailing parts count as zero.
/// Returns `None` if either side is not a valid version.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    let pa = parse_version(a)?;
    let pb = parse_version(b)?;
    let len = pa.len().max(pb.len());
    let part = |v: &[u64], i: usize| v.get(i).copied().unwrap_or(0);
    Some(
        (0..len)
            .map(|i| part(&pa, i).cmp(&part(&pb, i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal),
    )
}

fn parse_version(v: &str) -> Option<Vec<u64>> {
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    v.split('.').map(|p| p.parse::<u64>().ok()).collect()
}

/// Single-batch checker backed by `Configurator::manifest_path`.
pub struct ManifestUpdateChecker {
    config: Arc<Configurator>,
    metadata: Arc<PersistedData>,
}

impl ManifestUpdateChecker {
    pub fn new(config: Arc<Configurator>, metadata: Arc<PersistedData>) -> Self {
        Self { config, metadata }
    }

    /// Factory producing a fresh manifest checker per call.
    pub fn factory() -> CheckerFactory {
        Arc::new(
            |config: Arc<Configurator>, metadata: Arc<PersistedData>| -> Box<dyn UpdateChecker> {
                Box::new(ManifestUpdateChecker::new(config, metadata))
            },
        )
    }
}

impl UpdateChecker for ManifestUpdateChecker {
    fn check_for_updates(
        &mut self,
        request: CheckRequest,
        callback: UpdateCheckCallback,
    ) -> Result<(), CheckerError> {
        if request.ids.is_empty() {
            return Err(CheckerError::EmptyIdentifiers);
        }
        let runtime = Handle::try_current().map_err(|_| CheckerError::NoRuntime)?;

        for id in &request.ids {
            self.metadata.record_request(id);
        }
        tracing::trace!(
            session_id = %request.session_id,
            ids = ?request.ids,
            attributes = ?request.additional_attributes,
            "manifest update check"
        );

        let config = Arc::clone(&self.config);
        runtime.spawn(async move {
            let result = answer(&config, &request).await;
            callback(result);
        });
        Ok(())
    }
}

async fn answer(config: &Configurator, request: &CheckRequest) -> CheckResult {
    let Some(path) = config.manifest_path() else {
        tracing::warn!("no manifest_path configured; cannot answer update check");
        return CheckResult::failure(
            ErrorCategory::UpdateCheck,
            ProtocolError::MissingUrls.code(),
            Duration::ZERO,
        );
    };
    match load_manifest(path).await {
        Ok(manifest) => respond(config, &manifest, request),
        Err(e) => {
            tracing::warn!("manifest update check failed: {:#}", e);
            CheckResult::failure(
                ErrorCategory::UpdateCheck,
                ProtocolError::ParseFailed.code(),
                Duration::ZERO,
            )
        }
    }
}

/// Build the response for `request` from an already-loaded manifest.
pub fn respond(config: &Configurator, manifest: &Manifest, request: &CheckRequest) -> CheckResult {
    let list = request
        .ids
        .iter()
        .map(|id| result_for(config, manifest, request, id))
        .collect();
    CheckResult::success(
        ProtocolResults { list },
        Duration::from_secs(manifest.retry_after_secs),
    )
}

fn result_for(
    config: &Configurator,
    manifest: &Manifest,
    request: &CheckRequest,
    id: &str,
) -> UpdateResult {
    let result = |status: UpdateStatus| UpdateResult {
        app_id: id.to_string(),
        status,
        next_version: None,
        codebase: None,
    };

    let Some(entry) = manifest.components.get(id) else {
        return result(UpdateStatus::Error("unknown application".to_string()));
    };
    let Some(installed) = request.components.get(id) else {
        return result(UpdateStatus::Error("missing component descriptor".to_string()));
    };
    if !request.enabled_component_updates {
        return result(UpdateStatus::NoUpdate);
    }

    match compare_versions(&entry.version, &installed.version) {
        Some(Ordering::Greater) => {
            let codebase = entry.codebase.clone().or_else(|| {
                config
                    .codebase_for(id, &entry.version)
                    .map(|u| u.to_string())
                    .ok()
            });
            UpdateResult {
                app_id: id.to_string(),
                status: UpdateStatus::UpdateAvailable,
                next_version: Some(entry.version.clone()),
                codebase,
            }
        }
        Some(_) => result(UpdateStatus::NoUpdate),
        None => result(UpdateStatus::Error("invalid version".to_string())),
    }
}
