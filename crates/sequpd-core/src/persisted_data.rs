//! Per-component update metadata shared by all checkers.
//!
//! Kept in memory behind a `RwLock`; the CLI loads it from and saves it to
//! `~/.local/state/sequpd/persisted_data.json` so counters survive across runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::update_checker::{CheckResult, ErrorCategory, UpdateStatus};

/// What we remember about one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Number of update requests issued for this component.
    pub check_count: u64,
    /// Unix time of the last request, if any.
    #[serde(default)]
    pub last_checked: Option<i64>,
    /// Error code of the last completed check (0 = success).
    #[serde(default)]
    pub last_error: i32,
    #[serde(default)]
    pub last_error_category: ErrorCategory,
    /// Last version the server advertised as available.
    #[serde(default)]
    pub available_version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    components: BTreeMap<String, ComponentRecord>,
}

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Default)]
pub struct PersistedData {
    records: RwLock<BTreeMap<String, ComponentRecord>>,
}

impl PersistedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that a request for `id` is being issued.
    pub fn record_request(&self, id: &str) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let rec = records.entry(id.to_string()).or_default();
        rec.check_count += 1;
        rec.last_checked = Some(unix_timestamp());
    }

    /// Store the outcome of a completed check for `id`.
    pub fn record_outcome(&self, id: &str, result: &CheckResult) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let rec = records.entry(id.to_string()).or_default();
        rec.last_error = result.error;
        rec.last_error_category = result.error_category;
        let advertised = result
            .results
            .iter()
            .flat_map(|r| r.list.iter())
            .find(|u| u.app_id == id && u.status == UpdateStatus::UpdateAvailable)
            .and_then(|u| u.next_version.clone());
        if advertised.is_some() {
            rec.available_version = advertised;
        }
    }

    pub fn get(&self, id: &str) -> Option<ComponentRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    /// All records, ordered by component id.
    pub fn records(&self) -> Vec<(String, ComponentRecord)> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Default path: `~/.local/state/sequpd/persisted_data.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("sequpd")?;
        Ok(xdg_dirs.get_state_home().join("persisted_data.json"))
    }

    /// Save to `path` (creates the parent dir if needed).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            components: self.records.read().unwrap_or_else(|e| e.into_inner()).clone(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&snapshot).context("serialize persisted data")?;
        std::fs::write(path, json)
            .with_context(|| format!("write persisted data: {}", path.display()))?;
        Ok(())
    }

    /// Load from `path`. A missing file yields `None`.
    pub fn load_from_path(path: &Path) -> Result<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read persisted data: {}", path.display()))
            }
        };
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse persisted data: {}", path.display()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                version = snapshot.version,
                "ignoring persisted data with unknown version"
            );
            return Ok(None);
        }
        Ok(Some(Self {
            records: RwLock::new(snapshot.components),
        }))
    }
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
