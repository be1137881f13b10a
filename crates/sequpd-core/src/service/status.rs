//! Per-component status tracked by the update service.

use crate::update_checker::{CheckResult, ErrorCategory, UpdateStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentStatus {
    /// Registered, never checked.
    New,
    /// A check for this component is in flight.
    Checking,
    UpToDate,
    UpdateAvailable { version: String },
    /// The check itself failed.
    Failed { category: ErrorCategory, error: i32 },
    /// The check succeeded but the server reported an error for this component.
    ServerError(String),
    /// Skipped because the server asked us to retry later.
    Throttled,
}

impl ComponentStatus {
    /// Status of `id` after a single-component check returned `result`.
    pub fn from_result(id: &str, result: &CheckResult) -> Self {
        if !result.is_success() {
            return ComponentStatus::Failed {
                category: result.error_category,
                error: result.error,
            };
        }
        let entry = result
            .results
            .as_ref()
            .and_then(|r| r.list.iter().find(|u| u.app_id == id));
        match entry {
            None => ComponentStatus::ServerError("no result for component".to_string()),
            Some(u) => match &u.status {
                UpdateStatus::NoUpdate => ComponentStatus::UpToDate,
                UpdateStatus::UpdateAvailable => ComponentStatus::UpdateAvailable {
                    version: u.next_version.clone().unwrap_or_default(),
                },
                UpdateStatus::Error(msg) => ComponentStatus::ServerError(msg.clone()),
            },
        }
    }

    /// Short lowercase label for CLI output.
    pub fn label(&self) -> String {
        match self {
            ComponentStatus::New => "new".to_string(),
            ComponentStatus::Checking => "checking".to_string(),
            ComponentStatus::UpToDate => "up-to-date".to_string(),
            ComponentStatus::UpdateAvailable { version } => format!("update {version}"),
            ComponentStatus::Failed { error, .. } => format!("failed ({error})"),
            ComponentStatus::ServerError(msg) => format!("error: {msg}"),
            ComponentStatus::Throttled => "throttled".to_string(),
        }
    }
}
