//! Request/response types shared by every update checker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Current state of an installed component, as known to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Component identifier (e.g. a 32-char app id).
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Installed version, dotted numeric (e.g. "1.0.42").
    pub version: String,
    /// Optional fingerprint of the installed package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Component id -> descriptor. Shared between steps through an `Arc`.
pub type ComponentMap = BTreeMap<String, ComponentDescriptor>;

/// One update-check invocation.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub session_id: String,
    /// Ids to check, in order.
    pub ids: Vec<String>,
    pub components: Arc<ComponentMap>,
    pub additional_attributes: BTreeMap<String, String>,
    pub enabled_component_updates: bool,
}

impl CheckRequest {
    /// Same request, narrowed to a single id. The descriptor map is shared, not copied.
    pub fn for_single(&self, id: &str) -> CheckRequest {
        CheckRequest {
            session_id: self.session_id.clone(),
            ids: vec![id.to_string()],
            components: Arc::clone(&self.components),
            additional_attributes: self.additional_attributes.clone(),
            enabled_component_updates: self.enabled_component_updates,
        }
    }
}

/// Per-app status reported by the update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    NoUpdate,
    UpdateAvailable,
    /// Server-side error for this app only (the check itself succeeded).
    Error(String),
}

/// Parsed result for one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub app_id: String,
    pub status: UpdateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codebase: Option<String>,
}

/// Parsed payload of a successful update check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolResults {
    pub list: Vec<UpdateResult>,
}

/// Coarse error category attached to every check outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    #[default]
    None,
    Download,
    Unpack,
    Install,
    Service,
    UpdateCheck,
}

/// Update-check error codes. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    None,
    ResponseNotTrusted,
    MissingPublicKey,
    MissingUrls,
    ParseFailed,
    UpdateResponseNotFound,
    UrlFetcherFailed,
    UnknownApplication,
    RestrictedApplication,
    InvalidAppId,
    Internal,
}

impl ProtocolError {
    pub fn code(self) -> i32 {
        match self {
            ProtocolError::None => 0,
            ProtocolError::ResponseNotTrusted => -10,
            ProtocolError::MissingPublicKey => -11,
            ProtocolError::MissingUrls => -12,
            ProtocolError::ParseFailed => -13,
            ProtocolError::UpdateResponseNotFound => -14,
            ProtocolError::UrlFetcherFailed => -15,
            ProtocolError::UnknownApplication => -16,
            ProtocolError::RestrictedApplication => -17,
            ProtocolError::InvalidAppId => -18,
            ProtocolError::Internal => -23,
        }
    }
}

/// Outcome of one update-check call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResult {
    /// Present only on success.
    pub results: Option<ProtocolResults>,
    pub error_category: ErrorCategory,
    /// Zero means success.
    pub error: i32,
    /// Server hint: do not check again before this elapses.
    pub retry_after: Duration,
}

impl CheckResult {
    pub fn success(results: ProtocolResults, retry_after: Duration) -> Self {
        Self {
            results: Some(results),
            error_category: ErrorCategory::None,
            error: 0,
            retry_after,
        }
    }

    pub fn failure(category: ErrorCategory, error: i32, retry_after: Duration) -> Self {
        Self {
            results: None,
            error_category: category,
            error,
            retry_after,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error == 0
    }
}
