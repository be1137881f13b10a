//! Immutable configuration handed to every checker instance.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

use crate::config::SequpdConfig;

/// Shared, read-only settings for update checks.
///
/// One `Configurator` is built per run and passed (behind an `Arc`) to each
/// freshly created checker, so every step of a sequential check sees the same
/// settings.
#[derive(Debug, Clone)]
pub struct Configurator {
    update_url: Url,
    manifest_path: Option<PathBuf>,
    enabled_component_updates: bool,
    extra_attributes: BTreeMap<String, String>,
}

impl Configurator {
    pub fn new(update_url: Url) -> Self {
        Self {
            update_url,
            manifest_path: None,
            enabled_component_updates: true,
            extra_attributes: BTreeMap::new(),
        }
    }

    /// Build from the on-disk config. Fails if `update_url` is not a valid base URL.
    pub fn from_config(cfg: &SequpdConfig) -> Result<Self> {
        let update_url = Url::parse(&cfg.update_url)
            .with_context(|| format!("invalid update_url in config: {}", cfg.update_url))?;
        if update_url.cannot_be_a_base() {
            anyhow::bail!("update_url cannot be used as a base URL: {}", update_url);
        }
        Ok(Self {
            update_url,
            manifest_path: cfg.manifest_path.clone(),
            enabled_component_updates: cfg.enabled_component_updates,
            extra_attributes: cfg.additional_attributes.clone(),
        })
    }

    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn with_enabled_component_updates(mut self, enabled: bool) -> Self {
        self.enabled_component_updates = enabled;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_attributes.insert(key.into(), value.into());
        self
    }

    pub fn update_url(&self) -> &Url {
        &self.update_url
    }

    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest_path.as_deref()
    }

    pub fn enabled_component_updates(&self) -> bool {
        self.enabled_component_updates
    }

    /// Attributes sent with every request.
    pub fn extra_attributes(&self) -> &BTreeMap<String, String> {
        &self.extra_attributes
    }

    /// Default download location for `id` at `version`: `<update_url>/<id>/<version>`.
    pub fn codebase_for(&self, id: &str, version: &str) -> Result<Url> {
        let mut url = self.update_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("update_url cannot be a base: {}", self.update_url))?
            .pop_if_empty()
            .push(id)
            .push(version);
        Ok(url)
    }
}
