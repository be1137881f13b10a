use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::update_checker::ComponentDescriptor;

/// Global configuration loaded from `~/.config/sequpd/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequpdConfig {
    /// Base URL of the component update server.
    pub update_url: String,
    /// Whether component updates are enabled (sent with every check).
    pub enabled_component_updates: bool,
    /// Local JSON manifest answering update checks. Required by `check`/`update`.
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,
    /// Extra request attributes passed through to every check.
    #[serde(default)]
    pub additional_attributes: BTreeMap<String, String>,
    /// Installed components, in registration order.
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
}

impl Default for SequpdConfig {
    fn default() -> Self {
        Self {
            update_url: "https://updates.example.org/components/".to_string(),
            enabled_component_updates: true,
            manifest_path: None,
            additional_attributes: BTreeMap::new(),
            components: Vec::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sequpd")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SequpdConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SequpdConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<SequpdConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SequpdConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
