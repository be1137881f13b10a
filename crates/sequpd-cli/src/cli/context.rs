//! Per-invocation setup shared by commands: config, configurator, metadata store.

use anyhow::Result;
use sequpd_core::config::{self, SequpdConfig};
use sequpd_core::configurator::Configurator;
use sequpd_core::persisted_data::PersistedData;
use sequpd_core::update_checker::ComponentMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct RunContext {
    pub cfg: SequpdConfig,
    pub configurator: Arc<Configurator>,
    pub metadata: Arc<PersistedData>,
    metadata_path: Option<PathBuf>,
}

impl RunContext {
    /// Load config (explicit path or XDG default), apply overrides, and open persisted data.
    pub fn load(
        config_path: Option<&Path>,
        manifest: Option<&Path>,
        disable_updates: bool,
    ) -> Result<Self> {
        let cfg = match config_path {
            Some(p) => config::load_from_path(p)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        let mut configurator = Configurator::from_config(&cfg)?;
        if let Some(m) = manifest {
            configurator = configurator.with_manifest_path(m);
        }
        if disable_updates {
            configurator = configurator.with_enabled_component_updates(false);
        }

        let metadata_path = PersistedData::default_path().ok();
        let metadata = match metadata_path
            .as_deref()
            .map(PersistedData::load_from_path)
            .transpose()
        {
            Ok(Some(Some(data))) => {
                tracing::debug!("loaded persisted data from state file");
                data
            }
            Ok(_) => PersistedData::new(),
            Err(e) => {
                tracing::warn!("ignoring unreadable persisted data: {:#}", e);
                PersistedData::new()
            }
        };

        Ok(Self {
            cfg,
            configurator: Arc::new(configurator),
            metadata: Arc::new(metadata),
            metadata_path,
        })
    }

    /// Context over an in-memory config with no persisted state on disk.
    #[cfg(test)]
    pub fn from_config(cfg: SequpdConfig) -> Result<Self> {
        let configurator = Configurator::from_config(&cfg)?;
        Ok(Self {
            cfg,
            configurator: Arc::new(configurator),
            metadata: Arc::new(PersistedData::new()),
            metadata_path: None,
        })
    }

    /// Add `KEY=VALUE` request attributes on top of the configured ones.
    pub fn with_attributes(mut self, attrs: &[String]) -> Result<Self> {
        if attrs.is_empty() {
            return Ok(self);
        }
        let mut configurator = (*self.configurator).clone();
        for attr in attrs {
            let (key, value) = parse_attr(attr)?;
            configurator = configurator.with_attribute(key, value);
        }
        self.configurator = Arc::new(configurator);
        Ok(self)
    }

    /// Descriptor map of all configured components.
    pub fn component_map(&self) -> Arc<ComponentMap> {
        Arc::new(
            self.cfg
                .components
                .iter()
                .map(|c| (c.id.clone(), c.clone()))
                .collect(),
        )
    }

    pub fn save_metadata(&self) -> Result<()> {
        if let Some(path) = &self.metadata_path {
            self.metadata.save_to_path(path)?;
        }
        Ok(())
    }
}

fn parse_attr(attr: &str) -> Result<(&str, &str)> {
    match attr.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => anyhow::bail!("invalid attribute {attr:?}: expected KEY=VALUE"),
    }
}
