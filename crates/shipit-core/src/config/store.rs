//! Config store for locating and loading shipit.toml.

use std::path::{Path, PathBuf};

use super::{ShipitConfig, parser};

pub const CONFIG_FILE_NAME: &str = "shipit.toml";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store for `<config_dir>/shipit/shipit.toml`.
    pub fn from_default_location() -> anyhow::Result<Self> {
        let global_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("shipit");

        Ok(Self::from_dir(&global_dir))
    }

    pub fn from_dir(dir: &Path) -> Self {
        Self::from_path(dir.join(CONFIG_FILE_NAME))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config; a missing file yields the defaults.
    pub fn load(&self) -> anyhow::Result<ShipitConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(ShipitConfig::new());
        }
        parser::parse_shipit_toml(&self.config_path)
    }
}
