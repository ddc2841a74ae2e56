//! Configuration schema for shipit.toml

use std::path::PathBuf;

use serde::Deserialize;

use crate::target::DEFAULT_HOST;

/// Root configuration structure for shipit.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShipitConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Values used when the matching flag is omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// SSH host (usually an alias from ~/.ssh/config)
    pub host: Option<String>,
    /// SSH login user
    pub user: Option<String>,
    /// Directory in which workspaces are allocated (defaults to the OS temp dir)
    pub temp_root: Option<PathBuf>,
}

impl ShipitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration after parsing
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(host) = &self.defaults.host
            && host.trim().is_empty()
        {
            anyhow::bail!("defaults.host cannot be empty; remove the key to use '{DEFAULT_HOST}'");
        }
        if let Some(user) = &self.defaults.user
            && user.trim().is_empty()
        {
            anyhow::bail!("defaults.user cannot be empty; remove the key or set a user");
        }
        if let Some(root) = &self.defaults.temp_root
            && root.as_os_str().is_empty()
        {
            anyhow::bail!("defaults.temp_root cannot be empty");
        }
        Ok(())
    }

    /// Host from the flag, then the config file, then [`DEFAULT_HOST`].
    ///
    /// An explicitly passed flag wins even when empty, so that validation
    /// can reject it.
    pub fn resolve_host(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.defaults.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    /// User from the flag, then the config file.
    pub fn resolve_user(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string)
            .or_else(|| self.defaults.user.clone())
    }

    /// Root directory for workspaces.
    pub fn temp_root(&self) -> PathBuf {
        self.defaults
            .temp_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
