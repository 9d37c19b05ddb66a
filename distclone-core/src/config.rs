//! Configuration management for distclone
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (DISTCLONE_*)
//! 2. Config file (~/.config/distclone/config.toml)
//! 3. Default values
//!
//! A profile selects an optional `[profiles.<name>]` section whose settings
//! override the base ones. The clone core never looks at the profile itself.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::request::DEFAULT_PROFILE;
use crate::workspace::{WorkspaceProvisioner, DEFAULT_PREFIX};
use crate::{Error, Result};

/// Environment variable overriding the workspace root
pub const TEMP_DIR_ENV: &str = "DISTCLONE_TEMP_DIR";

/// Where temporary workspaces are created
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Parent directory for workspaces (system temp dir if unset)
    pub root: Option<PathBuf>,

    /// Directory name prefix
    pub prefix: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: None,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl WorkspaceConfig {
    pub fn provisioner(&self) -> WorkspaceProvisioner {
        WorkspaceProvisioner::new(self.root.clone(), self.prefix.clone())
    }
}

/// Partial workspace settings a profile may override
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceOverrides {
    pub root: Option<PathBuf>,
    pub prefix: Option<String>,
}

/// A named profile
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub workspace: WorkspaceOverrides,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Base workspace configuration
    pub workspace: WorkspaceConfig,

    /// Named profiles
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/distclone/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("distclone").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - DISTCLONE_TEMP_DIR: Parent directory for workspaces
    pub fn with_env_overrides(self) -> Self {
        self.with_temp_dir(std::env::var_os(TEMP_DIR_ENV).map(PathBuf::from))
    }

    /// Override the workspace root if `root` is set
    pub fn with_temp_dir(mut self, root: Option<PathBuf>) -> Self {
        if let Some(root) = root.filter(|r| !r.as_os_str().is_empty()) {
            self.workspace.root = Some(root);
        }
        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: env > config file > defaults
    pub fn load_with_overrides() -> Result<Self> {
        Ok(Self::load()?.with_env_overrides())
    }

    /// Workspace settings for a profile
    ///
    /// Unknown profiles get the base settings.
    pub fn workspace_for(&self, profile: &str) -> WorkspaceConfig {
        let mut workspace = self.workspace.clone();

        match self.profiles.get(profile) {
            Some(p) => {
                if let Some(root) = &p.workspace.root {
                    workspace.root = Some(root.clone());
                }
                if let Some(prefix) = &p.workspace.prefix {
                    workspace.prefix = prefix.clone();
                }
            }
            None if profile != DEFAULT_PROFILE => {
                tracing::debug!(profile, "No profile section configured, using defaults");
            }
            None => {}
        }

        workspace
    }
}
