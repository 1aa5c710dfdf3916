//! Configuration for TagKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a TagKV database handle
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Store file location (created on open if absent)
    pub path: PathBuf,

    /// Flush after every mutating call (safest, slowest)
    pub autosync: bool,

    // -------------------------------------------------------------------------
    // Namespace Configuration
    // -------------------------------------------------------------------------
    /// Namespace applied when a call does not supply its own prefix
    pub default_prefix: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.db"),
            autosync: false,
            default_prefix: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Enable or disable flushing after every write
    pub fn autosync(mut self, enabled: bool) -> Self {
        self.config.autosync = enabled;
        self
    }

    /// Set the default namespace prefix
    pub fn default_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.default_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
