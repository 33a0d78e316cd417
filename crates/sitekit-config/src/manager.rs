//! Configuration loading and validation

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::debug;
use url::Url;

use crate::{
    error::{ConfigError, Result},
    types::SiteKitConfig,
};

/// Environment prefix, e.g. `SITEKIT_API__BASE_URL`
pub const ENV_PREFIX: &str = "SITEKIT";

/// Configuration manager
pub struct ConfigManager {
    /// Configuration file path
    config_path: PathBuf,
    /// Environment prefix
    env_prefix: String,
}

impl ConfigManager {
    /// Create a manager for the default config path
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Create with custom config path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Override the environment prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get default config path
    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sitekit")
            .join("config.toml")
    }

    /// Load file then environment, and validate the result
    pub fn load(&self) -> Result<SiteKitConfig> {
        debug!(path = %self.config_path.display(), "Loading configuration");

        let builder = Config::builder()
            .add_source(
                File::from(self.config_path.clone())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: SiteKitConfig = builder.build()?.try_deserialize()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Write the configuration as TOML
    pub fn save(&self, config: &SiteKitConfig) -> Result<()> {
        let toml = toml::to_string(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, toml)?;
        Ok(())
    }

    /// Reject configurations the fetch client cannot work with
    pub fn validate(config: &SiteKitConfig) -> Result<()> {
        if let Err(e) = Url::parse(&config.api.base_url) {
            return Err(ConfigError::invalid(
                "api.base_url",
                format!("{} ({e})", config.api.base_url),
            ));
        }
        if config.api.namespace.trim().is_empty() {
            return Err(ConfigError::invalid("api.namespace", "must not be empty"));
        }
        if config.api.timeout_secs == 0 {
            return Err(ConfigError::invalid("api.timeout_secs", "must be greater than 0"));
        }
        if config.cache.max_entries == Some(0) {
            return Err(ConfigError::invalid("cache.max_entries", "must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
