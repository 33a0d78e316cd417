//! Configuration error types

use thiserror::Error;

/// Configuration result type
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file or environment could not be read into [`SiteKitConfig`](crate::SiteKitConfig)
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("Failed to write configuration: {0}")]
    Write(#[from] toml::ser::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        ConfigError::Load(error.to_string())
    }
}
