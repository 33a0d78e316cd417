// CLI error types

use sitekit_api::{ApiError, HttpError};
use sitekit_config::ConfigError;
use sitekit_data::StoreError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] HttpError),

    #[error("Request failed: {0}")]
    Api(#[from] ApiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'sitekit --help' for usage information.", message)
            }
            CliError::Config(e) => {
                format!("Configuration error: {}\n\nCheck your config file or SITEKIT_* environment variables.", e)
            }
            CliError::Http(e) => format!("Could not create the HTTP client: {}", e),
            CliError::Api(e) => match e.status() {
                Some(status) => format!("Request failed with status {}: {} ({})", status, e.message, e.code),
                None => format!("Request failed: {} ({})", e.message, e.code),
            },
            CliError::Store(e) => format!("Store error: {}", e),
            CliError::Serialization(e) => format!("Could not format output: {}", e),
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_includes_status() {
        let error = CliError::from(ApiError::new(
            "internal_server_error",
            "Internal server error",
            Some(500),
        ));
        assert_eq!(
            error.user_message(),
            "Request failed with status 500: Internal server error (internal_server_error)"
        );
    }

    #[test]
    fn test_invalid_argument_suggests_help() {
        let error = CliError::InvalidArgument {
            message: "unknown module".into(),
        };
        assert!(error.user_message().contains("sitekit --help"));
    }
}
