//! Site Kit configuration
//!
//! Loads [`SiteKitConfig`] from an optional TOML file layered under
//! `SITEKIT_*` environment variables, and converts it into the fetch client
//! and cache configurations.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{ApiSection, CacheSection, LogSection, SiteKitConfig};
