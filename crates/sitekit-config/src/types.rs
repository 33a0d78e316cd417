//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sitekit_api::ApiConfig;
use sitekit_cache::CacheConfig;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SiteKitConfig {
    /// Fetch client settings
    pub api: ApiSection,
    /// Response cache settings
    pub cache: CacheSection,
    /// Logging settings
    pub log: LogSection,
}

/// `[api]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSection {
    /// Site REST root, e.g. `https://example.com/wp-json`
    pub base_url: String,
    /// REST namespace
    pub namespace: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Optional proxy URL
    pub proxy: Option<String>,
    /// Memoize GET responses
    pub use_cache: bool,
}

/// `[cache]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSection {
    /// Upper bound on cached responses
    pub max_entries: Option<usize>,
    /// Expiry for cached responses; unset means until invalidated
    pub default_ttl_secs: Option<u64>,
    /// Collect hit/miss counters
    pub enable_metrics: bool,
}

/// `[log]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSection {
    /// `tracing` filter directive, e.g. `info` or `sitekit_data=debug`
    pub level: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        let api = ApiConfig::default();
        Self {
            base_url: api.base_url,
            namespace: api.namespace,
            timeout_secs: api.timeout.as_secs(),
            connect_timeout_secs: api.connect_timeout.as_secs(),
            proxy: None,
            use_cache: api.use_cache,
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: None,
            default_ttl_secs: None,
            enable_metrics: true,
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SiteKitConfig {
    /// Fetch client configuration derived from the `[api]` section
    pub fn api_config(&self) -> ApiConfig {
        let mut config = ApiConfig::default()
            .with_base_url(self.api.base_url.clone())
            .with_namespace(self.api.namespace.clone())
            .with_timeout(Duration::from_secs(self.api.timeout_secs))
            .with_cache(self.api.use_cache);
        config.connect_timeout = Duration::from_secs(self.api.connect_timeout_secs);
        config.proxy = self.api.proxy.clone();
        config
    }

    /// Cache configuration derived from the `[cache]` section
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            default_ttl: self.cache.default_ttl_secs.map(Duration::from_secs),
            max_entries: self.cache.max_entries,
            enable_metrics: self.cache.enable_metrics,
        }
    }
}
