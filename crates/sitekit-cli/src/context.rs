// Shared command context

use std::{path::PathBuf, sync::Arc, time::Duration};

use sitekit_api::ApiClient;
use sitekit_cache::ResponseCache;
use sitekit_config::{ConfigManager, SiteKitConfig};
use sitekit_data::Registry;
use tracing::debug;

use crate::error::CliResult;

/// Configuration, client and registered stores for one CLI invocation
pub struct AppContext {
    pub config: SiteKitConfig,
    pub client: Arc<ApiClient>,
    pub registry: Registry,
}

impl AppContext {
    /// Load configuration from `path` (or the default location)
    pub fn load(path: Option<PathBuf>) -> CliResult<SiteKitConfig> {
        let manager = match path {
            Some(path) => ConfigManager::with_path(path),
            None => ConfigManager::new(),
        };
        Ok(manager.load()?)
    }

    /// Build the client and register every store
    pub fn new(config: SiteKitConfig) -> CliResult<Self> {
        let cache = Arc::new(ResponseCache::in_memory(config.cache_config()));
        let client = Arc::new(ApiClient::new(config.api_config())?.with_cache(cache));

        let registry = Registry::new();
        sitekit_stores::register_stores(&registry, Arc::clone(&client))?;
        debug!(stores = ?registry.store_names(), "Stores registered");

        Ok(Self {
            config,
            client,
            registry,
        })
    }

    /// How long to wait for a resolver
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.config.api.timeout_secs.saturating_add(1))
    }
}
