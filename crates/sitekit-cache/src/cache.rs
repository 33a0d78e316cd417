//! Response cache keyed by request signature

use std::{collections::VecDeque, sync::Arc, time::Duration};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::{CacheError, Result};
use crate::metrics::{CacheMetrics, CacheStats};
use crate::storage::{CacheEntry, CacheStorage, MemoryStorage};

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default TTL for entries. `None` means entries live until invalidated.
    pub default_ttl: Option<Duration>,
    /// Maximum number of entries; the oldest entry is evicted first
    pub max_entries: Option<usize>,
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: None,
            max_entries: None,
            enable_metrics: true,
        }
    }
}

/// Read-through cache for fetch-client responses.
///
/// Keys are request signatures such as `modules::analytics::report::{...}`.
/// Eviction is explicit: [`ResponseCache::remove_prefix`] drops every entry
/// of a resource family after a write.
pub struct ResponseCache {
    storage: Arc<dyn CacheStorage>,
    config: CacheConfig,
    metrics: Arc<CacheMetrics>,
    /// Insertion order, oldest first
    order: Mutex<VecDeque<String>>,
}

impl ResponseCache {
    /// Create a cache over the given storage with default configuration
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self::with_config(storage, CacheConfig::default())
    }

    /// Create a cache with configuration
    pub fn with_config(storage: Arc<dyn CacheStorage>, config: CacheConfig) -> Self {
        Self {
            storage,
            config,
            metrics: Arc::new(CacheMetrics::new()),
            order: Mutex::new(VecDeque::new()),
        }
    }

    /// In-memory cache with the given configuration
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::with_config(Arc::new(MemoryStorage::new()), config)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        &self.metrics
    }

    /// Store a payload. `ttl` overrides the configured default.
    pub async fn set<T: Serialize + Clone>(
        &self,
        key: &str,
        value: T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        let entry = CacheEntry::new(value, ttl.or(self.config.default_ttl));
        let json_value = serde_json::to_value(&entry).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;

        self.storage.set(key, &json_value).await?;

        let mut order = self.order.lock().await;
        order.retain(|k| k != key);
        order.push_back(key.to_string());

        if let Some(max) = self.config.max_entries {
            while order.len() > max {
                if let Some(oldest) = order.pop_front() {
                    self.storage.remove(&oldest).await?;
                    if self.config.enable_metrics {
                        self.metrics.record_eviction();
                    }
                    debug!(key = %oldest, "Evicted oldest cache entry");
                }
            }
        }

        if self.config.enable_metrics {
            self.metrics.record_store();
            self.metrics.set_entry_count(order.len());
        }
        trace!(key, size = entry.size_bytes, "Cached response");

        Ok(())
    }

    /// Retrieve a payload. Expired entries are removed and reported as misses.
    pub async fn get<T: DeserializeOwned + Clone>(&self, key: &str) -> Result<Option<T>> {
        let Some(json_value) = self.storage.get(key).await? else {
            if self.config.enable_metrics {
                self.metrics.record_miss();
            }
            return Ok(None);
        };

        let entry: CacheEntry<T> =
            serde_json::from_value(json_value).map_err(|source| CacheError::Decode {
                key: key.to_string(),
                source,
            })?;

        if entry.is_expired() {
            self.remove(key).await?;
            if self.config.enable_metrics {
                self.metrics.record_miss();
            }
            return Ok(None);
        }

        if self.config.enable_metrics {
            self.metrics.record_hit();
        }
        Ok(Some(entry.data))
    }

    /// Check if a key is stored (expired entries included until read)
    pub async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.storage.get(key).await?.is_some())
    }

    /// Remove a single key
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let removed = self.storage.remove(key).await?;
        let mut order = self.order.lock().await;
        order.retain(|k| k != key);
        if self.config.enable_metrics {
            self.metrics.set_entry_count(order.len());
        }
        Ok(removed)
    }

    /// Remove every entry whose key starts with `prefix`. Returns the number
    /// of entries removed.
    pub async fn remove_prefix(&self, prefix: &str) -> Result<usize> {
        let removed = self.storage.remove_prefix(prefix).await?;

        let mut order = self.order.lock().await;
        order.retain(|k| !k.starts_with(prefix));

        if self.config.enable_metrics {
            self.metrics.record_invalidations(removed as u64);
            self.metrics.set_entry_count(order.len());
        }
        debug!(prefix, removed, "Invalidated cache entries");

        Ok(removed)
    }

    /// Remove everything
    pub async fn clear(&self) -> Result<()> {
        self.storage.clear().await?;
        self.order.lock().await.clear();
        if self.config.enable_metrics {
            self.metrics.set_entry_count(0);
        }
        Ok(())
    }

    /// Number of stored entries
    pub async fn len(&self) -> Result<usize> {
        self.storage.len().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::in_memory(CacheConfig::default())
    }
}
