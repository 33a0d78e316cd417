//! Cache storage backends

use std::{collections::BTreeMap, ops::Bound};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::Result;

/// A cached response payload with its insertion time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T: Clone> {
    /// The cached payload
    pub data: T,
    /// When the entry was inserted
    pub created_at: DateTime<Utc>,
    /// When the entry expires, if a TTL was given
    pub expires_at: Option<DateTime<Utc>>,
    /// Size of the serialized payload in bytes
    pub size_bytes: u64,
}

impl<T: Clone> CacheEntry<T> {
    /// Create a new cache entry
    pub fn new(data: T, ttl: Option<std::time::Duration>) -> Self
    where
        T: Serialize,
    {
        let created_at = Utc::now();
        let expires_at = ttl
            .and_then(|t| ChronoDuration::from_std(t).ok())
            .map(|t| created_at + t);
        let size_bytes = serde_json::to_string(&data)
            .map(|s| s.len() as u64)
            .unwrap_or(0);

        Self {
            data,
            created_at,
            expires_at,
            size_bytes,
        }
    }

    /// Check if the entry has expired. Entries without a TTL never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires| Utc::now() > expires)
            .unwrap_or(false)
    }
}

/// Key-value backend for [`ResponseCache`](crate::ResponseCache).
///
/// Values are serialized [`CacheEntry`] objects; the backend never looks
/// inside them.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    async fn set(&self, key: &str, value: &Value) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Returns whether the key was present
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Drop every key starting with `prefix` and return how many were dropped
    async fn remove_prefix(&self, prefix: &str) -> Result<usize>;

    async fn clear(&self) -> Result<()>;

    async fn len(&self) -> Result<usize>;
}

/// In-memory backend. Keys are kept ordered so a prefix is a contiguous
/// range.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let matching: Vec<String> = entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &matching {
            entries.remove(key);
        }
        Ok(matching.len())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}
