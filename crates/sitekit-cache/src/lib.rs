//! # Site Kit Cache
//!
//! Read-through response cache used by the Site Kit fetch client.
//!
//! ## Features
//!
//! - **Signature-keyed entries**: one entry per request signature
//! - **Prefix invalidation**: evict a whole resource family in one call
//! - **Caller-controlled eviction**: entries never expire unless a TTL is given
//! - **Metrics**: hit, miss, store and invalidation counters

pub mod cache;
pub mod error;
pub mod metrics;
pub mod storage;

pub use cache::{CacheConfig, ResponseCache};
pub use error::{CacheError, Result};
pub use metrics::{CacheMetrics, CacheStats};
pub use storage::{CacheEntry, CacheStorage, MemoryStorage};
