//! Response cache domain module.
//!
//! # Module Structure
//!
//! - `CacheStore`: durable key-value backend (`get`/`set`/`clear`)
//! - `ResponseCache`: the cache client injected into every pipeline stage;
//!   carries its own enable flag and key length limit
//! - `memory`: in-process `MemoryCacheStore`

mod memory;

use std::sync::Arc;

use crate::error::Result;

pub use memory::MemoryCacheStore;

/// Default maximum cache key length, in characters.
pub const DEFAULT_MAX_KEY_LENGTH: usize = 255;

/// A flat string key-value store persisted outside the pipeline.
///
/// `get` returns `Ok(None)` only for a genuinely absent key; backend failures
/// are reported as `Err` so a corrupted store is distinguishable from a cold one.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;
}

/// Cache client with an explicit enable flag.
///
/// Cloning is cheap and shares the backing store. Two clients over the same
/// store may have different policies, which is how a session with caching
/// disabled coexists with others that keep it.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    enabled: bool,
    max_key_length: usize,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, max_key_length: usize) -> Self {
        Self {
            store,
            enabled: true,
            max_key_length,
        }
    }

    /// Enabled cache over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()), DEFAULT_MAX_KEY_LENGTH)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    /// Returns a client over the same store with a different enable flag.
    pub fn with_enabled(&self, enabled: bool) -> Self {
        Self {
            store: Arc::clone(&self.store),
            enabled,
            max_key_length: self.max_key_length,
        }
    }

    /// Clears the shared store and returns a disabled client.
    ///
    /// Clearing is global: every client over this store loses its entries.
    pub async fn disable(&self) -> Result<Self> {
        self.forget().await?;
        Ok(self.with_enabled(false))
    }

    /// The stored form of `key`.
    pub fn key_for<'a>(&self, key: &'a str) -> &'a str {
        truncate_key(key, self.max_key_length)
    }

    /// Stores `value` under the truncated key. No-op while disabled.
    pub async fn remember(&self, key: &str, value: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.store.set(self.key_for(key), value).await
    }

    /// Looks up the truncated key.
    ///
    /// Always `Ok(None)` while disabled. An empty stored value counts as a miss.
    pub async fn recall(&self, key: &str) -> Result<Option<String>> {
        if !self.enabled {
            return Ok(None);
        }
        let value = self.store.get(self.key_for(key)).await?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    /// Clears every entry, regardless of the enable flag.
    pub async fn forget(&self) -> Result<()> {
        self.store.clear().await?;
        tracing::info!("{}", crate::messages::CACHE_CLEARED);
        Ok(())
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.enabled)
            .field("max_key_length", &self.max_key_length)
            .finish_non_exhaustive()
    }
}

/// Truncates `key` to at most `max_chars` characters.
pub fn truncate_key(key: &str, max_chars: usize) -> &str {
    match key.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &key[..byte_index],
        None => key,
    }
}
