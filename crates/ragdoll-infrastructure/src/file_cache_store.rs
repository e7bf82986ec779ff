//! Durable response cache backed by a TOML file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ragdoll_core::cache::CacheStore;
use ragdoll_core::error::{RagdollError, Result};
use serde::{Deserialize, Serialize};

use crate::storage::AtomicTomlFile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// `CacheStore` persisted to a single TOML document.
///
/// Every `set` is a locked read-modify-write of the whole file, which keeps
/// concurrent processes from losing each other's writes at the cost of
/// rewriting the document each time.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    file: AtomicTomlFile<CacheDocument>,
}

impl FileCacheStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(AtomicTomlFile<CacheDocument>) -> Result<T> + Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(file))
            .await
            .map_err(|e| RagdollError::internal(format!("cache task failed: {}", e)))?
    }
}

#[async_trait::async_trait]
impl CacheStore for FileCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.blocking(move |file| {
            let document = file.load()?.unwrap_or_default();
            Ok(document.entries.get(&key).cloned())
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.blocking(move |file| {
            file.update(CacheDocument::default(), |document| {
                document.entries.insert(key, value);
            })?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.blocking(|file| {
            file.replace(&CacheDocument::default())?;
            Ok(())
        })
        .await
    }
}
