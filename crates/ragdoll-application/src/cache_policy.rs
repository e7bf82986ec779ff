//! Cache access shared by the pipeline stages.
//!
//! A storage failure is logged and then handled as a miss (on read) or
//! dropped (on write), so a broken store never aborts a turn.

use ragdoll_core::cache::ResponseCache;

pub(crate) async fn recall_or_miss(cache: &ResponseCache, key: &str) -> Option<String> {
    match cache.recall(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Cache lookup failed, continuing as a miss: {}", e);
            None
        }
    }
}

pub(crate) async fn remember_or_warn(cache: &ResponseCache, key: &str, value: &str) {
    if let Err(e) = cache.remember(key, value).await {
        tracing::warn!("Cache write failed: {}", e);
    }
}
