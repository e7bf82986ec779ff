//! Retrieval stage: builds the session index once and answers queries against it.

use std::sync::Arc;

use ragdoll_core::cache::ResponseCache;
use ragdoll_core::error::{RagdollError, Result};
use ragdoll_core::messages;
use ragdoll_core::provider::{QueryEngine, RetrievalEngine};

use crate::cache_policy::{recall_or_miss, remember_or_warn};
use crate::pacer::Pacer;

pub struct RetrievalStage {
    engine: Arc<dyn RetrievalEngine>,
    cache: ResponseCache,
    pacer: Arc<Pacer>,
}

impl RetrievalStage {
    pub fn new(engine: Arc<dyn RetrievalEngine>, cache: ResponseCache, pacer: Arc<Pacer>) -> Self {
        Self {
            engine,
            cache,
            pacer,
        }
    }

    /// Indexes the full knowledge text as a single document.
    pub async fn build_index(&self, text: &str) -> Result<Box<dyn QueryEngine>> {
        tracing::info!("{}", messages::CREATING_VECTOR_STORE);
        let index = self.engine.index_document(text).await?;
        tracing::info!("{}", messages::DONE);
        self.pacer.pause().await;
        tracing::info!("{}", messages::CREATING_QUERY_ENGINE);
        Ok(index)
    }

    /// Answers `query`, serving a cached answer when one exists.
    pub async fn answer(&self, index: &dyn QueryEngine, query: &str) -> Result<String> {
        if let Some(cached) = recall_or_miss(&self.cache, query).await {
            tracing::info!("{}", messages::QUERY_FROM_CACHE);
            return Ok(cached);
        }
        self.requery(index, query).await
    }

    /// Queries the index without consulting the cache; the answer is still recorded.
    pub async fn requery(&self, index: &dyn QueryEngine, query: &str) -> Result<String> {
        tracing::info!("{}", messages::llm_query(query));
        let result = index.query(query).await;
        self.pacer.pause().await;

        let answer = result.map_err(|e| {
            tracing::error!("Query engine error: {}", e);
            RagdollError::from(e)
        })?;
        remember_or_warn(&self.cache, query, &answer).await;
        tracing::info!("{}", messages::DONE);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragdoll_core::ProviderError;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingIndex {
        questions: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl QueryEngine for CountingIndex {
        async fn query(&self, question: &str) -> std::result::Result<String, ProviderError> {
            self.questions.lock().unwrap().push(question.to_string());
            if self.fail {
                return Err(ProviderError::execution("index offline"));
            }
            Ok(format!("answer to {}", question))
        }
    }

    struct NoEngine;

    #[async_trait]
    impl RetrievalEngine for NoEngine {
        async fn index_document(&self, _text: &str) -> Result<Box<dyn QueryEngine>> {
            Ok(Box::new(CountingIndex::default()))
        }
    }

    fn stage(cache: ResponseCache) -> (RetrievalStage, Arc<Pacer>) {
        let pacer = Arc::new(Pacer::new(Duration::ZERO));
        (RetrievalStage::new(Arc::new(NoEngine), cache, pacer.clone()), pacer)
    }

    #[tokio::test]
    async fn second_answer_comes_from_cache() {
        let (stage, pacer) = stage(ResponseCache::in_memory());
        let index = CountingIndex::default();

        let first = stage.answer(&index, "Who is Arthas?").await.unwrap();
        let second = stage.answer(&index, "Who is Arthas?").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(index.questions.lock().unwrap().len(), 1);
        assert_eq!(pacer.pauses(), 1);
    }

    #[tokio::test]
    async fn requery_skips_read_but_records() {
        let cache = ResponseCache::in_memory();
        cache.remember("q", "stale").await.unwrap();
        let (stage, _) = stage(cache.clone());
        let index = CountingIndex::default();

        let answer = stage.requery(&index, "q").await.unwrap();

        assert_eq!(answer, "answer to q");
        assert_eq!(cache.recall("q").await.unwrap().as_deref(), Some("answer to q"));
    }

    #[tokio::test]
    async fn query_failure_is_not_cached() {
        let cache = ResponseCache::in_memory();
        let (stage, _) = stage(cache.clone());
        let index = CountingIndex {
            fail: true,
            ..Default::default()
        };

        let err = stage.answer(&index, "q").await.unwrap_err();

        assert!(err.is_provider());
        assert_eq!(cache.recall("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn build_index_paces_once() {
        let (stage, pacer) = stage(ResponseCache::in_memory());
        stage.build_index("lore").await.unwrap();
        assert_eq!(pacer.pauses(), 1);
    }
}
