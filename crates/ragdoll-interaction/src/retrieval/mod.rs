//! In-process vector retrieval.
//!
//! # Module Structure
//!
//! - `chunking`: sentence-aligned, overlapping chunks
//! - `tfidf`: vectorizer and cosine similarity
//!
//! `VectorRetrievalEngine::index_document` chunks and embeds one document;
//! the returned `VectorQueryEngine` ranks chunks against a question and either
//! synthesizes an answer with an attached text generator or returns the best
//! matching context.

pub mod chunking;
pub mod tfidf;

use std::sync::Arc;

use async_trait::async_trait;
use ragdoll_core::error::{RagdollError, Result};
use ragdoll_core::messages::DEFAULT_ANSWER;
use ragdoll_core::provider::{QueryEngine, RetrievalEngine, TextGenerator};
use ragdoll_core::ProviderError;

use chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, chunk_text};
use tfidf::{TfIdfVectorizer, cosine_similarity};

/// Number of chunks handed to answer synthesis.
pub const DEFAULT_TOP_K: usize = 2;

pub struct VectorRetrievalEngine {
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
    synthesizer: Option<Arc<dyn TextGenerator>>,
}

impl VectorRetrievalEngine {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            synthesizer: None,
        }
    }

    /// Answers are written by `generator` from the retrieved context.
    pub fn with_synthesizer(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.synthesizer = Some(generator);
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }
}

impl Default for VectorRetrievalEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RetrievalEngine for VectorRetrievalEngine {
    async fn index_document(&self, text: &str) -> Result<Box<dyn QueryEngine>> {
        let chunks = chunk_text(text, self.chunk_size, self.chunk_overlap);
        if chunks.is_empty() {
            return Err(RagdollError::Provider(ProviderError::execution(
                "Cannot index an empty document",
            )));
        }

        let (vectorizer, embeddings) = tokio::task::spawn_blocking(move || {
            let vectorizer = TfIdfVectorizer::fit(&chunks);
            let embeddings: Vec<Vec<f32>> =
                chunks.iter().map(|chunk| vectorizer.transform(chunk)).collect();
            (vectorizer, chunks.into_iter().zip(embeddings).collect::<Vec<_>>())
        })
        .await
        .map_err(|e| RagdollError::internal(format!("indexing task failed: {}", e)))?;

        tracing::debug!(
            "Indexed {} chunks over {} terms",
            embeddings.len(),
            vectorizer.dimension()
        );

        Ok(Box::new(VectorQueryEngine {
            vectorizer,
            chunks: embeddings,
            top_k: self.top_k,
            synthesizer: self.synthesizer.clone(),
        }))
    }
}

/// A built index over one document.
pub struct VectorQueryEngine {
    vectorizer: TfIdfVectorizer,
    chunks: Vec<(String, Vec<f32>)>,
    top_k: usize,
    synthesizer: Option<Arc<dyn TextGenerator>>,
}

impl VectorQueryEngine {
    /// Chunks with a positive similarity to `question`, best first.
    pub fn retrieve(&self, question: &str) -> Vec<(&str, f32)> {
        let query = self.vectorizer.transform(question);

        let mut scored: Vec<(&str, f32)> = self
            .chunks
            .iter()
            .map(|(chunk, embedding)| (chunk.as_str(), cosine_similarity(&query, embedding)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.top_k);
        scored
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl QueryEngine for VectorQueryEngine {
    async fn query(&self, question: &str) -> std::result::Result<String, ProviderError> {
        let retrieved = self.retrieve(question);
        let context = retrieved
            .iter()
            .map(|(chunk, _)| *chunk)
            .collect::<Vec<_>>()
            .join("\n\n");

        match &self.synthesizer {
            Some(generator) => {
                let context = if context.is_empty() {
                    // Nothing matched; let the generator work from the opening chunks.
                    self.chunks
                        .iter()
                        .take(self.top_k)
                        .map(|(chunk, _)| chunk.as_str())
                        .collect::<Vec<_>>()
                        .join("\n\n")
                } else {
                    context
                };
                generator.generate_text(&synthesis_prompt(&context, question)).await
            }
            None if context.is_empty() => Ok(DEFAULT_ANSWER.to_string()),
            None => Ok(context),
        }
    }
}

fn synthesis_prompt(context: &str, question: &str) -> String {
    format!(
        "Context information is below.\n---------------------\n{}\n---------------------\nGiven the context information and not prior knowledge, answer the query.\nQuery: {}\nAnswer:",
        context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const LORE: &str = "Arthas Menethil was the crown prince of Lordaeron.\n\n\
        He took up the cursed runeblade Frostmourne in Northrend.\n\n\
        Jaina Proudmoore studied magic in Dalaran.";

    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate_text(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("synthesized".to_string())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn engine() -> VectorRetrievalEngine {
        VectorRetrievalEngine::new().with_chunking(60, 0)
    }

    #[tokio::test]
    async fn empty_document_cannot_be_indexed() {
        let result = engine().index_document("   ").await;
        assert!(matches!(result, Err(RagdollError::Provider(_))));
    }

    #[tokio::test]
    async fn answers_with_best_context_without_synthesizer() {
        let index = engine().with_top_k(1).index_document(LORE).await.unwrap();
        let answer = index.query("What is Frostmourne?").await.unwrap();
        assert!(answer.contains("Frostmourne"));
        assert!(!answer.contains("Jaina"));
    }

    #[tokio::test]
    async fn unmatched_question_gets_default_answer() {
        let index = engine().index_document(LORE).await.unwrap();
        assert_eq!(index.query("zeppelins?").await.unwrap(), DEFAULT_ANSWER);
    }

    #[tokio::test]
    async fn synthesizer_receives_context_and_question() {
        let generator = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let index = engine()
            .with_synthesizer(generator.clone())
            .index_document(LORE)
            .await
            .unwrap();

        let answer = index.query("Who studied in Dalaran?").await.unwrap();
        assert_eq!(answer, "synthesized");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Jaina Proudmoore studied magic in Dalaran."));
        assert!(prompts[0].contains("Query: Who studied in Dalaran?"));
    }

    #[tokio::test]
    async fn retrieve_limits_to_top_k() {
        let engine = engine().with_top_k(2);
        let chunks = chunk_text(LORE, 60, 0);
        assert_eq!(chunks.len(), 3);

        let vectorizer = TfIdfVectorizer::fit(&chunks);
        let index = VectorQueryEngine {
            chunks: chunks
                .iter()
                .map(|c| (c.clone(), vectorizer.transform(c)))
                .collect(),
            vectorizer,
            top_k: engine.top_k,
            synthesizer: None,
        };

        let results = index.retrieve("Arthas Frostmourne Dalaran");
        assert_eq!(results.len(), 2);
        assert!(results[0].1 >= results[1].1);
    }
}
