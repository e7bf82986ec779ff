//! Rewrites user questions about the persona into the third person.

use std::sync::Arc;

use ragdoll_core::cache::ResponseCache;
use ragdoll_core::messages;
use ragdoll_core::prompt::with_prefix;
use ragdoll_core::provider::TextGenerator;

use crate::cache_policy::{recall_or_miss, remember_or_warn};
use crate::pacer::Pacer;

/// Turns "who are you?" into "Who is Arthas?" before it reaches the index.
pub struct InputRewriter {
    generator: Arc<dyn TextGenerator>,
    cache: ResponseCache,
    pacer: Arc<Pacer>,
    prefix: String,
}

impl InputRewriter {
    /// # Arguments
    ///
    /// * `prefix` - The composed input rewrite prompt for the persona
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        cache: ResponseCache,
        pacer: Arc<Pacer>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            cache,
            pacer,
            prefix: prefix.into(),
        }
    }

    /// Returns the rewritten question, cached by the raw input.
    ///
    /// A provider failure falls back to the raw input.
    pub async fn rewrite(&self, input: &str) -> String {
        if let Some(cached) = recall_or_miss(&self.cache, input).await {
            tracing::info!("{}", messages::USER_QUESTION_FROM_CACHE);
            return cached;
        }

        let prompt = with_prefix(&self.prefix, input);
        let model = self.generator.model_name();
        tracing::info!("{}", messages::text_model_prompt(model, &prompt));

        let result = self.generator.generate_text(&prompt).await;
        self.pacer.pause().await;

        match result {
            Ok(rewritten) if !rewritten.trim().is_empty() => {
                remember_or_warn(&self.cache, input, &rewritten).await;
                tracing::info!("Text model ({}) responded with \"{}\".", model, rewritten);
                rewritten
            }
            Ok(_) => {
                tracing::warn!("Text model ({}) returned an empty rewrite; using the input as is", model);
                input.to_string()
            }
            Err(e) => {
                tracing::warn!("Text model ({}) could not rewrite the input: {}", model, e);
                input.to_string()
            }
        }
    }
}
