//! Knowledge loading from one primary and any number of additional sources.

use std::sync::Arc;

use ragdoll_core::error::Result;
use ragdoll_core::messages;
use ragdoll_core::provider::KnowledgeExtractor;

/// Separator placed between the texts of consecutive sources.
const SOURCE_SEPARATOR: &str = "\n\n";

pub struct KnowledgeLoader {
    extractor: Arc<dyn KnowledgeExtractor>,
}

impl KnowledgeLoader {
    pub fn new(extractor: Arc<dyn KnowledgeExtractor>) -> Self {
        Self { extractor }
    }

    /// Extracts the text of a single source.
    pub async fn load(&self, uri: &str) -> Result<String> {
        self.extractor.extract(uri).await
    }

    /// Extracts `primary`, then each of `additional` in order, joined by a
    /// blank line.
    ///
    /// The first failing source aborts the load; nothing extracted so far is
    /// returned.
    pub async fn load_many(&self, primary: &str, additional: &[String]) -> Result<String> {
        tracing::info!("{}", messages::extracting(primary));
        let mut text = self.load(primary).await?;
        tracing::info!("{}", messages::DONE);

        if additional.is_empty() {
            return Ok(text);
        }

        tracing::info!("{}", messages::ADDITIONAL_KNOWLEDGE);
        let total = additional.len();
        for (index, uri) in additional.iter().enumerate() {
            tracing::info!("{}", messages::extracting_additional(uri, index + 1, total));
            let extra = self.load(uri).await?;
            text.push_str(SOURCE_SEPARATOR);
            text.push_str(&extra);
        }
        tracing::info!("{}", messages::DONE);

        Ok(text)
    }
}
