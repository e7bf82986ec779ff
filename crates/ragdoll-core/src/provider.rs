//! Provider capability traits.
//!
//! The pipeline is written once against these seams. Each external service
//! (OpenAI, Ollama, Stable Diffusion, a web extractor, a vector index) is an
//! adapter implementing one or more of them, so swapping providers never
//! touches pipeline code.

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

/// Fetches plain text from a knowledge source.
#[async_trait::async_trait]
pub trait KnowledgeExtractor: Send + Sync {
    /// Returns the extracted text, or `RagdollError::Extraction` naming the URI.
    async fn extract(&self, uri: &str) -> Result<String>;
}

/// Builds a queryable index over one document.
#[async_trait::async_trait]
pub trait RetrievalEngine: Send + Sync {
    async fn index_document(&self, text: &str) -> Result<Box<dyn QueryEngine>>;
}

/// A built index that answers natural-language questions.
#[async_trait::async_trait]
pub trait QueryEngine: Send + Sync {
    async fn query(&self, question: &str) -> std::result::Result<String, ProviderError>;
}

/// Chat-style text generation.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> std::result::Result<String, ProviderError>;

    /// Model identifier, used in log messages.
    fn model_name(&self) -> &str;
}

/// Parameters of one image generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    /// Square edge length in pixels
    pub size: u32,
    pub quality: String,
    /// Number of images requested
    pub n: u32,
    /// Init image (URL or data URI) for image-to-image generation
    pub init_image: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: 1024,
            quality: "standard".to_string(),
            n: 1,
            init_image: None,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn with_count(mut self, n: u32) -> Self {
        self.n = n;
        self
    }

    pub fn with_init_image(mut self, init_image: Option<String>) -> Self {
        self.init_image = init_image;
        self
    }
}

/// Image generation.
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns one URL or `data:` URI per generated image.
    async fn generate_image(
        &self,
        request: ImageRequest,
    ) -> std::result::Result<Vec<String>, ProviderError>;

    fn model_name(&self) -> &str;
}

/// Turns an image reference into something printable on a terminal.
#[async_trait::async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn render(&self, image_ref: &str) -> std::result::Result<String, ProviderError>;
}
