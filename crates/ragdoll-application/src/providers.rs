//! Provider wiring.
//!
//! The session only sees capability traits; this module decides which
//! adapter backs each one based on `Settings`.

use std::sync::Arc;

use ragdoll_core::cache::ResponseCache;
use ragdoll_core::config::{ImageProviderKind, Settings, TextProviderKind};
use ragdoll_core::error::{ConfigError, RagdollError, Result};
use ragdoll_core::provider::{
    ImageGenerator, ImageRenderer, KnowledgeExtractor, RetrievalEngine, TextGenerator,
};
use ragdoll_infrastructure::{FileCacheStore, RagdollPaths};
use ragdoll_interaction::{
    OllamaApiAgent, OpenAIApiAgent, StableDiffusionApiAgent, TerminalImageRenderer,
    VectorRetrievalEngine, WebKnowledgeExtractor,
};

/// The capability adapters a session runs against.
#[derive(Clone)]
pub struct Providers {
    pub extractor: Arc<dyn KnowledgeExtractor>,
    pub retrieval: Arc<dyn RetrievalEngine>,
    pub text: Arc<dyn TextGenerator>,
    /// `None` disables image generation regardless of the persona's art style
    pub image: Option<Arc<dyn ImageGenerator>>,
    /// `None` returns image references without rendering them
    pub renderer: Option<Arc<dyn ImageRenderer>>,
}

impl Providers {
    pub fn new(
        extractor: Arc<dyn KnowledgeExtractor>,
        retrieval: Arc<dyn RetrievalEngine>,
        text: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            extractor,
            retrieval,
            text,
            image: None,
            renderer: None,
        }
    }

    pub fn with_image(mut self, image: Arc<dyn ImageGenerator>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ImageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Builds the adapters selected by `settings`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSetting` when OpenAI text generation is
    /// selected without an API key.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let text: Arc<dyn TextGenerator> = match settings.text_provider {
            TextProviderKind::OpenAI => {
                let api_key = settings
                    .openai_api_key
                    .clone()
                    .ok_or_else(missing_api_key)?;
                Arc::new(OpenAIApiAgent::new(api_key, &settings.text_model))
            }
            TextProviderKind::Ollama => {
                Arc::new(OllamaApiAgent::new(&settings.ollama_uri, &settings.text_model))
            }
        };

        let image: Option<Arc<dyn ImageGenerator>> = match settings.image.provider {
            ImageProviderKind::OpenAI => match &settings.openai_api_key {
                Some(api_key) => Some(Arc::new(
                    OpenAIApiAgent::new(api_key, &settings.text_model)
                        .with_image_model(&settings.image.model),
                )),
                None => {
                    tracing::warn!("No OpenAI API key configured; image generation is disabled");
                    None
                }
            },
            ImageProviderKind::StableDiffusion => {
                Some(Arc::new(StableDiffusionApiAgent::from_settings(&settings.image)))
            }
        };

        let renderer: Option<Arc<dyn ImageRenderer>> = if settings.render {
            Some(Arc::new(TerminalImageRenderer::new()))
        } else {
            None
        };

        tracing::debug!(
            "Providers: text={:?}/{}, image={:?}, render={}",
            settings.text_provider,
            settings.text_model,
            image.as_ref().map(|_| settings.image.provider),
            settings.render
        );

        Ok(Self {
            extractor: Arc::new(WebKnowledgeExtractor::new()),
            retrieval: Arc::new(VectorRetrievalEngine::new().with_synthesizer(text.clone())),
            text,
            image,
            renderer,
        })
    }
}

fn missing_api_key() -> RagdollError {
    ConfigError::InvalidSetting {
        key: "OPENAI_API_KEY".to_string(),
        value: String::new(),
    }
    .into()
}

/// Opens the file-backed response cache at `STORAGE_URI` (or the default
/// cache file) with the configured key length and cache policy.
pub fn open_cache(settings: &Settings) -> Result<ResponseCache> {
    let path = RagdollPaths::storage_path(settings)
        .map_err(|e| RagdollError::storage(e.to_string()))?;
    tracing::debug!("Cache store: {}", path.display());

    let cache = ResponseCache::new(
        Arc::new(FileCacheStore::new(path)),
        settings.max_storage_key_length,
    );
    Ok(cache.with_enabled(settings.cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn openai_text_requires_api_key() {
        let result = Providers::from_settings(&Settings::default());
        assert!(matches!(
            result,
            Err(RagdollError::Config(ConfigError::InvalidSetting { .. }))
        ));
    }

    #[test]
    fn ollama_with_stable_diffusion_needs_no_key() {
        let settings = Settings::from_lookup(|key| match key {
            "TEXT_PROVIDER" => Some("ollama".to_string()),
            "IMAGE_PROVIDER" => Some("stable_diffusion".to_string()),
            "RENDER" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();

        let providers = Providers::from_settings(&settings).unwrap();
        assert_eq!(providers.text.model_name(), "mistral");
        assert!(providers.image.is_some());
        assert!(providers.renderer.is_some());
    }

    #[test]
    fn openai_images_without_key_are_disabled() {
        let settings = Settings::from_lookup(|key| match key {
            "TEXT_PROVIDER" => Some("ollama".to_string()),
            _ => None,
        })
        .unwrap();

        let providers = Providers::from_settings(&settings).unwrap();
        assert!(providers.image.is_none());
        assert!(providers.renderer.is_none());
    }

    #[tokio::test]
    async fn open_cache_uses_storage_uri() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.toml");
        let settings = Settings {
            storage_uri: Some(path.clone()),
            ..Settings::default()
        };

        let cache = open_cache(&settings).unwrap();
        cache.remember("k", "v").await.unwrap();

        assert!(cache.is_enabled());
        assert!(path.exists());
    }
}
