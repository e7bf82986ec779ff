//! Generation stages: styled text, then an optional image.
//!
//! Both follow the same cache-then-call pattern. Provider failures are
//! recovered here and never abort the turn: a text failure becomes the reply
//! text, an image failure becomes "no image".

use std::sync::Arc;

use ragdoll_core::cache::ResponseCache;
use ragdoll_core::config::ImageSettings;
use ragdoll_core::messages;
use ragdoll_core::prompt::with_prefix;
use ragdoll_core::provider::{ImageGenerator, ImageRequest, TextGenerator};

use crate::cache_policy::{recall_or_miss, remember_or_warn};
use crate::pacer::Pacer;

/// Rewrites a retrieval answer in the persona's voice.
pub struct TextGenerationStage {
    generator: Arc<dyn TextGenerator>,
    cache: ResponseCache,
    pacer: Arc<Pacer>,
}

impl TextGenerationStage {
    pub fn new(generator: Arc<dyn TextGenerator>, cache: ResponseCache, pacer: Arc<Pacer>) -> Self {
        Self {
            generator,
            cache,
            pacer,
        }
    }

    /// Generates the styled reply for `answer`.
    ///
    /// The cache key is `answer` itself, so differently phrased questions that
    /// retrieve the same answer share one reply. A provider error is returned
    /// as the reply text and is not cached.
    pub async fn generate(&self, prefix: &str, answer: &str) -> String {
        if let Some(cached) = recall_or_miss(&self.cache, answer).await {
            tracing::info!("{}", messages::TEXT_FROM_CACHE);
            return cached;
        }

        let prompt = with_prefix(prefix, answer);
        let model = self.generator.model_name();
        tracing::info!("{}", messages::text_model_prompt(model, &prompt));

        let reply = match self.generator.generate_text(&prompt).await {
            Ok(text) => {
                remember_or_warn(&self.cache, answer, &text).await;
                text
            }
            Err(e) => {
                tracing::error!("Text model ({}) error: {}", model, e);
                e.to_string()
            }
        };

        tracing::info!("Text model ({}) responded with \"{}\".", model, reply);
        self.pacer.pause().await;
        reply
    }
}

/// Images produced for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedImages {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl GeneratedImages {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }
}

/// Illustrates a reply in the persona's art style.
pub struct ImageGenerationStage {
    generator: Arc<dyn ImageGenerator>,
    cache: ResponseCache,
    pacer: Arc<Pacer>,
    settings: ImageSettings,
}

impl ImageGenerationStage {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        cache: ResponseCache,
        pacer: Arc<Pacer>,
        settings: ImageSettings,
    ) -> Self {
        Self {
            generator,
            cache,
            pacer,
            settings,
        }
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Generates images for `subject`, which is also the cache key.
    ///
    /// With `init_image` the provider runs image-to-image. Only the first
    /// image is cached, so a cache hit never carries a second image.
    pub async fn generate(
        &self,
        prefix: &str,
        subject: &str,
        init_image: Option<&str>,
    ) -> GeneratedImages {
        if let Some(cached) = recall_or_miss(&self.cache, subject).await {
            tracing::info!("{}", messages::IMAGE_FROM_CACHE);
            return GeneratedImages {
                primary: Some(cached),
                secondary: None,
            };
        }

        let prompt = with_prefix(prefix, subject);
        let model = self.generator.model_name();
        tracing::info!("{}", messages::image_model_prompt(model, &prompt));

        let request = ImageRequest::new(prompt)
            .with_size(self.settings.size)
            .with_quality(&self.settings.quality)
            .with_count(self.settings.batch_size)
            .with_init_image(init_image.map(str::to_string));

        let result = self.generator.generate_image(request).await;
        self.pacer.pause().await;

        match result {
            Ok(images) => {
                let mut images = images.into_iter();
                let generated = GeneratedImages {
                    primary: images.next(),
                    secondary: images.next(),
                };
                if let Some(primary) = &generated.primary {
                    remember_or_warn(&self.cache, subject, primary).await;
                    tracing::info!(
                        "Image model ({}) responded with \"{}...\".",
                        model,
                        preview(primary)
                    );
                }
                generated
            }
            Err(e) => {
                tracing::error!("Image model ({}) error: {}", model, e);
                GeneratedImages::none()
            }
        }
    }
}

fn preview(image_ref: &str) -> &str {
    ragdoll_core::cache::truncate_key(image_ref, 64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragdoll_core::ProviderError;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedText {
        reply: std::result::Result<String, ProviderError>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedText {
        async fn generate_text(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct ScriptedImages {
        images: std::result::Result<Vec<String>, ProviderError>,
        requests: Mutex<Vec<ImageRequest>>,
    }

    #[async_trait]
    impl ImageGenerator for ScriptedImages {
        async fn generate_image(
            &self,
            request: ImageRequest,
        ) -> std::result::Result<Vec<String>, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.images.clone()
        }

        fn model_name(&self) -> &str {
            "scripted-image"
        }
    }

    fn pacer() -> Arc<Pacer> {
        Arc::new(Pacer::new(Duration::ZERO))
    }

    #[tokio::test]
    async fn text_is_cached_by_answer() {
        let generator = Arc::new(ScriptedText {
            reply: Ok("I was a prince.".into()),
            prompts: Mutex::new(Vec::new()),
        });
        let cache = ResponseCache::in_memory();
        let stage = TextGenerationStage::new(generator.clone(), cache.clone(), pacer());

        let reply = stage.generate("Speak as Arthas:", "Arthas was a prince.").await;

        assert_eq!(reply, "I was a prince.");
        assert_eq!(
            generator.prompts.lock().unwrap()[0],
            "Speak as Arthas: Arthas was a prince."
        );
        assert_eq!(
            cache.recall("Arthas was a prince.").await.unwrap().as_deref(),
            Some("I was a prince.")
        );

        stage.generate("Speak as Arthas:", "Arthas was a prince.").await;
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn text_error_becomes_reply_and_is_not_cached() {
        let generator = Arc::new(ScriptedText {
            reply: Err(ProviderError::execution("quota exceeded")),
            prompts: Mutex::new(Vec::new()),
        });
        let cache = ResponseCache::in_memory();
        let pacer = pacer();
        let stage = TextGenerationStage::new(generator, cache.clone(), pacer.clone());

        let reply = stage.generate("prefix", "answer").await;

        assert_eq!(reply, "quota exceeded");
        assert_eq!(cache.recall("answer").await.unwrap(), None);
        assert_eq!(pacer.pauses(), 1);
    }

    #[tokio::test]
    async fn image_request_uses_settings_and_caches_first_image() {
        let generator = Arc::new(ScriptedImages {
            images: Ok(vec!["url-1".into(), "url-2".into()]),
            requests: Mutex::new(Vec::new()),
        });
        let cache = ResponseCache::in_memory();
        let settings = ImageSettings {
            size: 512,
            batch_size: 2,
            ..ImageSettings::default()
        };
        let stage = ImageGenerationStage::new(generator.clone(), cache.clone(), pacer(), settings);

        let images = stage.generate("Paint:", "I was a prince.", None).await;

        assert_eq!(images.primary.as_deref(), Some("url-1"));
        assert_eq!(images.secondary.as_deref(), Some("url-2"));
        {
            let requests = generator.requests.lock().unwrap();
            assert_eq!(requests[0].prompt, "Paint: I was a prince.");
            assert_eq!(requests[0].size, 512);
            assert_eq!(requests[0].n, 2);
            assert_eq!(requests[0].init_image, None);
        }

        let cached = stage.generate("Paint:", "I was a prince.", None).await;
        assert_eq!(cached.primary.as_deref(), Some("url-1"));
        assert_eq!(cached.secondary, None);
        assert_eq!(generator.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn image_error_yields_no_image() {
        let generator = Arc::new(ScriptedImages {
            images: Err(ProviderError::execution("content policy")),
            requests: Mutex::new(Vec::new()),
        });
        let cache = ResponseCache::in_memory();
        let stage =
            ImageGenerationStage::new(generator, cache.clone(), pacer(), ImageSettings::default());

        let images = stage.generate("Paint:", "subject", Some("data:image/png;base64,AA")).await;

        assert!(images.is_empty());
        assert_eq!(cache.recall("subject").await.unwrap(), None);
    }
}
