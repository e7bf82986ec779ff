//! Persona session orchestration.
//!
//! # Module Structure
//!
//! - `PersonaSession`: owns the per-session state and drives each turn
//!   through the pipeline stages
//! - `SessionState`: lifecycle states, logged on every transition
//! - `PersonaReply`: what a turn returns for display
//! - `SessionOptions`: runtime knobs taken from `Settings`
//!
//! A turn resolves its stages strictly in order. Each stage's cache key is the
//! value resolved by the stage before it: the query keys the retrieval answer,
//! the answer keys the styled text, the styled text (or the query when text is
//! skipped) keys the image.

mod options;
mod reply;
mod state;

pub use options::SessionOptions;
pub use reply::PersonaReply;
pub use state::SessionState;

use std::sync::Arc;

use ragdoll_core::cache::ResponseCache;
use ragdoll_core::config::FollowUpQueryPolicy;
use ragdoll_core::error::{RagdollError, Result};
use ragdoll_core::messages;
use ragdoll_core::persona::{Persona, PersonaConfig};
use ragdoll_core::prompt::PersonaPrompts;
use ragdoll_core::provider::{ImageRenderer, QueryEngine};
use tracing::Instrument;
use uuid::Uuid;

use crate::cache_policy::{recall_or_miss, remember_or_warn};
use crate::generation_stage::{GeneratedImages, ImageGenerationStage, TextGenerationStage};
use crate::knowledge_loader::KnowledgeLoader;
use crate::pacer::Pacer;
use crate::providers::Providers;
use crate::retrieval_stage::RetrievalStage;

/// Values resolved by the current turn and the index they are drawn from.
#[derive(Default)]
struct Conversation {
    index: Option<Box<dyn QueryEngine>>,
    knowledge: Option<String>,
    query: String,
    query_response: Option<String>,
    message_response: String,
    images: GeneratedImages,
}

/// One persona conversation.
///
/// The knowledge index is built once in `start` and reused by every `chat`
/// call. `chat` takes `&mut self`, so turns never overlap.
pub struct PersonaSession {
    id: String,
    persona: Persona,
    prompts: PersonaPrompts,
    options: SessionOptions,
    cache: ResponseCache,
    pacer: Arc<Pacer>,
    loader: KnowledgeLoader,
    retrieval: RetrievalStage,
    text: TextGenerationStage,
    image: Option<ImageGenerationStage>,
    renderer: Option<Arc<dyn ImageRenderer>>,
    state: SessionState,
    conversation: Conversation,
    span: tracing::Span,
}

impl PersonaSession {
    /// Validates the persona, applies its cache policy and answers the
    /// opening query.
    ///
    /// # Arguments
    ///
    /// * `config` - Persona configuration; its query (or greeting) opens the session
    /// * `providers` - Capability adapters for every external call
    /// * `cache` - Shared cache client; a persona with `cache = false` clears it
    /// * `options` - Runtime knobs (pacing, rendering, follow-up policy)
    ///
    /// # Errors
    ///
    /// * `RagdollError::Config` - the persona is incomplete; nothing external was called
    /// * `RagdollError::Extraction` - a knowledge source failed; no index was built
    ///   and no generation ran
    /// * `RagdollError::Provider` - indexing or the opening query failed
    pub async fn start(
        config: PersonaConfig,
        providers: Providers,
        cache: ResponseCache,
        options: SessionOptions,
    ) -> Result<(Self, PersonaReply)> {
        let persona = config.validate().map_err(|e| {
            tracing::error!("{}", e);
            RagdollError::from(e)
        })?;

        let mut session = Self::new(persona, providers, cache, options).await?;
        let reply = session.init().await?;
        Ok((session, reply))
    }

    async fn new(
        persona: Persona,
        providers: Providers,
        cache: ResponseCache,
        options: SessionOptions,
    ) -> Result<Self> {
        let id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("persona", name = %persona.name, session = %id);
        let prompts = PersonaPrompts::for_persona(&persona)?;

        let cache = if persona.cache_enabled {
            cache
        } else {
            disable_cache(&cache).instrument(span.clone()).await
        };

        let pacer = Arc::new(Pacer::new(options.delay));

        let image = match (&persona.art_style, providers.image) {
            (Some(_), Some(generator)) => Some(ImageGenerationStage::new(
                generator,
                cache.clone(),
                pacer.clone(),
                options.image.clone(),
            )),
            (Some(_), None) => {
                span.in_scope(|| {
                    tracing::warn!("Art style is set but no image provider is configured")
                });
                None
            }
            (None, _) => None,
        };

        let conversation = Conversation {
            query: persona.query.clone(),
            ..Conversation::default()
        };

        Ok(Self {
            id,
            loader: KnowledgeLoader::new(providers.extractor),
            retrieval: RetrievalStage::new(providers.retrieval, cache.clone(), pacer.clone()),
            text: TextGenerationStage::new(providers.text, cache.clone(), pacer.clone()),
            image,
            renderer: providers.renderer,
            persona,
            prompts,
            options,
            cache,
            pacer,
            state: SessionState::Uninitialized,
            conversation,
            span,
        })
    }

    /// Asks a follow-up question against the existing index.
    ///
    /// Knowledge is neither reloaded nor re-indexed.
    pub async fn chat(&mut self, input: &str) -> Result<PersonaReply> {
        if !self.state.accepts_chat() {
            return Err(RagdollError::internal(format!(
                "Session cannot chat while {}",
                self.state
            )));
        }

        let span = self.span.clone();
        async {
            self.conversation.query = input.to_string();
            self.respond(true).await
        }
        .instrument(span)
        .await
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn prompts(&self) -> &PersonaPrompts {
        &self.prompts
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The active query (the opening query, then the latest `chat` input).
    pub fn query(&self) -> &str {
        &self.conversation.query
    }

    /// The retrieval answer of the latest turn, if it ran one.
    pub fn query_response(&self) -> Option<&str> {
        self.conversation.query_response.as_deref()
    }

    /// The session's cache client (disabled when the persona opted out).
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    async fn init(&mut self) -> Result<PersonaReply> {
        let span = self.span.clone();
        async {
            tracing::info!("{}", messages::INITIALIZING);
            self.transition(SessionState::LoadingKnowledge);

            if let Err(e) = self.load_knowledge().await {
                tracing::error!("{}", e);
                self.transition(SessionState::Failed);
                return Err(e);
            }

            self.respond(false).await
        }
        .instrument(span)
        .await
    }

    /// Loads knowledge (cache first) and builds the session index.
    async fn load_knowledge(&mut self) -> Result<()> {
        let uri = self.persona.knowledge_uri.clone();
        let cached = recall_or_miss(&self.cache, &uri).await;
        tracing::info!("{}", messages::DONE);

        let text = match cached {
            Some(text) => {
                tracing::info!("{}", messages::KNOWLEDGE_FROM_CACHE);
                text
            }
            None => {
                self.loader
                    .load_many(&uri, &self.persona.additional_knowledge_uris)
                    .await?
            }
        };

        let index = self.retrieval.build_index(&text).await?;
        self.conversation.index = Some(index);
        self.conversation.knowledge = Some(text);
        Ok(())
    }

    /// Runs the stages of one turn and renders the reply.
    async fn respond(&mut self, follow_up: bool) -> Result<PersonaReply> {
        tracing::info!("{}", messages::PREPARING_RESPONSE);

        if let Some(knowledge) = &self.conversation.knowledge {
            remember_or_warn(&self.cache, &self.persona.knowledge_uri, knowledge).await;
        }

        if self.persona.image_src.is_some() {
            self.conversation.query_response = None;
            self.conversation.message_response = String::new();
        } else {
            self.transition(SessionState::Querying);
            let answer = match self.query_index(follow_up).await {
                Ok(answer) => answer,
                Err(e) => {
                    self.transition(SessionState::Idle);
                    return Err(e);
                }
            };

            self.transition(SessionState::GeneratingText);
            let message = self.text.generate(&self.prompts.output_text, &answer).await;
            self.conversation.query_response = Some(answer);
            self.conversation.message_response = message;
        }

        let images = if self.image.is_some() {
            self.transition(SessionState::GeneratingImage);
            self.generate_images().await
        } else {
            GeneratedImages::none()
        };
        self.conversation.images = images;

        self.transition(SessionState::Rendering);
        let reply = self.render().await;
        self.transition(SessionState::Idle);
        Ok(reply)
    }

    async fn query_index(&self, follow_up: bool) -> Result<String> {
        let index = self
            .conversation
            .index
            .as_deref()
            .ok_or_else(|| RagdollError::internal("Session has no knowledge index"))?;
        let query = &self.conversation.query;

        if follow_up && self.options.follow_up_query == FollowUpQueryPolicy::Requery {
            self.retrieval.requery(index, query).await
        } else {
            self.retrieval.answer(index, query).await
        }
    }

    async fn generate_images(&self) -> GeneratedImages {
        let (Some(stage), Some(prefix)) = (&self.image, &self.prompts.output_image) else {
            return GeneratedImages::none();
        };

        let subject = if self.conversation.message_response.is_empty() {
            &self.conversation.query
        } else {
            &self.conversation.message_response
        };

        stage
            .generate(prefix, subject, self.persona.image_src.as_deref())
            .await
    }

    async fn render(&self) -> PersonaReply {
        tracing::info!("{}", messages::PREPARING_DISPLAY);

        let text = self.conversation.message_response.clone();
        let images = &self.conversation.images;

        let Some(image_url) = images.primary.clone() else {
            if let Some(stage) = &self.image {
                tracing::info!("{}", messages::image_failed(stage.model_name()));
            }
            return PersonaReply::text_only(text);
        };

        let mut reply = PersonaReply {
            text,
            image: None,
            image_url: Some(image_url),
            image_url2: images.secondary.clone(),
        };

        if !self.options.render {
            return reply;
        }
        let Some(renderer) = &self.renderer else {
            tracing::warn!("Rendering is on but no image renderer is configured");
            return reply;
        };

        if let Some(url) = reply.image_url.as_deref() {
            match renderer.render(url).await {
                Ok(rendered) => {
                    tracing::info!("{}", messages::DONE);
                    reply.image = Some(rendered);
                }
                Err(e) => tracing::warn!("Could not render image: {}", e),
            }
        }
        reply
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("{} -> {}", self.state, next);
        self.state = next;
    }
}

/// Clears the shared store and returns a disabled client. A failed clear is
/// logged; the session still runs uncached.
async fn disable_cache(cache: &ResponseCache) -> ResponseCache {
    match cache.disable().await {
        Ok(disabled) => disabled,
        Err(e) => {
            tracing::warn!("Could not clear cache: {}", e);
            cache.with_enabled(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragdoll_core::ConfigError;
    use ragdoll_core::ProviderError;
    use ragdoll_core::provider::{KnowledgeExtractor, RetrievalEngine, TextGenerator};

    struct Echo;

    #[async_trait]
    impl KnowledgeExtractor for Echo {
        async fn extract(&self, uri: &str) -> Result<String> {
            Ok(format!("knowledge from {}", uri))
        }
    }

    #[async_trait]
    impl RetrievalEngine for Echo {
        async fn index_document(&self, _text: &str) -> Result<Box<dyn QueryEngine>> {
            Ok(Box::new(Echo))
        }
    }

    #[async_trait]
    impl QueryEngine for Echo {
        async fn query(&self, question: &str) -> std::result::Result<String, ProviderError> {
            Ok(format!("answer: {}", question))
        }
    }

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate_text(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
            Ok(prompt.rsplit(' ').next().unwrap_or_default().to_string())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn providers() -> Providers {
        let echo = Arc::new(Echo);
        Providers::new(echo.clone(), echo.clone(), echo)
    }

    fn config() -> PersonaConfig {
        PersonaConfig::default().with_query("Who is Arthas?")
    }

    #[tokio::test]
    async fn start_settles_in_idle() {
        let (session, reply) = PersonaSession::start(
            config(),
            providers(),
            ResponseCache::in_memory(),
            SessionOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.query(), "Who is Arthas?");
        assert_eq!(session.query_response(), Some("answer: Who is Arthas?"));
        assert_eq!(reply.text, "Arthas?");
        assert!(!reply.has_image());
    }

    #[tokio::test]
    async fn incomplete_persona_is_a_config_error() {
        let result = PersonaSession::start(
            PersonaConfig::default(),
            providers(),
            ResponseCache::in_memory(),
            SessionOptions::default(),
        )
        .await;

        assert!(matches!(
            result,
            Err(RagdollError::Config(ConfigError::Query))
        ));
    }

    #[tokio::test]
    async fn persona_without_cache_gets_disabled_client() {
        let cache = ResponseCache::in_memory();
        cache.remember("old", "entry").await.unwrap();

        let (session, _) = PersonaSession::start(
            config().with_cache(false),
            providers(),
            cache.clone(),
            SessionOptions::default(),
        )
        .await
        .unwrap();

        assert!(!session.cache().is_enabled());
        assert_eq!(cache.recall("old").await.unwrap(), None);
        assert_eq!(cache.recall("Who is Arthas?").await.unwrap(), None);
    }

    #[tokio::test]
    async fn chat_updates_active_query() {
        let (mut session, _) = PersonaSession::start(
            config(),
            providers(),
            ResponseCache::in_memory(),
            SessionOptions::default(),
        )
        .await
        .unwrap();

        let reply = session.chat("What is Frostmourne?").await.unwrap();

        assert_eq!(session.query(), "What is Frostmourne?");
        assert_eq!(reply.text, "Frostmourne?");
        assert_eq!(session.state(), SessionState::Idle);
    }
}
