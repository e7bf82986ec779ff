//! Persona configuration model.
//!
//! `PersonaConfig` is the caller-facing, partially filled record (fields fall
//! back to the Arthas preset, except the art style which defaults to none). `Persona` is the validated, immutable form
//! a session is built from.

use serde::{Deserialize, Serialize};

use super::preset::{
    DEFAULT_ADDITIONAL_KNOWLEDGE_URIS, DEFAULT_KNOWLEDGE_URI, DEFAULT_NAME, DEFAULT_WRITING_STYLE,
    DEFAULT_WRITING_TONE,
};
use crate::error::{ConfigError, Result};
use crate::prompt::PromptTemplates;

/// Caller-supplied persona configuration merged over the documented defaults.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PersonaConfig {
    /// Display name the persona speaks as
    pub name: String,
    /// Writing style descriptor used by the output text prompt
    pub writing_style: String,
    /// Writing tone descriptor used by the output text prompt
    pub writing_tone: String,
    /// Art style descriptor; empty disables image generation
    pub art_style: String,
    /// Primary knowledge source; also the cache key of the loaded text
    pub knowledge_uri: String,
    /// Extra knowledge sources appended after the primary one
    pub additional_knowledge_uris: Vec<String>,
    /// `false` clears the cache store and disables caching for the session
    pub cache: bool,
    /// Opening question used when no explicit query is given
    pub greeting: Option<String>,
    /// First question asked during session start
    pub query: Option<String>,
    /// Init image (URL or data URI); switches image generation to img2img
    /// and skips the retrieval and text stages
    pub image_src: Option<String>,
    /// Prompt templates with named placeholders
    pub templates: PromptTemplates,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            writing_style: DEFAULT_WRITING_STYLE.to_string(),
            writing_tone: DEFAULT_WRITING_TONE.to_string(),
            art_style: String::new(),
            knowledge_uri: DEFAULT_KNOWLEDGE_URI.to_string(),
            additional_knowledge_uris: DEFAULT_ADDITIONAL_KNOWLEDGE_URIS
                .iter()
                .map(|uri| uri.to_string())
                .collect(),
            cache: true,
            greeting: None,
            query: None,
            image_src: None,
            templates: PromptTemplates::default(),
        }
    }
}

impl PersonaConfig {
    /// Parses a persona TOML document; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Validates required fields and resolves the opening query.
    ///
    /// Checks run in a fixed order (knowledge URI, name, writing style, query)
    /// so the first missing field is the one reported. The greeting only
    /// stands in for the query when no query is given.
    pub fn validate(self) -> std::result::Result<Persona, ConfigError> {
        let knowledge_uri = required(self.knowledge_uri).ok_or(ConfigError::KnowledgeUri)?;
        let name = required(self.name).ok_or(ConfigError::Name)?;
        let writing_style = required(self.writing_style).ok_or(ConfigError::WritingStyle)?;

        let query = self
            .query
            .and_then(required)
            .or_else(|| self.greeting.and_then(required))
            .ok_or(ConfigError::Query)?;

        Ok(Persona {
            name,
            writing_style,
            writing_tone: self.writing_tone.trim().to_string(),
            art_style: required(self.art_style),
            knowledge_uri,
            additional_knowledge_uris: self
                .additional_knowledge_uris
                .into_iter()
                .filter_map(required)
                .collect(),
            cache_enabled: self.cache,
            query,
            image_src: self.image_src.and_then(required),
            templates: self.templates,
        })
    }
}

/// Validated, immutable persona configuration for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    pub name: String,
    pub writing_style: String,
    pub writing_tone: String,
    /// `None` disables image generation entirely
    pub art_style: Option<String>,
    pub knowledge_uri: String,
    pub additional_knowledge_uris: Vec<String>,
    pub cache_enabled: bool,
    /// Opening query (explicit query or greeting)
    pub query: String,
    pub image_src: Option<String>,
    pub templates: PromptTemplates,
}

fn required(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
