//! Runtime settings and secret configuration.
//!
//! `Settings` holds every process-boundary knob. It is parsed from a key
//! lookup rather than from `std::env` directly, so infrastructure decides where
//! values come from (environment, `.env` file) and tests can pass a map.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_MAX_KEY_LENGTH;
use crate::error::ConfigError;

pub const DEFAULT_OPENAI_TEXT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_TEXT_MODEL: &str = "mistral";
pub const DEFAULT_OLLAMA_URI: &str = "http://localhost:11434";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_IMAGE_MODEL_URI: &str = "http://localhost:7860";

/// Which adapter backs text generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
}

impl TextProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAI => DEFAULT_OPENAI_TEXT_MODEL,
            Self::Ollama => DEFAULT_OLLAMA_TEXT_MODEL,
        }
    }
}

impl FromStr for TextProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Which adapter backs image generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    StableDiffusion,
}

impl FromStr for ImageProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "stable_diffusion" | "stable-diffusion" | "sd" => Ok(Self::StableDiffusion),
            _ => Err(()),
        }
    }
}

/// Whether follow-up `chat` turns consult the cache for their retrieval query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpQueryPolicy {
    /// Always query the index on follow-ups; the fresh answer is still recorded.
    #[default]
    Requery,
    /// Follow-ups use the same recall/remember policy as the first turn.
    Cached,
}

impl FromStr for FollowUpQueryPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "requery" => Ok(Self::Requery),
            "cached" => Ok(Self::Cached),
            _ => Err(()),
        }
    }
}

/// Image request knobs shared by the image adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    pub provider: ImageProviderKind,
    pub model: String,
    /// Stable Diffusion WebUI base URL
    pub model_uri: String,
    pub size: u32,
    pub quality: String,
    pub batch_size: u32,
    pub cfg_scale: f32,
    pub denoising_strength: f32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            provider: ImageProviderKind::default(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            model_uri: DEFAULT_IMAGE_MODEL_URI.to_string(),
            size: 1024,
            quality: "standard".to_string(),
            batch_size: 1,
            cfg_scale: 7.0,
            denoising_strength: 0.75,
        }
    }
}

/// Process-wide runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Default cache policy; a persona may still disable it
    pub cache: bool,
    pub verbose: bool,
    /// Render generated images on the terminal
    pub render: bool,
    /// Pause after every provider call that reached the network
    pub delay: Duration,
    pub max_storage_key_length: usize,
    /// Cache file location; `None` uses the default config path
    pub storage_uri: Option<PathBuf>,
    pub text_provider: TextProviderKind,
    pub text_model: String,
    pub ollama_uri: String,
    pub image: ImageSettings,
    pub follow_up_query: FollowUpQueryPolicy,
    pub openai_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache: true,
            verbose: false,
            render: false,
            delay: Duration::ZERO,
            max_storage_key_length: DEFAULT_MAX_KEY_LENGTH,
            storage_uri: None,
            text_provider: TextProviderKind::default(),
            text_model: DEFAULT_OPENAI_TEXT_MODEL.to_string(),
            ollama_uri: DEFAULT_OLLAMA_URI.to_string(),
            image: ImageSettings::default(),
            follow_up_query: FollowUpQueryPolicy::default(),
            openai_api_key: None,
        }
    }
}

impl Settings {
    /// Builds settings from a variable lookup, falling back to defaults for
    /// absent or blank values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        let text_provider: TextProviderKind =
            parse_or(&get, "TEXT_PROVIDER", defaults.text_provider)?;

        let image_defaults = ImageSettings::default();
        let image = ImageSettings {
            provider: parse_or(&get, "IMAGE_PROVIDER", image_defaults.provider)?,
            model: get("IMAGE_MODEL").unwrap_or(image_defaults.model),
            model_uri: get("IMAGE_MODEL_URI").unwrap_or(image_defaults.model_uri),
            size: parse_or(&get, "IMAGE_SIZE", image_defaults.size)?,
            quality: get("IMAGE_QUALITY").unwrap_or(image_defaults.quality),
            batch_size: parse_or(&get, "IMAGE_BATCH_SIZE", image_defaults.batch_size)?,
            cfg_scale: parse_or(&get, "IMAGE_CFG_SCALE", image_defaults.cfg_scale)?,
            denoising_strength: parse_or(
                &get,
                "IMAGE_DENOISING_STRENGTH",
                image_defaults.denoising_strength,
            )?,
        };

        Ok(Self {
            cache: parse_flag(&get, "CACHE", defaults.cache)?,
            verbose: parse_flag(&get, "VERBOSE", defaults.verbose)?,
            render: parse_flag(&get, "RENDER", defaults.render)?,
            delay: Duration::from_millis(parse_or(&get, "DELAY", 0u64)?),
            max_storage_key_length: parse_or(
                &get,
                "MAX_STORAGE_KEY_LENGTH",
                defaults.max_storage_key_length,
            )?,
            storage_uri: get("STORAGE_URI").map(PathBuf::from),
            text_provider,
            text_model: get("TEXT_MODEL")
                .unwrap_or_else(|| text_provider.default_model().to_string()),
            ollama_uri: get("OLLAMA_URI").unwrap_or(defaults.ollama_uri),
            image,
            follow_up_query: parse_or(&get, "FOLLOW_UP_QUERY", defaults.follow_up_query)?,
            openai_api_key: get("OPENAI_API_KEY"),
        })
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.parse().map_err(|_| invalid(key, &value)),
        None => Ok(default),
    }
}

fn parse_flag<G>(get: &G, key: &str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(invalid(key, &value)),
        },
        None => Ok(default),
    }
}

/// Root structure of `secret.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub openai: Option<OpenAIConfig>,
}

/// OpenAI API credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.cache);
        assert_eq!(settings.max_storage_key_length, 255);
        assert_eq!(settings.follow_up_query, FollowUpQueryPolicy::Requery);
    }

    #[test]
    fn parses_every_knob() {
        let settings = Settings::from_lookup(lookup(&[
            ("CACHE", "false"),
            ("VERBOSE", "TRUE"),
            ("RENDER", "1"),
            ("DELAY", "1500"),
            ("MAX_STORAGE_KEY_LENGTH", "64"),
            ("STORAGE_URI", "/tmp/ragdoll.toml"),
            ("TEXT_PROVIDER", "ollama"),
            ("IMAGE_PROVIDER", "stable_diffusion"),
            ("IMAGE_SIZE", "512"),
            ("IMAGE_BATCH_SIZE", "2"),
            ("IMAGE_CFG_SCALE", "5.5"),
            ("FOLLOW_UP_QUERY", "cached"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert!(!settings.cache);
        assert!(settings.verbose);
        assert!(settings.render);
        assert_eq!(settings.delay, Duration::from_millis(1500));
        assert_eq!(settings.max_storage_key_length, 64);
        assert_eq!(settings.storage_uri, Some(PathBuf::from("/tmp/ragdoll.toml")));
        assert_eq!(settings.text_provider, TextProviderKind::Ollama);
        assert_eq!(settings.text_model, DEFAULT_OLLAMA_TEXT_MODEL);
        assert_eq!(settings.image.provider, ImageProviderKind::StableDiffusion);
        assert_eq!(settings.image.size, 512);
        assert_eq!(settings.image.batch_size, 2);
        assert_eq!(settings.image.cfg_scale, 5.5);
        assert_eq!(settings.follow_up_query, FollowUpQueryPolicy::Cached);
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn explicit_text_model_wins_over_provider_default() {
        let settings = Settings::from_lookup(lookup(&[
            ("TEXT_PROVIDER", "ollama"),
            ("TEXT_MODEL", "llama3"),
        ]))
        .unwrap();
        assert_eq!(settings.text_model, "llama3");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let settings = Settings::from_lookup(lookup(&[("DELAY", "  "), ("CACHE", "")])).unwrap();
        assert_eq!(settings.delay, Duration::ZERO);
        assert!(settings.cache);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = Settings::from_lookup(lookup(&[("DELAY", "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidSetting {
                key: "DELAY".into(),
                value: "soon".into()
            }
        );

        assert!(Settings::from_lookup(lookup(&[("CACHE", "maybe")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("TEXT_PROVIDER", "claude")])).is_err());
    }

    #[test]
    fn secret_config_parses_openai_section() {
        let secret: SecretConfig =
            serde_json::from_str(r#"{"openai": {"api_key": "sk-123"}}"#).unwrap();
        assert_eq!(secret.openai.unwrap().api_key, "sk-123");

        let empty: SecretConfig = serde_json::from_str("{}").unwrap();
        assert!(empty.openai.is_none());
    }
}
