//! OllamaApiAgent - text generation against a local Ollama server.

use async_trait::async_trait;
use ragdoll_core::ProviderError;
use ragdoll_core::config::{DEFAULT_OLLAMA_TEXT_MODEL, DEFAULT_OLLAMA_URI};
use ragdoll_core::provider::TextGenerator;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http_error::{decode_error, ensure_success, transport_error};

const PROVIDER: &str = "Ollama API";

#[derive(Clone)]
pub struct OllamaApiAgent {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaApiAgent {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.5,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for OllamaApiAgent {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_URI, DEFAULT_OLLAMA_TEXT_MODEL)
    }
}

#[async_trait]
impl TextGenerator for OllamaApiAgent {
    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|err| transport_error(PROVIDER, err))?;

        let parsed: ChatResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| decode_error(PROVIDER, err))?;

        let content = parsed.message.content.trim().to_string();
        if content.is_empty() {
            return Err(ProviderError::execution(
                "Ollama returned an empty message",
            ));
        }
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_disables_streaming() {
        let request = ChatRequest {
            model: "mistral",
            messages: vec![ChatMessage {
                role: "user",
                content: "Hi",
            }],
            stream: false,
            options: ChatOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.5);
    }

    #[test]
    fn default_points_at_local_server() {
        let agent = OllamaApiAgent::default();
        assert_eq!(agent.base_url, "http://localhost:11434");
        assert_eq!(agent.model_name(), "mistral");
    }
}
