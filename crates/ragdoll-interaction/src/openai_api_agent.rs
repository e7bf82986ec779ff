//! OpenAIApiAgent - REST client for OpenAI chat completions and image generation.
//!
//! Credentials come from settings (`secret.json` first, then `OPENAI_API_KEY`).

use async_trait::async_trait;
use ragdoll_core::ProviderError;
use ragdoll_core::config::DEFAULT_IMAGE_MODEL;
use ragdoll_core::provider::{ImageGenerator, ImageRequest, TextGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http_error::{decode_error, ensure_success, transport_error};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "OpenAI API";

/// Agent implementation that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAIApiAgent {
    client: Client,
    api_key: String,
    model: String,
    image_model: String,
    base_url: String,
    temperature: Option<f32>,
}

impl OpenAIApiAgent {
    /// Creates a new agent with the provided API key and text model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
        }
    }

    pub fn with_image_model(mut self, image_model: impl Into<String>) -> Self {
        self.image_model = image_model.into();
        self
    }

    /// Points the agent at a compatible server (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ProviderError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| transport_error(PROVIDER, err))?;

        ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| decode_error(PROVIDER, err))
    }
}

#[async_trait]
impl TextGenerator for OpenAIApiAgent {
    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        if prompt.trim().is_empty() {
            return Err(ProviderError::execution(
                "OpenAI prompt must include text",
            ));
        }

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let parsed: ChatCompletionResponse = self.post("chat/completions", &request).await?;
        extract_text_response(parsed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ImageGenerator for OpenAIApiAgent {
    async fn generate_image(&self, request: ImageRequest) -> Result<Vec<String>, ProviderError> {
        if request.init_image.is_some() {
            tracing::warn!(
                "{} does not support image-to-image; ignoring init image",
                self.image_model
            );
        }

        let body = ImageGenerationRequest {
            model: &self.image_model,
            prompt: &request.prompt,
            size: format!("{}x{}", request.size, request.size),
            quality: &request.quality,
            n: request.n,
        };

        let parsed: ImageGenerationResponse = self.post("images/generations", &body).await?;
        let images: Vec<String> = parsed
            .data
            .into_iter()
            .filter_map(|image| match (image.url, image.b64_json) {
                (Some(url), _) => Some(url),
                (None, Some(b64)) => Some(format!("data:image/png;base64,{}", b64)),
                (None, None) => None,
            })
            .collect();

        if images.is_empty() {
            return Err(ProviderError::execution(
                "OpenAI API returned no images in the response",
            ));
        }
        Ok(images)
    }

    fn model_name(&self) -> &str {
        &self.image_model
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: String,
    quality: &'a str,
    n: u32,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: Option<String>,
    b64_json: Option<String>,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            ProviderError::execution("OpenAI API returned no content in the response")
        })
}
