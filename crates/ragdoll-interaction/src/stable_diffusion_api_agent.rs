//! StableDiffusionApiAgent - image generation through the Stable Diffusion WebUI API.
//!
//! Uses `/sdapi/v1/txt2img`, or `/sdapi/v1/img2img` when the request carries an
//! init image. Images come back base64 encoded and are returned as PNG data URIs.

use async_trait::async_trait;
use ragdoll_core::ProviderError;
use ragdoll_core::config::ImageSettings;
use ragdoll_core::provider::{ImageGenerator, ImageRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http_error::{decode_error, ensure_success, transport_error};

const PROVIDER: &str = "Stable Diffusion API";

#[derive(Clone)]
pub struct StableDiffusionApiAgent {
    client: Client,
    base_url: String,
    model: String,
    cfg_scale: f32,
    denoising_strength: f32,
}

impl StableDiffusionApiAgent {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: "stable-diffusion".to_string(),
            cfg_scale: 7.0,
            denoising_strength: 0.75,
        }
    }

    pub fn from_settings(settings: &ImageSettings) -> Self {
        Self::new(&settings.model_uri)
            .with_model(&settings.model)
            .with_cfg_scale(settings.cfg_scale)
            .with_denoising_strength(settings.denoising_strength)
    }

    /// Name used in log messages only; the WebUI serves whatever checkpoint is loaded.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_cfg_scale(mut self, cfg_scale: f32) -> Self {
        self.cfg_scale = cfg_scale;
        self
    }

    pub fn with_denoising_strength(mut self, denoising_strength: f32) -> Self {
        self.denoising_strength = denoising_strength;
        self
    }

    fn endpoint(&self, request: &ImageRequest) -> String {
        let mode = if request.init_image.is_some() {
            "img2img"
        } else {
            "txt2img"
        };
        format!("{}/sdapi/v1/{}", self.base_url, mode)
    }

    fn build_body<'a>(&self, request: &'a ImageRequest) -> GenerationRequest<'a> {
        GenerationRequest {
            prompt: &request.prompt,
            width: request.size,
            height: request.size,
            batch_size: request.n.max(1),
            n_iter: 1,
            cfg_scale: self.cfg_scale,
            denoising_strength: self.denoising_strength,
            include_init_images: true,
            script_args: Vec::new(),
            send_images: true,
            alwayson_scripts: serde_json::Map::new(),
            init_images: request.init_image.as_deref().map(|src| vec![src]),
        }
    }
}

#[async_trait]
impl ImageGenerator for StableDiffusionApiAgent {
    async fn generate_image(&self, request: ImageRequest) -> Result<Vec<String>, ProviderError> {
        let url = self.endpoint(&request);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(&self.build_body(&request))
            .send()
            .await
            .map_err(|err| transport_error(PROVIDER, err))?;

        let parsed: GenerationResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| decode_error(PROVIDER, err))?;

        let images: Vec<String> = parsed
            .images
            .into_iter()
            .filter(|image| !image.is_empty())
            .map(|image| format!("data:image/png;base64,{}", image))
            .collect();

        if images.is_empty() {
            return Err(ProviderError::execution(
                "Stable Diffusion returned no images",
            ));
        }
        Ok(images)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
    batch_size: u32,
    n_iter: u32,
    cfg_scale: f32,
    denoising_strength: f32,
    include_init_images: bool,
    script_args: Vec<serde_json::Value>,
    send_images: bool,
    alwayson_scripts: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_images: Option<Vec<&'a str>>,
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt2img_body_has_no_init_images() {
        let agent = StableDiffusionApiAgent::new("http://localhost:7860/");
        let request = ImageRequest::new("a lich king").with_size(512).with_count(2);

        assert_eq!(agent.endpoint(&request), "http://localhost:7860/sdapi/v1/txt2img");

        let json = serde_json::to_value(agent.build_body(&request)).unwrap();
        assert_eq!(json["prompt"], "a lich king");
        assert_eq!(json["width"], 512);
        assert_eq!(json["height"], 512);
        assert_eq!(json["batch_size"], 2);
        assert_eq!(json["n_iter"], 1);
        assert_eq!(json["send_images"], true);
        assert!(json["alwayson_scripts"].as_object().unwrap().is_empty());
        assert!(json.get("init_images").is_none());
    }

    #[test]
    fn img2img_sends_init_image() {
        let agent = StableDiffusionApiAgent::new("http://sd");
        let request = ImageRequest::new("repaint")
            .with_init_image(Some("data:image/png;base64,AAAA".into()));

        assert_eq!(agent.endpoint(&request), "http://sd/sdapi/v1/img2img");

        let json = serde_json::to_value(agent.build_body(&request)).unwrap();
        assert_eq!(json["init_images"][0], "data:image/png;base64,AAAA");
        assert_eq!(json["include_init_images"], true);
    }
}
