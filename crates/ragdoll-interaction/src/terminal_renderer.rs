//! TerminalImageRenderer - paints generated images with ANSI truecolor half blocks.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ragdoll_core::ProviderError;
use ragdoll_core::provider::ImageRenderer;
use reqwest::Client;

use crate::http_error::{ensure_success, transport_error};

const DEFAULT_COLUMNS: u32 = 64;
const PROVIDER: &str = "Image download";

pub struct TerminalImageRenderer {
    client: Client,
    columns: u32,
}

impl TerminalImageRenderer {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            columns: DEFAULT_COLUMNS,
        }
    }

    pub fn with_columns(mut self, columns: u32) -> Self {
        self.columns = columns.max(1);
        self
    }

    async fn load_bytes(&self, image_ref: &str) -> Result<Vec<u8>, ProviderError> {
        if let Some(payload) = image_ref.strip_prefix("data:") {
            return decode_data_uri(payload);
        }

        if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
            let response = self
                .client
                .get(image_ref)
                .send()
                .await
                .map_err(|err| transport_error(PROVIDER, err))?;
            let bytes = ensure_success(response)
                .await?
                .bytes()
                .await
                .map_err(|err| transport_error(PROVIDER, err))?;
            return Ok(bytes.to_vec());
        }

        tokio::fs::read(image_ref)
            .await
            .map_err(|e| ProviderError::execution(format!("Failed to read {}: {}", image_ref, e)))
    }
}

impl Default for TerminalImageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageRenderer for TerminalImageRenderer {
    async fn render(&self, image_ref: &str) -> Result<String, ProviderError> {
        let bytes = self.load_bytes(image_ref).await?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| ProviderError::execution(format!("Failed to decode image: {}", e)))?;
        Ok(paint(&image, self.columns))
    }
}

fn decode_data_uri(payload: &str) -> Result<Vec<u8>, ProviderError> {
    let (meta, data) = payload
        .split_once(',')
        .ok_or_else(|| ProviderError::execution("Malformed data URI"))?;
    if !meta.ends_with(";base64") {
        return Err(ProviderError::execution("Only base64 data URIs are supported"));
    }
    BASE64_STANDARD
        .decode(data.trim())
        .map_err(|e| ProviderError::execution(format!("Invalid base64 image data: {}", e)))
}

/// Two image rows per terminal line: upper pixel as foreground, lower as background.
fn paint(image: &DynamicImage, columns: u32) -> String {
    let (width, height) = image.dimensions();
    let columns = columns.min(width).max(1);
    let rows = ((height as f32 * columns as f32 / width.max(1) as f32).round() as u32).max(1);
    let rows = rows + rows % 2;

    let resized = image
        .resize_exact(columns, rows, FilterType::Triangle)
        .to_rgb8();

    let mut out = String::new();
    for y in (0..rows).step_by(2) {
        for x in 0..columns {
            let top = resized.get_pixel(x, y);
            let bottom = resized.get_pixel(x, (y + 1).min(rows - 1));
            out.push_str(&format!(
                "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m\u{2580}",
                top[0], top[1], top[2], bottom[0], bottom[1], bottom[2]
            ));
        }
        out.push_str("\x1b[0m\n");
    }
    out
}
