//! WebKnowledgeExtractor - turns a knowledge URI into plain text.
//!
//! Remote documents are fetched with `reqwest`; `file://` URIs and bare paths
//! are read from disk. HTML is converted to Markdown-flavoured text with
//! `htmd`, PDFs go through `pdf-extract`, anything else is taken as text.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use ragdoll_core::error::{RagdollError, Result};
use ragdoll_core::provider::KnowledgeExtractor;
use reqwest::Client;
use url::Url;

/// Maximum download size (25MB)
const MAX_DOWNLOAD_SIZE: usize = 25 * 1024 * 1024;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Html,
    Pdf,
    Text,
}

impl ContentKind {
    fn detect(content_type: &str, path: &str) -> Self {
        let content_type = content_type.to_ascii_lowercase();
        let path = path.to_ascii_lowercase();

        if content_type.contains("application/pdf") || path.ends_with(".pdf") {
            Self::Pdf
        } else if content_type.contains("text/html")
            || content_type.contains("application/xhtml")
            || path.ends_with(".html")
            || path.ends_with(".htm")
        {
            Self::Html
        } else {
            Self::Text
        }
    }
}

#[derive(Debug, PartialEq)]
enum KnowledgeSource {
    Remote(Url),
    Local(PathBuf),
}

impl KnowledgeSource {
    fn parse(uri: &str) -> Result<Self> {
        match Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Remote(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| RagdollError::extraction(uri, "Invalid file URI")),
            Ok(url) => Err(RagdollError::extraction(
                uri,
                format!("Unsupported scheme '{}'", url.scheme()),
            )),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self::Local(PathBuf::from(uri))),
            Err(e) => Err(RagdollError::extraction(uri, format!("Invalid URI: {}", e))),
        }
    }
}

pub struct WebKnowledgeExtractor {
    client: Client,
}

impl WebKnowledgeExtractor {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("ragdoll/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    async fn fetch_remote(&self, uri: &str, url: Url) -> Result<(ContentKind, Vec<u8>)> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| RagdollError::extraction(uri, format!("Failed to fetch URL: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RagdollError::extraction(
                uri,
                format!(
                    "HTTP error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        if let Some(length) = response.content_length() {
            if length > MAX_DOWNLOAD_SIZE as u64 {
                return Err(too_large(uri, length as usize));
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let kind = ContentKind::detect(&content_type, url.path());

        let bytes = response.bytes().await.map_err(|e| {
            RagdollError::extraction(uri, format!("Failed to read response body: {}", e))
        })?;
        if bytes.len() > MAX_DOWNLOAD_SIZE {
            return Err(too_large(uri, bytes.len()));
        }

        Ok((kind, bytes.to_vec()))
    }

    async fn read_local(&self, uri: &str, path: &Path) -> Result<(ContentKind, Vec<u8>)> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            RagdollError::extraction(uri, format!("Failed to read {}: {}", path.display(), e))
        })?;
        let kind = ContentKind::detect("", &path.to_string_lossy());
        Ok((kind, bytes))
    }
}

impl Default for WebKnowledgeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeExtractor for WebKnowledgeExtractor {
    async fn extract(&self, uri: &str) -> Result<String> {
        let (kind, bytes) = match KnowledgeSource::parse(uri.trim())? {
            KnowledgeSource::Remote(url) => self.fetch_remote(uri, url).await?,
            KnowledgeSource::Local(path) => self.read_local(uri, &path).await?,
        };

        tracing::debug!("Extracting {:?} content ({} bytes) from {}", kind, bytes.len(), uri);

        let text = match kind {
            ContentKind::Pdf => tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| RagdollError::internal(format!("PDF task failed: {}", e)))?
            .map_err(|e| RagdollError::extraction(uri, format!("Failed to extract PDF text: {}", e)))?,
            ContentKind::Html => htmd::convert(&String::from_utf8_lossy(&bytes))
                .map_err(|e| RagdollError::extraction(uri, format!("Failed to convert HTML: {}", e)))?,
            ContentKind::Text => String::from_utf8_lossy(&bytes).into_owned(),
        };

        let text = normalize_whitespace(&text);
        if text.is_empty() {
            return Err(RagdollError::extraction(uri, "No text could be extracted"));
        }
        Ok(text)
    }
}

fn too_large(uri: &str, size: usize) -> RagdollError {
    RagdollError::extraction(
        uri,
        format!(
            "Content too large: {:.1} MB (max {:.1} MB)",
            size as f64 / (1024.0 * 1024.0),
            MAX_DOWNLOAD_SIZE as f64 / (1024.0 * 1024.0)
        ),
    )
}

/// Trims trailing whitespace per line and collapses runs of blank lines to one.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.replace('\x0c', "\n").lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }

    out
}
