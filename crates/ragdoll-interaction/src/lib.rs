//! Provider adapters for Ragdoll.
//!
//! Each adapter implements one or more capability traits from
//! `ragdoll_core::provider`:
//!
//! - `OpenAIApiAgent`: `TextGenerator` + `ImageGenerator`
//! - `OllamaApiAgent`: `TextGenerator`
//! - `StableDiffusionApiAgent`: `ImageGenerator`
//! - `WebKnowledgeExtractor`: `KnowledgeExtractor`
//! - `VectorRetrievalEngine`: `RetrievalEngine`
//! - `TerminalImageRenderer`: `ImageRenderer`

mod http_error;
pub mod ollama_api_agent;
pub mod openai_api_agent;
pub mod retrieval;
pub mod stable_diffusion_api_agent;
pub mod terminal_renderer;
pub mod web_extractor;

pub use ollama_api_agent::OllamaApiAgent;
pub use openai_api_agent::OpenAIApiAgent;
pub use retrieval::VectorRetrievalEngine;
pub use stable_diffusion_api_agent::StableDiffusionApiAgent;
pub use terminal_renderer::TerminalImageRenderer;
pub use web_extractor::WebKnowledgeExtractor;
