//! Domain layer for Ragdoll: persona configuration, prompt templates, the
//! response cache policy, provider capability traits and runtime settings.

pub mod cache;
pub mod config;
pub mod error;
pub mod messages;
pub mod persona;
pub mod prompt;
pub mod provider;

// Re-export common error type
pub use error::{ConfigError, ProviderError, RagdollError, Result};
