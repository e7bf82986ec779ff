//! Error types for the Ragdoll application.

use std::time::Duration;
use thiserror::Error;

/// A shared error type for the entire Ragdoll application.
///
/// Configuration and extraction failures are fatal to the current request.
/// Provider failures are usually recovered by the pipeline stage that made the
/// call and only reach this type when a caller asks for the raw result.
#[derive(Error, Debug, Clone)]
pub enum RagdollError {
    /// Persona or settings validation failed before any external call
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A knowledge source could not be fetched or parsed
    #[error("Extraction error: {uri} - {message}")]
    Extraction { uri: String, message: String },

    /// Cache storage backend failure (distinct from a cache miss)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Text, image, retrieval or rendering provider failure
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Prompt template failed to compile or render
    #[error("Template error: {0}")]
    Template(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persona and settings validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing/invalid configuration.")]
    Missing,

    #[error("Missing/invalid knowledge URI.")]
    KnowledgeUri,

    #[error("Missing/invalid name.")]
    Name,

    #[error("Missing/invalid writing style.")]
    WritingStyle,

    #[error("Missing/invalid query.")]
    Query,

    #[error("Missing/invalid setting {key}: {value}")]
    InvalidSetting { key: String, value: String },
}

/// Failure reported by an external provider adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The request could not be built or the response was unusable
    #[error("{0}")]
    ExecutionFailed(String),

    /// The provider answered with a failure status or the transport failed
    #[error("{message}")]
    ProcessError {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
        retry_after: Option<Duration>,
    },

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Creates an ExecutionFailed error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::ExecutionFailed(message.into())
    }

    /// Whether the provider flagged this failure as transient.
    ///
    /// Informational only: nothing in the pipeline retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProcessError {
                is_retryable: true,
                ..
            }
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ProcessError { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl RagdollError {
    /// Creates an Extraction error
    pub fn extraction(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is an extraction error
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Check if this is a provider error
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RagdollError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RagdollError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RagdollError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for RagdollError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<minijinja::Error> for RagdollError {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}

/// A type alias for `Result<T, RagdollError>`.
pub type Result<T> = std::result::Result<T, RagdollError>;
