//! Secret configuration file storage (`secret.json`).

use std::fs;
use std::path::{Path, PathBuf};

use ragdoll_core::config::SecretConfig;
use thiserror::Error;

use crate::paths::RagdollPaths;

#[derive(Debug, Error)]
pub enum SecretStorageError {
    #[error("Configuration file not found at: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not determine config directory")]
    ConfigDirNotFound,
}

/// Read-only access to `secret.json`.
///
/// The file is plaintext JSON and should be readable by its owner only.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Storage at the default location (`<config dir>/ragdoll/secret.json`).
    pub fn new() -> Result<Self, SecretStorageError> {
        let path = RagdollPaths::secret_file().map_err(|_| SecretStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// The OpenAI key from the file, if the file exists and carries one.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn openai_api_key(&self) -> Result<Option<String>, SecretStorageError> {
        match self.load() {
            Ok(config) => Ok(config
                .openai
                .map(|openai| openai.api_key)
                .filter(|key| !key.trim().is_empty())),
            Err(SecretStorageError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        let storage = SecretStorage::with_path(file_path.clone());

        match storage.load() {
            Err(SecretStorageError::NotFound(path)) => assert_eq!(path, file_path),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
        assert_eq!(storage.openai_api_key().unwrap(), None);
    }

    #[test]
    fn test_load_openai_key() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(
            &file_path,
            r#"{ "openai": { "api_key": "sk-test-123", "model_name": "gpt-4o-mini" } }"#,
        )
        .unwrap();

        let storage = SecretStorage::with_path(file_path);
        assert_eq!(storage.openai_api_key().unwrap().as_deref(), Some("sk-test-123"));
    }

    #[test]
    fn test_blank_key_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(&file_path, r#"{ "openai": { "api_key": "" } }"#).unwrap();

        let storage = SecretStorage::with_path(file_path);
        assert_eq!(storage.openai_api_key().unwrap(), None);
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(&file_path, "{ invalid json").unwrap();

        let storage = SecretStorage::with_path(file_path);
        assert!(matches!(storage.load(), Err(SecretStorageError::Parse(_))));
        assert!(storage.openai_api_key().is_err());
    }
}
