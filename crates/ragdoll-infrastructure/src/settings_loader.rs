//! Loads runtime settings from the process environment.
//!
//! Order of precedence, highest first: real environment variables, the `.env`
//! file, built-in defaults. An OpenAI key in `secret.json` wins over
//! `OPENAI_API_KEY`.

use std::path::Path;

use ragdoll_core::config::Settings;
use ragdoll_core::error::{RagdollError, Result};

use crate::storage::SecretStorage;

/// Loads `.env` (or the given file), then parses settings from the
/// environment and applies the secret file.
pub fn load_settings(env_file: Option<&Path>) -> Result<Settings> {
    load_env_file(env_file)?;

    let settings = Settings::from_lookup(|key| std::env::var(key).ok())?;

    match SecretStorage::new() {
        Ok(storage) => apply_secret_storage(settings, &storage),
        Err(err) => {
            tracing::debug!("Secret storage unavailable: {}", err);
            Ok(settings)
        }
    }
}

/// Reads the explicit env file, or `.env` from the working directory when
/// present. Existing environment variables are never overwritten.
pub fn load_env_file(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenv::from_path(path).map_err(|e| {
                RagdollError::io(format!("Failed to load {}: {}", path.display(), e))
            })?;
            tracing::debug!("Loaded environment from {}", path.display());
        }
        None => match dotenv::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(RagdollError::io(format!("Failed to load .env: {}", err))),
        },
    }
    Ok(())
}

/// Overrides the OpenAI key with the one in `secret.json`, if any.
pub fn apply_secret_storage(mut settings: Settings, storage: &SecretStorage) -> Result<Settings> {
    let key = storage.openai_api_key().map_err(|e| {
        tracing::error!("Failed to read {}: {}", storage.path().display(), e);
        RagdollError::storage(e.to_string())
    })?;

    if key.is_some() {
        settings.openai_api_key = key;
    }
    Ok(settings)
}
