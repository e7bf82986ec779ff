//! Path resolution for Ragdoll configuration files.
//!
//! ```text
//! <config dir>/ragdoll/
//! ├── secret.json    # API keys
//! ├── cache.toml     # response cache (default STORAGE_URI)
//! └── persona.toml   # optional persona overrides
//! ```

use std::path::PathBuf;

use ragdoll_core::config::Settings;
use thiserror::Error;

const APP_DIR: &str = "ragdoll";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot find config directory")]
    ConfigDirNotFound,
}

pub struct RagdollPaths;

impl RagdollPaths {
    /// Platform config directory with `ragdoll` appended
    /// (e.g. `~/.config/ragdoll/` on Linux).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    pub fn cache_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("cache.toml"))
    }

    pub fn persona_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("persona.toml"))
    }

    /// `STORAGE_URI` when set, otherwise the default cache file.
    pub fn storage_path(settings: &Settings) -> Result<PathBuf, PathError> {
        match &settings.storage_uri {
            Some(path) => Ok(path.clone()),
            None => Self::cache_file(),
        }
    }
}
