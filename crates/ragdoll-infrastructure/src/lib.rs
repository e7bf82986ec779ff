//! Infrastructure for Ragdoll: durable cache storage, config paths, secrets
//! and environment-driven settings.

pub mod file_cache_store;
pub mod paths;
pub mod persona_file;
pub mod settings_loader;
pub mod storage;

pub use file_cache_store::FileCacheStore;
pub use paths::RagdollPaths;
pub use persona_file::load_persona_config;
pub use settings_loader::load_settings;
