//! Persona overrides stored as TOML.

use std::path::Path;

use ragdoll_core::error::{RagdollError, Result};
use ragdoll_core::persona::PersonaConfig;

/// Reads a persona TOML file; absent keys keep the Arthas defaults.
pub async fn load_persona_config(path: &Path) -> Result<PersonaConfig> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        RagdollError::io(format!("Failed to read persona file {}: {}", path.display(), e))
    })?;

    PersonaConfig::from_toml_str(&content).inspect_err(|e| {
        tracing::error!("Invalid persona file {}: {}", path.display(), e);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdoll_core::persona::preset::DEFAULT_WRITING_STYLE;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_partial_persona() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("persona.toml");
        std::fs::write(
            &path,
            r#"
name = "Thrall"
knowledge_uri = "https://wowpedia.fandom.com/wiki/Thrall"
art_style = ""
greeting = "Lok'tar ogar."

[templates]
max_characters = 300
"#,
        )
        .unwrap();

        let config = load_persona_config(&path).await.unwrap();
        assert_eq!(config.name, "Thrall");
        assert_eq!(config.writing_style, DEFAULT_WRITING_STYLE);
        assert_eq!(config.templates.max_characters, 300);
        assert!(config.templates.output_image.contains("{{ art_style }}"));

        let persona = config.validate().unwrap();
        assert_eq!(persona.query, "Lok'tar ogar.");
        assert!(persona.art_style.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_persona_config(&temp_dir.path().join("none.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagdollError::Io { .. }));
    }

    #[tokio::test]
    async fn malformed_file_is_a_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("persona.toml");
        std::fs::write(&path, "name = ").unwrap();

        let err = load_persona_config(&path).await.unwrap_err();
        assert!(matches!(err, RagdollError::Serialization { .. }));
    }
}
