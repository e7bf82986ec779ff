//! Prompt templates and the composer that renders them.
//!
//! Templates are plain data with named `minijinja` placeholders, so a new
//! persona only needs different values (or different template text), never
//! different code. Rendering is pure: the same inputs always produce the same
//! instruction string.

use minijinja::{Environment, UndefinedBehavior, context};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::persona::Persona;

/// Upper bound on generated text length that the instructions ask for.
pub const DEFAULT_MAX_CHARACTERS: usize = 500;

const INPUT_REWRITE_TEMPLATE: &str = r#"If and only if the following input is written in first-person (e.g. use of "you", etc.), re-write it about {{ name }} in third-person using as few characters as possible (never exceed {{ max_characters }}) - for example "who are you" should just be "Who is {{ name }}?", with no mention of the first-person input, however if it's already third-person and you are not the subject (e.g. no use of "you", "your", "{{ name }}", etc.) then keep it unaltered:"#;

const OUTPUT_TEXT_TEMPLATE: &str = r#"Re-write the following message in the first-person, as if you are {{ name }}, in a style that is {{ writing_style }}, using as few characters as possible (never exceed {{ max_characters }}), in a tone that is {{ writing_tone }}, and reply with the re-written message only, without notes or commentary about the re-write:"#;

const OUTPUT_IMAGE_TEMPLATE: &str = r#"Render the following in the style of {{ art_style }}:"#;

/// The three persona instruction templates.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PromptTemplates {
    /// Value bound to `max_characters` in every template
    pub max_characters: usize,
    /// First-person user input → third-person question about the persona
    pub input_rewrite: String,
    /// Retrieved answer → first-person reply in the persona's voice
    pub output_text: String,
    /// Styled reply → image rendering instruction
    pub output_image: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            max_characters: DEFAULT_MAX_CHARACTERS,
            input_rewrite: INPUT_REWRITE_TEMPLATE.to_string(),
            output_text: OUTPUT_TEXT_TEMPLATE.to_string(),
            output_image: OUTPUT_IMAGE_TEMPLATE.to_string(),
        }
    }
}

/// Renders persona instructions from a set of templates.
///
/// Syntax errors surface when the composer is built. Undefined placeholders
/// fail at render time instead of rendering as empty text.
pub struct PromptComposer {
    templates: PromptTemplates,
    env: Environment<'static>,
}

impl PromptComposer {
    /// Creates a composer, checking that every template compiles.
    pub fn new(templates: PromptTemplates) -> Result<Self> {
        {
            let check = Environment::new();
            for source in [
                &templates.input_rewrite,
                &templates.output_text,
                &templates.output_image,
            ] {
                check.template_from_str(source)?;
            }
        }

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Ok(Self { templates, env })
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Instruction converting first-person phrasing about the persona into a
    /// third-person question.
    pub fn compose_input_rewrite_prompt(&self, name: &str) -> Result<String> {
        Ok(self.env.render_str(
            &self.templates.input_rewrite,
            context! {
                name => name,
                max_characters => self.templates.max_characters,
            },
        )?)
    }

    /// Instruction asking for a first-person, persona-voiced rewrite.
    pub fn compose_output_text_prompt(
        &self,
        name: &str,
        writing_style: &str,
        writing_tone: &str,
    ) -> Result<String> {
        Ok(self.env.render_str(
            &self.templates.output_text,
            context! {
                name => name,
                writing_style => writing_style,
                writing_tone => writing_tone,
                max_characters => self.templates.max_characters,
            },
        )?)
    }

    /// Rendering instruction embedding the art style descriptor.
    pub fn compose_output_image_prompt(&self, art_style: &str) -> Result<String> {
        Ok(self.env.render_str(
            &self.templates.output_image,
            context! {
                art_style => art_style,
                max_characters => self.templates.max_characters,
            },
        )?)
    }
}

/// The composed prefixes a session prepends to stage inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaPrompts {
    pub input_rewrite: String,
    pub output_text: String,
    /// `None` when the persona has no art style
    pub output_image: Option<String>,
}

impl PersonaPrompts {
    pub fn for_persona(persona: &Persona) -> Result<Self> {
        let composer = PromptComposer::new(persona.templates.clone())?;

        let output_image = match persona.art_style.as_deref() {
            Some(style) => Some(composer.compose_output_image_prompt(style)?),
            None => None,
        };

        Ok(Self {
            input_rewrite: composer.compose_input_rewrite_prompt(&persona.name)?,
            output_text: composer.compose_output_text_prompt(
                &persona.name,
                &persona.writing_style,
                &persona.writing_tone,
            )?,
            output_image,
        })
    }
}

/// Joins an instruction prefix and the content it applies to.
pub fn with_prefix(prefix: &str, content: &str) -> String {
    format!("{} {}", prefix, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaConfig;

    fn composer() -> PromptComposer {
        PromptComposer::new(PromptTemplates::default()).unwrap()
    }

    #[test]
    fn input_rewrite_embeds_worked_example() {
        let prompt = composer().compose_input_rewrite_prompt("Arthas").unwrap();
        assert!(prompt.contains("re-write it about Arthas in third-person"));
        assert!(prompt.contains("\"Who is Arthas?\""));
        assert!(prompt.contains("never exceed 500"));
        assert!(prompt.ends_with(':'));
    }

    #[test]
    fn output_text_carries_style_and_tone() {
        let prompt = composer()
            .compose_output_text_prompt("Arthas", "grim", "resentful")
            .unwrap();
        assert!(prompt.starts_with("Re-write the following message in the first-person"));
        assert!(prompt.contains("as if you are Arthas"));
        assert!(prompt.contains("a style that is grim"));
        assert!(prompt.contains("a tone that is resentful"));
        assert!(prompt.contains("without notes or commentary"));
    }

    #[test]
    fn output_image_embeds_art_style() {
        let prompt = composer().compose_output_image_prompt("oil painting").unwrap();
        assert_eq!(prompt, "Render the following in the style of oil painting:");
    }

    #[test]
    fn composition_is_deterministic() {
        let composer = composer();
        let first = composer.compose_output_text_prompt("A", "b", "c").unwrap();
        let second = composer.compose_output_text_prompt("A", "b", "c").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn custom_templates_use_named_placeholders() {
        let templates = PromptTemplates {
            max_characters: 120,
            output_image: "Paint as {{ art_style }} ({{ max_characters }} max):".into(),
            ..PromptTemplates::default()
        };
        let prompt = PromptComposer::new(templates)
            .unwrap()
            .compose_output_image_prompt("watercolor")
            .unwrap();
        assert_eq!(prompt, "Paint as watercolor (120 max):");
    }

    #[test]
    fn unknown_placeholder_is_rejected_at_render() {
        let templates = PromptTemplates {
            output_image: "Paint as {{ palette }}".into(),
            ..PromptTemplates::default()
        };
        let composer = PromptComposer::new(templates).unwrap();
        assert!(composer.compose_output_image_prompt("watercolor").is_err());
    }

    #[test]
    fn broken_template_is_rejected_at_build() {
        let templates = PromptTemplates {
            output_text: "{{ name ".into(),
            ..PromptTemplates::default()
        };
        assert!(PromptComposer::new(templates).is_err());
    }

    #[test]
    fn persona_prompts_skip_image_without_art_style() {
        let persona = PersonaConfig {
            art_style: String::new(),
            ..PersonaConfig::default()
        }
        .with_query("q")
        .validate()
        .unwrap();

        let prompts = PersonaPrompts::for_persona(&persona).unwrap();
        assert!(prompts.output_image.is_none());
        assert!(prompts.input_rewrite.contains("Arthas"));
    }

    #[test]
    fn prefix_is_space_joined() {
        assert_eq!(with_prefix("Do this:", "text"), "Do this: text");
    }
}
