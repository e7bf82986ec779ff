/// What a turn hands back for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonaReply {
    /// The persona's styled answer; empty in image-to-image mode
    pub text: String,
    /// Terminal rendering of the first image (only when rendering is on)
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub image_url2: Option<String>,
}

impl PersonaReply {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}
