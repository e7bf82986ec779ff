use std::fmt;

/// Lifecycle of a persona session.
///
/// A turn walks `Querying -> GeneratingText -> GeneratingImage -> Rendering`
/// and settles in `Idle`. Image-to-image turns skip straight from knowledge
/// to `GeneratingImage`. `Failed` is terminal and only reached when the
/// opening knowledge load or indexing fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    LoadingKnowledge,
    Querying,
    GeneratingText,
    GeneratingImage,
    Rendering,
    Idle,
    Failed,
}

impl SessionState {
    /// Whether `chat` may run in this state.
    pub fn accepts_chat(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::LoadingKnowledge => "knowledge-loading",
            Self::Querying => "querying",
            Self::GeneratingText => "text-generating",
            Self::GeneratingImage => "image-generating",
            Self::Rendering => "rendering",
            Self::Idle => "idle",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
