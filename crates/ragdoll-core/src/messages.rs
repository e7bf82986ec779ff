//! Human-readable status messages shared by the pipeline and the shell.

pub const INITIALIZING: &str = "Initializing...";
pub const DONE: &str = "Done.";
pub const CREATING_AGENT: &str = "Creating Ragdoll agent...";
pub const FAREWELL: &str = "Farewell.";
pub const BYE: &str = "bye";
pub const EXIT: &str = "exit";

/// Stands in for an empty retrieval answer.
pub const DEFAULT_ANSWER: &str = "Unknown answer.";

pub const CACHE_CLEARED: &str = "Cache cleared.";
pub const KNOWLEDGE_FROM_CACHE: &str = "Knowledge loaded from cache.";
pub const QUERY_FROM_CACHE: &str = "LLM query loaded from cache.";
pub const TEXT_FROM_CACHE: &str = "Text response loaded from cache.";
pub const IMAGE_FROM_CACHE: &str = "Image response loaded from cache.";
pub const USER_QUESTION_FROM_CACHE: &str = "User question loaded from cache.";

pub const CREATING_VECTOR_STORE: &str = "Creating vector store...";
pub const CREATING_QUERY_ENGINE: &str = "Creating query engine...";
pub const PREPARING_RESPONSE: &str = "Preparing response...";
pub const PREPARING_DISPLAY: &str = "Preparing response for display...";
pub const ADDITIONAL_KNOWLEDGE: &str = "Additional knowledge provided. Extracting...";

pub fn extracting(uri: &str) -> String {
    format!("Extracting from {}...", uri)
}

pub fn extracting_additional(uri: &str, index: usize, total: usize) -> String {
    format!("{} ({} / {})...", uri, index, total)
}

/// Pacing notice; the delay is shown in whole seconds.
pub fn waiting(delay_ms: u128) -> String {
    format!("Waiting {} seconds...", delay_ms / 1000)
}

pub fn llm_query(query: &str) -> String {
    format!("LLM query: {}", query)
}

pub fn text_model_prompt(model: &str, prompt: &str) -> String {
    format!("Text model ({}) prompt: {}", model, prompt)
}

pub fn image_model_prompt(model: &str, prompt: &str) -> String {
    format!("Image model ({}) prompt: {}", model, prompt)
}

pub fn image_failed(model: &str) -> String {
    format!(
        "Image model ({}) failed to return an image. This could be due to a safety violation, rate limiting, or a network issue.",
        model
    )
}

pub fn prompt(name: &str) -> String {
    format!("What would you like to ask {}? ", name)
}
