//! Article summarization.

use std::sync::Arc;

use crate::error::ServiceError;
use crate::ollama::{ChatRequest, OllamaClientTrait};

/// Summarization capability.
pub trait SummaryService: Send + Sync {
    /// Summarizes `text` in at most roughly `max_length` words.
    fn summarize(&self, text: &str, max_length: usize) -> Result<String, ServiceError>;
}

/// Summarizes text with a chat model.
///
/// The system prompt may contain `{max_length}`, which is replaced with the
/// requested bound. Generation is additionally capped at about two tokens
/// per requested word.
pub struct OllamaSummarizer {
    client: Arc<dyn OllamaClientTrait>,
    model: String,
    system_prompt: String,
}

impl OllamaSummarizer {
    pub fn new(
        client: Arc<dyn OllamaClientTrait>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

impl SummaryService for OllamaSummarizer {
    fn summarize(&self, text: &str, max_length: usize) -> Result<String, ServiceError> {
        let max_length = max_length.max(1);
        let system = self
            .system_prompt
            .replace("{max_length}", &max_length.to_string());
        let token_cap = u32::try_from(max_length.saturating_mul(2)).unwrap_or(u32::MAX);

        let request = ChatRequest::new(&self.model, system, text).with_max_tokens(token_cap);
        let summary = self.client.chat(&request)?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(ServiceError::malformed("Summarization returned empty text"));
        }
        Ok(summary.to_string())
    }
}
