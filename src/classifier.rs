//! Intent classification with a chat model.
//!
//! The model is asked for a single short word; the raw reply is then mapped
//! onto an `IntentLabel` by `IntentLabel::from_response`.

use std::sync::Arc;

use tracing::debug;

use crate::error::ServiceError;
use crate::models::IntentLabel;
use crate::ollama::{ChatRequest, OllamaClientTrait};

/// Builder for constructing `IntentClassifier` instances.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use pubchat::classifier::IntentClassifierBuilder;
/// use pubchat::ollama::OllamaClientBuilder;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OllamaClientBuilder::new().build()?;
/// let classifier = IntentClassifierBuilder::new()
///     .client(Arc::new(client))
///     .model("llama3.2")
///     .system_prompt("Answer retrieval or summary.")
///     .build();
///
/// let intent = classifier.classify("find papers about CRISPR")?;
/// println!("{}", intent);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct IntentClassifierBuilder {
    client: Option<Arc<dyn OllamaClientTrait>>,
    model: Option<String>,
    system_prompt: Option<String>,
    max_tokens: Option<u32>,
}

impl IntentClassifierBuilder {
    /// Creates a new `IntentClassifierBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chat client used for classification.
    pub fn client(mut self, client: Arc<dyn OllamaClientTrait>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the system prompt, few-shot examples included.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Caps the reply length. Defaults to a single token.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Builds the `IntentClassifier`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called before `build()`.
    #[must_use]
    pub fn build(self) -> IntentClassifier {
        IntentClassifier {
            client: self.client.expect("client must be set via client() method"),
            model: self.model.unwrap_or_default(),
            system_prompt: self.system_prompt.unwrap_or_default(),
            max_tokens: self.max_tokens.unwrap_or(1),
        }
    }
}

/// Labels a user turn as retrieval, summary or unknown.
pub struct IntentClassifier {
    client: Arc<dyn OllamaClientTrait>,
    model: String,
    system_prompt: String,
    max_tokens: u32,
}

impl IntentClassifier {
    /// Classifies `text`.
    ///
    /// The request is deterministic (temperature 0), so identical text under
    /// an identical model configuration yields the same label.
    ///
    /// # Errors
    ///
    /// Returns the client's `ServiceError` if the model call fails.
    pub fn classify(&self, text: &str) -> Result<IntentLabel, ServiceError> {
        let request = ChatRequest::new(&self.model, &self.system_prompt, text)
            .with_max_tokens(self.max_tokens);
        let response = self.client.chat(&request)?;
        let label = IntentLabel::from_response(&response);
        debug!(raw = %response, %label, "classified intent");
        Ok(label)
    }
}
