/// Ollama HTTP client implementation.
///
/// This module provides `OllamaClient` for making synchronous HTTP requests to the Ollama API,
/// along with the request type and builder patterns for configuration.
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::error::ServiceError;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A single non-streaming chat completion request.
///
/// The system prompt carries the task instructions (and any few-shot
/// examples); the user text is sent as the only user message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    model: String,
    system: String,
    user: String,
    format: Option<serde_json::Value>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Creates a deterministic (temperature 0) request.
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            format: None,
            temperature: 0.0,
            max_tokens: None,
        }
    }

    /// Constrains the response to the given JSON schema.
    pub fn with_format(mut self, schema: serde_json::Value) -> Self {
        self.format = Some(schema);
        self
    }

    /// Caps the number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn format(&self) -> Option<&serde_json::Value> {
        self.format.as_ref()
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Builds the `/api/chat` request body.
    fn to_body(&self) -> serde_json::Value {
        let mut options = json!({ "temperature": self.temperature });
        if let Some(max_tokens) = self.max_tokens {
            options["num_predict"] = json!(max_tokens);
        }

        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system },
                { "role": "user", "content": self.user },
            ],
            "stream": false,
            "options": options,
        });
        if let Some(format) = &self.format {
            body["format"] = format.clone();
        }
        body
    }
}

/// Builder for constructing `OllamaClient` instances.
///
/// # Examples
///
/// ```
/// use pubchat::ollama::OllamaClientBuilder;
///
/// let client = OllamaClientBuilder::new()
///     .base_url("http://localhost:11434")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct OllamaClientBuilder {
    base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl OllamaClientBuilder {
    /// Creates a new `OllamaClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Ollama API.
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL (e.g., "http://localhost:11434")
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the default model name reported by this client.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the per-request timeout. Defaults to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `OllamaClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, this method will check the `OLLAMA_HOST`
    /// environment variable. If not set, it defaults to `http://localhost:11434`.
    ///
    /// If `model()` was not called, this method will check the `OLLAMA_MODEL`
    /// environment variable. If not set, it defaults to an empty string.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidUrl` if the base URL does not parse.
    pub fn build(self) -> Result<OllamaClient, ServiceError> {
        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string())
        };

        let model = if let Some(m) = self.model {
            m
        } else {
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| String::new())
        };

        reqwest::Url::parse(&base_url)
            .map_err(|e| ServiceError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ServiceError::Network)?;

        Ok(OllamaClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        })
    }
}

/// Synchronous HTTP client for interacting with the Ollama API.
///
/// Every request is bounded by the configured timeout. Failed requests are
/// not retried; callers decide what a failure means for their turn.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

/// Language-model completion capability.
///
/// This trait enables mocking in unit tests and keeps every component that
/// talks to a model independent of the HTTP transport.
pub trait OllamaClientTrait: Send + Sync {
    /// Runs a chat completion and returns the assistant message content.
    fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError>;
}

/// Text embedding capability.
pub trait EmbeddingClient: Send + Sync {
    /// Embeds every input with the given model, returning one vector per input
    /// in input order.
    fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;
}

impl OllamaClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name configured for this client.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Lists available models from the Ollama API, sorted by size (largest first).
    pub fn list_models(&self) -> Result<Vec<String>, ServiceError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(ServiceError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ServiceError::Http {
                status: response.status().as_u16(),
            });
        }

        let json: serde_json::Value = response.json().map_err(ServiceError::from_reqwest)?;

        let mut models: Vec<(String, u64)> = json
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| {
                        let name = model.get("name").and_then(|n| n.as_str())?;
                        let size = model.get("size").and_then(|s| s.as_u64()).unwrap_or(0);
                        Some((name.to_string(), size))
                    })
                    .collect()
            })
            .unwrap_or_default();

        models.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(models.into_iter().map(|(name, _)| name).collect())
    }

    /// POSTs a JSON body and returns the decoded JSON response.
    fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "ollama request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(ServiceError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
            });
        }

        response.json().map_err(ServiceError::from_reqwest)
    }
}

impl OllamaClientTrait for OllamaClient {
    fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError> {
        let json = self.post_json("/api/chat", &request.to_body())?;
        parse_chat_response(&json)
    }
}

impl EmbeddingClient for OllamaClient {
    fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({ "model": model, "input": inputs });
        let json = self.post_json("/api/embed", &body)?;
        parse_embed_response(&json, inputs.len())
    }
}

/// Extracts `message.content` from an `/api/chat` response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String, ServiceError> {
    if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
        return Err(ServiceError::malformed(format!("Ollama API error: {}", error)));
    }

    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ServiceError::malformed("Missing 'message.content' field in API response"))
}

/// Extracts `embeddings` from an `/api/embed` response, checking the count.
fn parse_embed_response(
    json: &serde_json::Value,
    expected: usize,
) -> Result<Vec<Vec<f32>>, ServiceError> {
    let embeddings = json
        .get("embeddings")
        .cloned()
        .ok_or_else(|| ServiceError::malformed("Missing 'embeddings' field in API response"))?;
    let embeddings: Vec<Vec<f32>> =
        serde_json::from_value(embeddings).map_err(ServiceError::Serialization)?;

    if embeddings.len() != expected {
        return Err(ServiceError::malformed(format!(
            "expected {} embeddings, got {}",
            expected,
            embeddings.len()
        )));
    }
    Ok(embeddings)
}
