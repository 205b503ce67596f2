//! Keyword and journal extraction with a schema-constrained chat model.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ServiceError;
use crate::ollama::{ChatRequest, OllamaClientTrait, extract_json};

/// Search fields the language model pulls out of a user request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFields {
    /// Keywords in model output order. Required.
    pub keywords: Vec<String>,
    /// Journal name, only when the user asked for one.
    #[serde(default)]
    pub journal: Option<String>,
}

/// JSON schema handed to the model as the output format.
pub fn query_fields_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "keywords": {
                "type": "array",
                "items": { "type": "string" },
                "description": "One or more words representing a keyword"
            },
            "journal": {
                "type": ["string", "null"],
                "description": "The name of the journal asked by the user"
            }
        },
        "required": ["keywords"]
    })
}

/// Turns raw user text into `QueryFields`.
///
/// The system prompt (few-shot examples included) comes from configuration.
/// A response that does not fit the schema fails the call; there is no
/// retry or repair.
pub struct StructuredQueryExtractor {
    client: Arc<dyn OllamaClientTrait>,
    model: String,
    system_prompt: String,
}

impl StructuredQueryExtractor {
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

    /// Extracts keywords and an optional journal from `text`.
    ///
    /// # Errors
    ///
    /// Propagates client failures, and returns `ServiceError::Malformed` when
    /// the response is not a JSON object with a `keywords` string list.
    pub fn extract_keywords_and_journal(&self, text: &str) -> Result<QueryFields, ServiceError> {
        let request = ChatRequest::new(&self.model, &self.system_prompt, text)
            .with_format(query_fields_schema());
        let response = self.client.chat(&request)?;
        parse_query_fields(&response)
    }
}

fn parse_query_fields(response: &str) -> Result<QueryFields, ServiceError> {
    let json = extract_json(response)
        .ok_or_else(|| ServiceError::malformed("Failed to extract JSON from LLM response"))?;
    let mut fields: QueryFields = serde_json::from_str(json)
        .map_err(|e| ServiceError::malformed(format!("Failed to parse query fields: {}", e)))?;

    // A blank journal means none was requested.
    if fields
        .journal
        .as_deref()
        .is_some_and(|journal| journal.trim().is_empty())
    {
        fields.journal = None;
    }
    Ok(fields)
}
