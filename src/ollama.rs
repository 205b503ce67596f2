/// Ollama HTTP client module.
///
/// This module provides a blocking HTTP client for the Ollama API: chat
/// completions (optionally schema-constrained), embeddings and model listing.
mod client;

pub use client::{
    ChatRequest, DEFAULT_TIMEOUT_SECS, EmbeddingClient, OllamaClient, OllamaClientBuilder,
    OllamaClientTrait,
};

/// Extracts the outermost JSON object or array from a model response.
///
/// Handles clean JSON, markdown code fences and explanatory text around the
/// payload. Returns `None` when no braces or brackets are found.
pub fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    let object = trimmed.find('{').zip(trimmed.rfind('}'));
    let array = trimmed.find('[').zip(trimmed.rfind(']'));

    let (start, end) = match (object, array) {
        (Some(o), Some(a)) => {
            if a.0 < o.0 {
                a
            } else {
                o
            }
        }
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    if start <= end {
        Some(&trimmed[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_handles_markdown_and_preamble() {
        let response = r#"Here you go:

```json
{"keywords": ["CRISPR"], "journal": null}
```

Hope this helps!"#;
        assert_eq!(
            extract_json(response),
            Some(r#"{"keywords": ["CRISPR"], "journal": null}"#)
        );
    }

    #[test]
    fn extract_json_prefers_outermost_container() {
        assert_eq!(
            extract_json(r#"[{"text": "2020", "label": "DATE"}]"#),
            Some(r#"[{"text": "2020", "label": "DATE"}]"#)
        );
        assert_eq!(
            extract_json(r#"{"entities": [{"text": "Zhang"}]}"#),
            Some(r#"{"entities": [{"text": "Zhang"}]}"#)
        );
    }

    #[test]
    fn extract_json_returns_none_without_json() {
        assert_eq!(extract_json("No curly braces here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }
}
