//! Language-model backed named-entity recognizer.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::ServiceError;
use crate::ollama::{ChatRequest, OllamaClientTrait, extract_json};

use super::entities::{Entity, EntityLabel, EntityRecognizer};

#[derive(Debug, Deserialize)]
struct RawEntity {
    text: String,
    label: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntities {
    Wrapped { entities: Vec<RawEntity> },
    Bare(Vec<RawEntity>),
}

fn response_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "entities": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "text": { "type": "string" },
                        "label": { "type": "string", "enum": ["DATE", "PERSON", "OTHER"] }
                    },
                    "required": ["text", "label"]
                }
            }
        },
        "required": ["entities"]
    })
}

/// Recognizes DATE and PERSON spans by prompting a chat model.
///
/// Spans the model reports that do not occur verbatim in the input are
/// discarded. The rest keep the order the model listed them in, which the
/// prompt asks to be the order of mention.
pub struct OllamaEntityRecognizer {
    client: Arc<dyn OllamaClientTrait>,
    model: String,
    system_prompt: String,
}

impl OllamaEntityRecognizer {
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

impl EntityRecognizer for OllamaEntityRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>, ServiceError> {
        let request = ChatRequest::new(&self.model, &self.system_prompt, text)
            .with_format(response_schema());
        let response = self.client.chat(&request)?;
        let entities = parse_entities(&response, text)?;
        debug!(count = entities.len(), "recognized entities");
        Ok(entities)
    }
}

/// Parses the model's entity list and keeps only spans present in `text`.
fn parse_entities(response: &str, text: &str) -> Result<Vec<Entity>, ServiceError> {
    let json = extract_json(response)
        .ok_or_else(|| ServiceError::malformed("Failed to extract JSON from NER response"))?;
    let raw: RawEntities = serde_json::from_str(json)
        .map_err(|e| ServiceError::malformed(format!("Failed to parse NER response: {}", e)))?;
    let raw = match raw {
        RawEntities::Wrapped { entities } => entities,
        RawEntities::Bare(entities) => entities,
    };

    Ok(raw
        .into_iter()
        .filter_map(|entity| {
            let span = entity.text.trim();
            (!span.is_empty() && text.contains(span))
                .then(|| Entity::new(span, EntityLabel::parse(&entity.label)))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MockOllamaClient {
        response: String,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl MockOllamaClient {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                last_request: Mutex::new(None),
            }
        }
    }

    impl OllamaClientTrait for MockOllamaClient {
        fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(self.response.clone())
        }
    }

    #[test]
    fn recognizes_dates_and_people_in_listed_order() {
        let mock = Arc::new(MockOllamaClient::new(
            r#"{"entities": [
                {"text": "Zhang", "label": "PERSON"},
                {"text": "2020", "label": "DATE"}
            ]}"#,
        ));
        let recognizer = OllamaEntityRecognizer::new(mock.clone(), "ner-model", "find entities");

        let entities = recognizer
            .recognize("find papers about CRISPR by Zhang in 2020")
            .unwrap();

        assert_eq!(
            entities,
            vec![
                Entity::new("Zhang", EntityLabel::Person),
                Entity::new("2020", EntityLabel::Date),
            ]
        );

        let request = mock.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.model(), "ner-model");
        assert_eq!(request.system(), "find entities");
        assert!(request.format().is_some());
    }

    #[test]
    fn date_range_keeps_mention_order_when_a_later_year_occurs_earlier() {
        let response = r#"{"entities": [
            {"text": "2018", "label": "DATE"},
            {"text": "2019", "label": "DATE"}
        ]}"#;
        let entities =
            parse_entities(response, "papers on 2019-nCoV published from 2018 to 2019").unwrap();

        let dates: Vec<_> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(dates, vec!["2018", "2019"]);
    }

    #[test]
    fn authors_keep_mention_order() {
        let response = r#"{"entities": [
            {"text": "Wang", "label": "PERSON"},
            {"text": "Li", "label": "PERSON"}
        ]}"#;
        let entities = parse_entities(response, "Lipid papers by Wang and Li").unwrap();

        assert_eq!(
            entities,
            vec![
                Entity::new("Wang", EntityLabel::Person),
                Entity::new("Li", EntityLabel::Person),
            ]
        );
    }

    #[test]
    fn hallucinated_spans_are_discarded() {
        let response = r#"{"entities": [{"text": "Doudna", "label": "PERSON"}]}"#;
        let entities = parse_entities(response, "papers by Zhang").unwrap();
        assert!(entities.is_empty());
    }

    #[test]
    fn accepts_bare_array_and_markdown_wrapping() {
        let response = "```json\n[{\"text\": \"March 2020\", \"label\": \"date\"}]\n```";
        let entities = parse_entities(response, "published in March 2020").unwrap();
        assert_eq!(entities, vec![Entity::new("March 2020", EntityLabel::Date)]);
    }

    #[test]
    fn empty_entity_list_is_not_an_error() {
        let entities = parse_entities(r#"{"entities": []}"#, "gene therapy").unwrap();
        assert!(entities.is_empty());
    }

    #[test]
    fn malformed_response_is_an_error() {
        assert!(matches!(
            parse_entities("no json here", "text"),
            Err(ServiceError::Malformed { .. })
        ));
        assert!(matches!(
            parse_entities(r#"{"people": ["Zhang"]}"#, "Zhang"),
            Err(ServiceError::Malformed { .. })
        ));
    }
}
