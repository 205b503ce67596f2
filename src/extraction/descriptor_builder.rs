//! Composes entity and structured extraction into a `QueryDescriptor`.

use std::panic;
use std::thread;

use tracing::debug;

use crate::error::ExtractionError;
use crate::models::QueryDescriptor;

use super::entities::EntityExtractor;
use super::structured::StructuredQueryExtractor;

/// Builds one immutable `QueryDescriptor` per user turn.
pub struct QueryDescriptorBuilder {
    entities: EntityExtractor,
    fields: StructuredQueryExtractor,
}

impl QueryDescriptorBuilder {
    pub fn new(entities: EntityExtractor, fields: StructuredQueryExtractor) -> Self {
        Self { entities, fields }
    }

    /// Extracts dates, authors, keywords and journal from `text`.
    ///
    /// Entity recognition and structured extraction share nothing, so they
    /// run concurrently. Either failure fails the whole build.
    pub fn build(&self, text: &str) -> Result<QueryDescriptor, ExtractionError> {
        let (entities, fields) = thread::scope(|scope| {
            let entities = scope.spawn(|| self.entities.extract(text));
            let fields = self.fields.extract_keywords_and_journal(text);
            let entities = entities
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            (entities, fields)
        });

        let entities = entities.map_err(ExtractionError::Entities)?;
        let fields = fields.map_err(ExtractionError::StructuredFields)?;

        let descriptor = QueryDescriptor::new(
            text,
            entities.dates,
            entities.authors,
            fields.keywords,
            fields.journal,
        );
        debug!(?descriptor, "built query descriptor");
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::extraction::entities::{Entity, EntityLabel, EntityRecognizer};
    use crate::ollama::{ChatRequest, OllamaClientTrait};
    use std::sync::Arc;

    struct MockRecognizer {
        result: fn() -> Result<Vec<Entity>, ServiceError>,
    }

    impl EntityRecognizer for MockRecognizer {
        fn recognize(&self, _text: &str) -> Result<Vec<Entity>, ServiceError> {
            (self.result)()
        }
    }

    struct MockOllamaClient {
        result: fn() -> Result<String, ServiceError>,
    }

    impl OllamaClientTrait for MockOllamaClient {
        fn chat(&self, _request: &ChatRequest) -> Result<String, ServiceError> {
            (self.result)()
        }
    }

    fn builder(
        entities: fn() -> Result<Vec<Entity>, ServiceError>,
        fields: fn() -> Result<String, ServiceError>,
    ) -> QueryDescriptorBuilder {
        QueryDescriptorBuilder::new(
            EntityExtractor::new(Arc::new(MockRecognizer { result: entities })),
            StructuredQueryExtractor::new(
                Arc::new(MockOllamaClient { result: fields }),
                "m",
                "s",
            ),
        )
    }

    #[test]
    fn assembles_descriptor_from_both_extractors() {
        let builder = builder(
            || {
                Ok(vec![
                    Entity::new("Zhang", EntityLabel::Person),
                    Entity::new("2020", EntityLabel::Date),
                ])
            },
            || Ok(r#"{"keywords": ["CRISPR"], "journal": null}"#.to_string()),
        );

        let text = "find papers about CRISPR by Zhang in 2020";
        let descriptor = builder.build(text).unwrap();

        assert_eq!(descriptor.raw_text(), text);
        assert_eq!(descriptor.keywords(), ["CRISPR"]);
        assert_eq!(descriptor.authors(), ["Zhang"]);
        assert_eq!(descriptor.dates(), ["2020"]);
        assert_eq!(descriptor.journal(), None);
    }

    #[test]
    fn text_without_entities_has_empty_dates_and_authors() {
        let builder = builder(
            || Ok(vec![]),
            || Ok(r#"{"keywords": ["gene therapy"]}"#.to_string()),
        );

        let descriptor = builder.build("gene therapy").unwrap();
        assert!(descriptor.dates().is_empty());
        assert!(descriptor.authors().is_empty());
    }

    #[test]
    fn entity_failure_fails_the_build() {
        let builder = builder(
            || Err(ServiceError::Http { status: 503 }),
            || Ok(r#"{"keywords": ["x"]}"#.to_string()),
        );
        assert!(matches!(
            builder.build("x"),
            Err(ExtractionError::Entities(ServiceError::Http { status: 503 }))
        ));
    }

    #[test]
    fn structured_failure_fails_the_build() {
        let builder = builder(|| Ok(vec![]), || Ok("not json".to_string()));
        assert!(matches!(
            builder.build("x"),
            Err(ExtractionError::StructuredFields(ServiceError::Malformed { .. }))
        ));
    }
}
