//! Query understanding: from free text to a `QueryDescriptor`.
//!
//! - `entities`: date tokens and person names via an `EntityRecognizer`
//! - `recognizer`: an `EntityRecognizer` backed by a chat model
//! - `structured`: keywords and journal via a schema-constrained chat model
//! - `descriptor_builder`: runs both and assembles the descriptor

mod descriptor_builder;
mod entities;
mod recognizer;
mod structured;

pub use descriptor_builder::QueryDescriptorBuilder;
pub use entities::{
    Entity, EntityExtractor, EntityLabel, EntityRecognizer, RecognizedEntities, date_token,
};
pub use recognizer::OllamaEntityRecognizer;
pub use structured::{QueryFields, StructuredQueryExtractor, query_fields_schema};
