//! Date and person-name extraction over a named-entity recognizer.

use std::fmt;
use std::sync::Arc;

use crate::error::ServiceError;

/// Entity class assigned by a recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityLabel {
    Date,
    Person,
    /// Any other class, kept in upper case.
    Other(String),
}

impl EntityLabel {
    /// Parses a recognizer label, case-insensitively.
    pub fn parse(label: &str) -> Self {
        let upper = label.trim().to_uppercase();
        match upper.as_str() {
            "DATE" => Self::Date,
            "PERSON" | "PER" => Self::Person,
            _ => Self::Other(upper),
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "DATE"),
            Self::Person => write!(f, "PERSON"),
            Self::Other(label) => write!(f, "{}", label),
        }
    }
}

/// One recognized span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Named-entity recognition capability.
///
/// Implementations return entities in scan order. Only `DATE` and `PERSON`
/// labels are consumed; everything else is ignored.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>, ServiceError>;
}

/// Dates and authors recognized in one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedEntities {
    pub dates: Vec<String>,
    pub authors: Vec<String>,
}

impl RecognizedEntities {
    /// Splits recognizer output into date tokens and person names.
    pub fn from_entities(entities: &[Entity]) -> Self {
        let mut recognized = Self::default();
        for entity in entities {
            match entity.label {
                EntityLabel::Date => {
                    if let Some(token) = date_token(&entity.text) {
                        recognized.dates.push(token);
                    }
                }
                EntityLabel::Person => recognized.authors.push(entity.text.clone()),
                EntityLabel::Other(_) => {}
            }
        }
        recognized
    }
}

/// Reduces a date span to its digits: `"March 2020"` becomes `"2020"` and
/// `"3 March 2020"` becomes `"32020"`.
///
/// Spans without any digit ("last year") yield `None`. No validation or
/// normalization beyond that.
pub fn date_token(span: &str) -> Option<String> {
    let digits: String = span.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// Pulls date tokens and person names out of raw text.
#[derive(Clone)]
pub struct EntityExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl EntityExtractor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Returns the digit-only tokens of every DATE entity, in scan order.
    pub fn extract_dates(&self, text: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self.extract(text)?.dates)
    }

    /// Returns the text of every PERSON entity, in order of mention.
    pub fn extract_authors(&self, text: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self.extract(text)?.authors)
    }

    /// Runs the recognizer once and returns both dates and authors.
    pub fn extract(&self, text: &str) -> Result<RecognizedEntities, ServiceError> {
        let entities = self.recognizer.recognize(text)?;
        Ok(RecognizedEntities::from_entities(&entities))
    }
}
