use serde::{Deserialize, Serialize};
use std::fmt;

use super::Article;

/// What a response message is telling the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// A non-empty list of retrieved articles.
    Results,
    /// The search ran but matched nothing.
    NoResults,
    /// A summary of a previously retrieved article.
    Summary,
    /// A summary was requested before anything was retrieved.
    RetrieveFirst,
    /// The intent could not be determined.
    Clarification,
    /// The turn failed; the text is a generic apology.
    Error,
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Results => write!(f, "results"),
            Self::NoResults => write!(f, "no_results"),
            Self::Summary => write!(f, "summary"),
            Self::RetrieveFirst => write!(f, "retrieve_first"),
            Self::Clarification => write!(f, "clarification"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The assistant's reply to one user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    kind: ResponseKind,
    /// Markdown text ready for display.
    text: String,
    /// Articles listed in this message (empty unless `kind` is `Results`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    articles: Vec<Article>,
}

impl ResponseMessage {
    /// Creates a text-only message.
    pub fn new(kind: ResponseKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            articles: Vec::new(),
        }
    }

    /// Creates a result listing carrying the displayed articles.
    pub fn results(text: impl Into<String>, articles: Vec<Article>) -> Self {
        Self {
            kind: ResponseKind::Results,
            text: text.into(),
            articles,
        }
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }
}

impl fmt::Display for ResponseMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
