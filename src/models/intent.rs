use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified purpose of a user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentLabel {
    /// Search the bibliographic database.
    Retrieval,
    /// Summarize an article from the last retrieval.
    Summary,
    /// Neither; the user gets a clarification message.
    Unknown,
}

impl IntentLabel {
    /// Resolves a raw classifier response into a label.
    ///
    /// Case-sensitive substring match: `"retrieval"` is checked first, then
    /// `"summary"`. Anything else is `Unknown`.
    pub fn from_response(response: &str) -> Self {
        if response.contains("retrieval") {
            Self::Retrieval
        } else if response.contains("summary") {
            Self::Summary
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retrieval => write!(f, "retrieval"),
            Self::Summary => write!(f, "summary"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
