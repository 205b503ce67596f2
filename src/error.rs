//! Error types shared across the assistant.
//!
//! `ServiceError` covers every failure of an external collaborator (Ollama,
//! PubMed). The remaining enums describe how those failures surface inside a
//! single conversation turn.

use thiserror::Error;

use crate::models::SessionId;

/// Errors that can occur when talking to an external service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The service answered, but not in the shape we asked for
    #[error("Malformed response: {message}")]
    Malformed { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ServiceError {
    /// Classifies a transport error, separating timeouts from other failures.
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }

    /// Shorthand for a `Malformed` error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Returns `true` when repeating the same request later may succeed.
    ///
    /// Network failures, timeouts and HTTP 5xx are transient. Client errors,
    /// bad payloads and configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http { status } => (500..600).contains(status),
            Self::Serialization(_) | Self::Malformed { .. } | Self::InvalidUrl(_) => false,
        }
    }
}

/// Failure while turning user text into a query descriptor.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The named-entity recognizer failed or returned unusable data.
    #[error("entity recognition failed: {0}")]
    Entities(#[source] ServiceError),

    /// The structured keyword/journal extraction failed.
    #[error("structured field extraction failed: {0}")]
    StructuredFields(#[source] ServiceError),
}

/// Failure while resolving a query against the session's article history.
#[derive(Debug, Error)]
pub enum MatchError {
    /// No articles have been retrieved in this session yet.
    #[error("no articles have been retrieved in this session")]
    EmptyHistory,

    /// The embedding service failed or returned unusable vectors.
    #[error("embedding failed: {0}")]
    Embedding(#[source] ServiceError),
}

/// Everything that can end a conversation turn early.
///
/// None of these escape the orchestrator: each one is converted into a
/// user-facing message at the turn boundary.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("summary requested before any retrieval")]
    EmptyHistory,

    #[error("upstream service failed: {0}")]
    Upstream(#[source] ServiceError),
}

impl TurnError {
    /// Returns `true` when the user may simply retry the same message.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Extraction(ExtractionError::Entities(e))
            | Self::Extraction(ExtractionError::StructuredFields(e))
            | Self::Upstream(e) => e.is_retryable(),
            Self::EmptyHistory => false,
        }
    }
}

/// Errors returned by the session-level entry points.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session id was never issued or has been destroyed.
    #[error("unknown session: {0}")]
    NotFound(SessionId),
}

impl From<MatchError> for TurnError {
    fn from(error: MatchError) -> Self {
        match error {
            MatchError::EmptyHistory => Self::EmptyHistory,
            MatchError::Embedding(e) => Self::Upstream(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn network_error() -> reqwest::Error {
        reqwest::blocking::Client::new()
            .get("not-a-valid-url")
            .build()
            .unwrap_err()
    }

    #[test]
    fn network_error_display() {
        let error = ServiceError::Network(network_error());
        assert!(error.to_string().contains("Network error"));
    }

    #[test]
    fn timeout_error_display() {
        let error = ServiceError::Timeout(network_error());
        assert_eq!(error.to_string(), "Request timed out");
    }

    #[test]
    fn http_error_includes_status() {
        let error = ServiceError::Http { status: 404 };
        let msg = error.to_string();
        assert!(msg.contains("HTTP error"));
        assert!(msg.contains("404"));
    }

    #[test]
    fn serialization_error_chains_source() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = ServiceError::Serialization(json_error);
        assert!(error.to_string().contains("Serialization error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn retryable_classification() {
        assert!(ServiceError::Network(network_error()).is_retryable());
        assert!(ServiceError::Timeout(network_error()).is_retryable());
        assert!(ServiceError::Http { status: 503 }.is_retryable());
        assert!(!ServiceError::Http { status: 404 }.is_retryable());
        assert!(!ServiceError::malformed("bad").is_retryable());
        assert!(!ServiceError::InvalidUrl("x".to_string()).is_retryable());
    }

    #[test]
    fn match_error_maps_to_turn_error() {
        assert!(matches!(
            TurnError::from(MatchError::EmptyHistory),
            TurnError::EmptyHistory
        ));
        assert!(matches!(
            TurnError::from(MatchError::Embedding(ServiceError::Http { status: 500 })),
            TurnError::Upstream(ServiceError::Http { status: 500 })
        ));
    }

    #[test]
    fn turn_error_retryable_follows_service_error() {
        let retryable = TurnError::Upstream(ServiceError::Http { status: 502 });
        assert!(retryable.is_retryable());

        let fatal = TurnError::Extraction(ExtractionError::StructuredFields(
            ServiceError::malformed("missing keywords"),
        ));
        assert!(!fatal.is_retryable());
        assert!(!TurnError::EmptyHistory.is_retryable());
    }
}
