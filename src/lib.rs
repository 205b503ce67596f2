pub mod assistant;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extraction;
pub mod matcher;
pub mod models;
pub mod ollama;
pub mod pubmed;
pub mod render;
pub mod session;
pub mod summarizer;

pub use assistant::{Assistant, AssistantBuilder, SessionManager};
pub use config::AppConfig;
pub use error::{ExtractionError, MatchError, ServiceError, SessionError, TurnError};
pub use models::{
    Article, ArticleBuilder, IntentLabel, QueryDescriptor, ResponseKind, ResponseMessage,
    SessionId, Settings, SettingsUpdate,
};
pub use ollama::{EmbeddingClient, OllamaClient, OllamaClientBuilder, OllamaClientTrait};
pub use pubmed::{BibliographicService, PubMedClient, SearchQuery};
pub use session::SessionState;
pub use summarizer::SummaryService;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_accessible_from_crate_root() {
        let article = ArticleBuilder::new().title("test").build();
        assert_eq!(article.title, "test");

        assert_eq!(format!("{}", IntentLabel::Retrieval), "retrieval");
        assert_eq!(format!("{}", ResponseKind::NoResults), "no_results");

        let state = SessionState::new(Settings::default());
        assert!(state.last_articles().is_empty());
    }

    #[test]
    fn assistant_wires_from_default_config() {
        let assistant = Assistant::from_config(&AppConfig::default());
        assert!(assistant.is_ok());
    }
}
