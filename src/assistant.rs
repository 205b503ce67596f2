//! Conversation orchestration.
//!
//! `Assistant` runs one user turn against a `SessionState`: classify the
//! intent, then either search PubMed or summarize a previously listed
//! article. `SessionManager` owns the assistant and every live session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

pub use crate::error::SessionError;

use crate::classifier::{IntentClassifier, IntentClassifierBuilder};
use crate::config::{AppConfig, Messages};
use crate::error::{ServiceError, TurnError};
use crate::extraction::{
    EntityExtractor, OllamaEntityRecognizer, QueryDescriptorBuilder, StructuredQueryExtractor,
};
use crate::matcher::ArticleMatcher;
use crate::models::{
    IntentLabel, ResponseKind, ResponseMessage, SessionId, Settings, SettingsUpdate,
};
use crate::ollama::OllamaClientBuilder;
use crate::pubmed::{BibliographicService, PubMedClientBuilder, SearchQuery};
use crate::render;
use crate::session::SessionState;
use crate::summarizer::{OllamaSummarizer, SummaryService};

/// Builder for constructing `Assistant` instances from explicit components.
///
/// Use `Assistant::from_config` to wire the real Ollama and PubMed clients;
/// use the builder to inject mocks.
#[derive(Default)]
pub struct AssistantBuilder {
    classifier: Option<IntentClassifier>,
    descriptors: Option<QueryDescriptorBuilder>,
    bibliography: Option<Arc<dyn BibliographicService>>,
    matcher: Option<ArticleMatcher>,
    summarizer: Option<Arc<dyn SummaryService>>,
    messages: Option<Messages>,
}

impl AssistantBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn descriptor_builder(mut self, descriptors: QueryDescriptorBuilder) -> Self {
        self.descriptors = Some(descriptors);
        self
    }

    pub fn bibliography(mut self, bibliography: Arc<dyn BibliographicService>) -> Self {
        self.bibliography = Some(bibliography);
        self
    }

    pub fn matcher(mut self, matcher: ArticleMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn summarizer(mut self, summarizer: Arc<dyn SummaryService>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Sets the user-facing texts. Defaults to `Messages::default()`.
    pub fn messages(mut self, messages: Messages) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Builds the `Assistant`.
    ///
    /// # Panics
    ///
    /// Panics if any component other than `messages` was not set.
    #[must_use]
    pub fn build(self) -> Assistant {
        Assistant {
            classifier: self.classifier.expect("classifier must be set"),
            descriptors: self.descriptors.expect("descriptor builder must be set"),
            bibliography: self.bibliography.expect("bibliography must be set"),
            matcher: self.matcher.expect("matcher must be set"),
            summarizer: self.summarizer.expect("summarizer must be set"),
            messages: self.messages.unwrap_or_default(),
        }
    }
}

/// Handles conversation turns. Holds no per-session state.
pub struct Assistant {
    classifier: IntentClassifier,
    descriptors: QueryDescriptorBuilder,
    bibliography: Arc<dyn BibliographicService>,
    matcher: ArticleMatcher,
    summarizer: Arc<dyn SummaryService>,
    messages: Messages,
}

impl Assistant {
    /// Wires an assistant to Ollama and PubMed as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidUrl` for an unparseable base URL, or
    /// `ServiceError::Network` if an HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let mut ollama = OllamaClientBuilder::new()
            .model(&config.models.query_model)
            .timeout(Duration::from_secs(config.ollama.request_timeout_secs));
        if let Some(url) = &config.ollama.base_url {
            ollama = ollama.base_url(url);
        }
        let ollama = Arc::new(ollama.build()?);
        let pubmed = Arc::new(PubMedClientBuilder::from_config(&config.pubmed).build()?);

        let models = &config.models;
        let prompts = &config.prompts;

        let classifier = IntentClassifierBuilder::new()
            .client(ollama.clone())
            .model(&models.intent_model)
            .system_prompt(prompts.intent_prompt())
            .max_tokens(models.intent_max_tokens)
            .build();

        let recognizer =
            OllamaEntityRecognizer::new(ollama.clone(), &models.ner_model, &prompts.ner_system);
        let descriptors = QueryDescriptorBuilder::new(
            EntityExtractor::new(Arc::new(recognizer)),
            StructuredQueryExtractor::new(
                ollama.clone(),
                &models.query_model,
                prompts.query_prompt(),
            ),
        );

        let matcher = ArticleMatcher::new(ollama.clone(), &models.embedding_model);
        let summarizer =
            OllamaSummarizer::new(ollama, &models.summary_model, &prompts.summary_system);

        Ok(AssistantBuilder::new()
            .classifier(classifier)
            .descriptor_builder(descriptors)
            .bibliography(pubmed)
            .matcher(matcher)
            .summarizer(Arc::new(summarizer))
            .messages(config.messages.clone())
            .build())
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Runs one user turn.
    ///
    /// Never fails: every error is logged and turned into a message. The
    /// session's article history changes only after a successful, non-empty
    /// retrieval.
    pub fn handle_turn(&self, state: &mut SessionState, text: &str) -> ResponseMessage {
        let intent = match self.classifier.classify(text) {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "intent classification failed, treating as unknown");
                IntentLabel::Unknown
            }
        };
        info!(%intent, "handling turn");

        let outcome = match intent {
            IntentLabel::Retrieval => self.retrieve(state, text),
            IntentLabel::Summary => self.summarize(state, text),
            IntentLabel::Unknown => Ok(ResponseMessage::new(
                ResponseKind::Clarification,
                &self.messages.clarification,
            )),
        };

        outcome.unwrap_or_else(|e| self.failure_response(&e))
    }

    fn retrieve(&self, state: &mut SessionState, text: &str) -> Result<ResponseMessage, TurnError> {
        let settings = *state.settings();
        let descriptor = self.descriptors.build(text)?;
        let query = SearchQuery::from_descriptor(&descriptor);
        debug!(term = query.term(), range = ?query.date_range(), "search query");

        let ids = self
            .bibliography
            .search(&query, settings.max_returns)
            .map_err(TurnError::Upstream)?;
        let articles = self
            .bibliography
            .fetch(&ids)
            .map_err(TurnError::Upstream)?;

        if articles.is_empty() {
            info!("search returned no articles");
            return Ok(ResponseMessage::new(
                ResponseKind::NoResults,
                &self.messages.no_results,
            ));
        }

        info!(count = articles.len(), "retrieved articles");
        let listing =
            render::results_message(&self.messages, &articles, settings.max_abstract_len);
        state.replace_articles(articles.iter().cloned());
        Ok(ResponseMessage::results(listing, articles))
    }

    fn summarize(&self, state: &SessionState, text: &str) -> Result<ResponseMessage, TurnError> {
        let history = state.last_articles();
        if history.is_empty() {
            return Err(TurnError::EmptyHistory);
        }

        let article = self.matcher.find_best_match(history, text)?;
        info!(title = %article.title, "summarizing article");
        let summary = self
            .summarizer
            .summarize(article.summary_source(), state.settings().max_summary_len)
            .map_err(TurnError::Upstream)?;

        Ok(ResponseMessage::new(
            ResponseKind::Summary,
            render::summary_message(&self.messages, &article.title, &summary),
        ))
    }

    fn failure_response(&self, failure: &TurnError) -> ResponseMessage {
        match failure {
            TurnError::EmptyHistory => {
                debug!("summary requested before any retrieval");
                ResponseMessage::new(ResponseKind::RetrieveFirst, &self.messages.retrieve_first)
            }
            TurnError::Extraction(e) => {
                warn!(error = %e, "could not understand query");
                ResponseMessage::new(
                    ResponseKind::Error,
                    render::failure_message(
                        &self.messages,
                        &self.messages.processing_failed,
                        failure.is_retryable(),
                    ),
                )
            }
            TurnError::Upstream(e) => {
                error!(error = %e, "upstream service failed");
                ResponseMessage::new(
                    ResponseKind::Error,
                    render::failure_message(
                        &self.messages,
                        &self.messages.upstream_failed,
                        failure.is_retryable(),
                    ),
                )
            }
        }
    }
}

/// Registry of live chat sessions.
///
/// Turns on one session are serialized by that session's lock; different
/// sessions proceed in parallel. The registry lock is only held to look up,
/// insert or remove a session handle.
pub struct SessionManager {
    assistant: Assistant,
    defaults: Settings,
    sessions: Mutex<HashMap<SessionId, Arc<Mutex<SessionState>>>>,
    next_id: AtomicU64,
}

impl SessionManager {
    /// Creates a manager whose new sessions start with `defaults`.
    pub fn new(assistant: Assistant, defaults: Settings) -> Self {
        Self {
            assistant,
            defaults: defaults.clamped(),
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Starts a session with empty history and the default settings.
    pub fn create_session(&self) -> SessionId {
        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry()
            .insert(id, Arc::new(Mutex::new(SessionState::new(self.defaults))));
        info!(session = %id, "session created");
        id
    }

    /// Discards a session and its history. Returns `false` if it did not exist.
    pub fn destroy_session(&self, id: SessionId) -> bool {
        let removed = self.registry().remove(&id).is_some();
        if removed {
            info!(session = %id, "session destroyed");
        }
        removed
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.registry().len()
    }

    /// Runs one user turn on the given session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for an unknown session id. Failures
    /// inside the turn are reported through the returned message instead.
    pub fn handle_user_turn(
        &self,
        id: SessionId,
        text: &str,
    ) -> Result<ResponseMessage, SessionError> {
        let session = self.session(id)?;
        let mut state = lock(&session);
        Ok(self.assistant.handle_turn(&mut state, text))
    }

    /// Merges a settings update into the session, clamping out-of-range
    /// values, and returns the resulting settings.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for an unknown session id.
    pub fn update_settings(
        &self,
        id: SessionId,
        update: SettingsUpdate,
    ) -> Result<Settings, SessionError> {
        let session = self.session(id)?;
        let settings = lock(&session).update_settings(&update);
        debug!(session = %id, ?settings, "settings updated");
        Ok(settings)
    }

    /// Returns the session's current settings.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for an unknown session id.
    pub fn settings(&self, id: SessionId) -> Result<Settings, SessionError> {
        let session = self.session(id)?;
        let settings = *lock(&session).settings();
        Ok(settings)
    }

    fn session(&self, id: SessionId) -> Result<Arc<Mutex<SessionState>>, SessionError> {
        self.registry()
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<Mutex<SessionState>>>> {
        lock(&self.sessions)
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
