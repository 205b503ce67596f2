/// End-to-end conversation tests through the public `SessionManager` API.
///
/// Every external service is replaced by an in-process mock, so these run
/// anywhere without network access.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pubchat::classifier::IntentClassifierBuilder;
use pubchat::extraction::{
    EntityExtractor, OllamaEntityRecognizer, QueryDescriptorBuilder, StructuredQueryExtractor,
};
use pubchat::matcher::ArticleMatcher;
use pubchat::ollama::ChatRequest;
use pubchat::summarizer::SummaryService;
use pubchat::{
    Article, ArticleBuilder, AssistantBuilder, BibliographicService, EmbeddingClient,
    OllamaClientTrait, ResponseKind, SearchQuery, ServiceError, SessionManager, Settings,
};

const INTENT_PROMPT: &str = "classify intent";
const NER_PROMPT: &str = "recognize entities";
const FIELDS_PROMPT: &str = "extract fields";

/// A deterministic chat model: intent by keyword, entities and fields from
/// canned replies keyed by user text.
struct ScriptedOllama {
    entities: HashMap<&'static str, &'static str>,
    fields: HashMap<&'static str, &'static str>,
}

impl OllamaClientTrait for ScriptedOllama {
    fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError> {
        let text = request.user();
        let reply = match request.system() {
            INTENT_PROMPT if text.contains("ummar") => "summary",
            INTENT_PROMPT if text.starts_with("Find") || text.starts_with("find") => "retrieval",
            INTENT_PROMPT => "other",
            NER_PROMPT => self.entities.get(text).copied().unwrap_or(r#"{"entities": []}"#),
            FIELDS_PROMPT => self
                .fields
                .get(text)
                .copied()
                .unwrap_or(r#"{"keywords": [], "journal": null}"#),
            other => return Err(ServiceError::malformed(format!("unexpected prompt {other}"))),
        };
        Ok(reply.to_string())
    }
}

/// Returns canned articles for known terms and records every query.
#[derive(Default)]
struct MockPubMed {
    by_term: HashMap<String, Vec<Article>>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl BibliographicService for MockPubMed {
    fn search(&self, query: &SearchQuery, max_results: u32) -> Result<Vec<String>, ServiceError> {
        self.queries.lock().unwrap().push(query.clone());
        let count = self
            .by_term
            .get(query.term())
            .map_or(0, Vec::len)
            .min(max_results as usize);
        Ok((0..count).map(|i| format!("{}#{}", query.term(), i)).collect())
    }

    fn fetch(&self, ids: &[String]) -> Result<Vec<Article>, ServiceError> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                let (term, index) = id.rsplit_once('#')?;
                let index: usize = index.parse().ok()?;
                self.by_term.get(term)?.get(index).cloned()
            })
            .collect())
    }
}

/// Bag-of-topics embedding: one dimension per topic word.
#[derive(Default)]
struct TopicEmbedding {
    calls: AtomicUsize,
}

const TOPICS: [&str; 3] = ["crispr", "off-target", "delivery"];

impl EmbeddingClient for TopicEmbedding {
    fn embed(&self, _model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs
            .iter()
            .map(|input| {
                let lower = input.to_lowercase();
                TOPICS
                    .iter()
                    .map(|topic| if lower.contains(topic) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect())
    }
}

#[derive(Default)]
struct RecordingSummarizer {
    calls: AtomicUsize,
    inputs: Mutex<Vec<(String, usize)>>,
}

impl SummaryService for RecordingSummarizer {
    fn summarize(&self, text: &str, max_length: usize) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs
            .lock()
            .unwrap()
            .push((text.to_string(), max_length));
        Ok("CRISPR guides can cut at unintended sites.".to_string())
    }
}

struct Harness {
    manager: SessionManager,
    pubmed: Arc<MockPubMed>,
    embedding: Arc<TopicEmbedding>,
    summarizer: Arc<RecordingSummarizer>,
}

const CRISPR_REQUEST: &str = "Find papers about CRISPR by Zhang in 2020";

fn crispr_articles() -> Vec<Article> {
    vec![
        ArticleBuilder::new()
            .title("CRISPR delivery methods in vivo")
            .authors(["Zhang Feng"])
            .journal("Nature")
            .date("02/04/2020")
            .abstract_text("Delivery of CRISPR components remains a challenge.")
            .build(),
        ArticleBuilder::new()
            .title("Off-target effects of CRISPR-Cas9 editing")
            .authors(["Zhang Feng", "Cong Le"])
            .journal("Science")
            .date("15/03/2020")
            .abstract_text("We profile off-target cleavage genome-wide.")
            .build(),
    ]
}

fn harness() -> Harness {
    let ollama = Arc::new(ScriptedOllama {
        entities: HashMap::from([(
            CRISPR_REQUEST,
            r#"{"entities": [{"text": "Zhang", "label": "PERSON"}, {"text": "2020", "label": "DATE"}]}"#,
        )]),
        fields: HashMap::from([
            (CRISPR_REQUEST, r#"{"keywords": ["CRISPR"], "journal": null}"#),
            (
                "find articles about unicorn biology",
                r#"{"keywords": ["unicorn biology"], "journal": null}"#,
            ),
        ]),
    });

    let pubmed = Arc::new(MockPubMed {
        by_term: HashMap::from([("CRISPR AND Zhang[Author]".to_string(), crispr_articles())]),
        ..Default::default()
    });
    let embedding = Arc::new(TopicEmbedding::default());
    let summarizer = Arc::new(RecordingSummarizer::default());

    let assistant = AssistantBuilder::new()
        .classifier(
            IntentClassifierBuilder::new()
                .client(ollama.clone())
                .model("llm")
                .system_prompt(INTENT_PROMPT)
                .build(),
        )
        .descriptor_builder(QueryDescriptorBuilder::new(
            EntityExtractor::new(Arc::new(OllamaEntityRecognizer::new(
                ollama.clone(),
                "llm",
                NER_PROMPT,
            ))),
            StructuredQueryExtractor::new(ollama, "llm", FIELDS_PROMPT),
        ))
        .bibliography(pubmed.clone())
        .matcher(ArticleMatcher::new(embedding.clone(), "embed"))
        .summarizer(summarizer.clone())
        .build();

    Harness {
        manager: SessionManager::new(assistant, Settings::default()),
        pubmed,
        embedding,
        summarizer,
    }
}

#[test]
fn crispr_search_then_summary() {
    let h = harness();
    let session = h.manager.create_session();

    let results = h.manager.handle_user_turn(session, CRISPR_REQUEST).unwrap();
    assert_eq!(results.kind(), ResponseKind::Results);
    assert_eq!(results.articles().len(), 2);
    assert!(results.text().contains("Off-target effects of CRISPR-Cas9 editing"));

    let queries = h.pubmed.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].term(), "CRISPR AND Zhang[Author]");
    // A single date is not a range.
    assert_eq!(queries[0].date_range(), None);

    let summary = h
        .manager
        .handle_user_turn(session, "Summarize the one about off-target effects")
        .unwrap();
    assert_eq!(summary.kind(), ResponseKind::Summary);
    assert!(summary.text().contains("Off-target effects of CRISPR-Cas9 editing"));
    assert!(summary.text().contains("unintended sites"));

    let inputs = h.summarizer.inputs.lock().unwrap().clone();
    assert_eq!(
        inputs,
        vec![(
            "We profile off-target cleavage genome-wide.".to_string(),
            Settings::default().max_summary_len
        )]
    );
    assert_eq!(h.embedding.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn summary_before_any_search_asks_to_retrieve_first() {
    let h = harness();
    let session = h.manager.create_session();

    let response = h
        .manager
        .handle_user_turn(session, "Summarize the CRISPR paper")
        .unwrap();

    assert_eq!(response.kind(), ResponseKind::RetrieveFirst);
    assert_eq!(h.embedding.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.summarizer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_search_keeps_previous_results() {
    let h = harness();
    let session = h.manager.create_session();

    h.manager.handle_user_turn(session, CRISPR_REQUEST).unwrap();
    let empty = h
        .manager
        .handle_user_turn(session, "find articles about unicorn biology")
        .unwrap();
    assert_eq!(empty.kind(), ResponseKind::NoResults);
    assert!(empty.articles().is_empty());

    // The earlier batch is still available for summarization.
    let summary = h
        .manager
        .handle_user_turn(session, "Summarize the delivery one")
        .unwrap();
    assert_eq!(summary.kind(), ResponseKind::Summary);
    assert!(summary.text().contains("CRISPR delivery methods in vivo"));
}

#[test]
fn sessions_do_not_share_history() {
    let h = harness();
    let first = h.manager.create_session();
    let second = h.manager.create_session();

    h.manager.handle_user_turn(first, CRISPR_REQUEST).unwrap();
    let response = h
        .manager
        .handle_user_turn(second, "Summarize the CRISPR paper")
        .unwrap();

    assert_eq!(response.kind(), ResponseKind::RetrieveFirst);
}

#[test]
fn max_returns_bounds_the_search() {
    let h = harness();
    let session = h.manager.create_session();
    h.manager
        .update_settings(
            session,
            pubchat::SettingsUpdate {
                max_returns: Some(1),
                ..Default::default()
            },
        )
        .unwrap();

    let results = h.manager.handle_user_turn(session, CRISPR_REQUEST).unwrap();
    assert_eq!(results.articles().len(), 1);
}

#[test]
fn small_talk_gets_clarification() {
    let h = harness();
    let session = h.manager.create_session();

    let response = h.manager.handle_user_turn(session, "hello there").unwrap();

    assert_eq!(response.kind(), ResponseKind::Clarification);
    assert!(h.pubmed.queries.lock().unwrap().is_empty());
}

#[test]
fn concurrent_sessions_run_independently() {
    let h = Arc::new(harness());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let h = Arc::clone(&h);
            std::thread::spawn(move || {
                let session = h.manager.create_session();
                let response = h.manager.handle_user_turn(session, CRISPR_REQUEST).unwrap();
                assert!(h.manager.destroy_session(session));
                response.kind()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), ResponseKind::Results);
    }
    assert_eq!(h.manager.session_count(), 0);
}
