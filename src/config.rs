//! Application configuration.
//!
//! Configuration is layered: built-in defaults, then an optional JSON file,
//! then environment variables (a `.env` file in the working directory is
//! loaded first when present).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::Settings;
use crate::ollama::DEFAULT_TIMEOUT_SECS;

/// Default PubMed E-utilities endpoint.
pub const PUBMED_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ollama: OllamaConfig,
    pub models: ModelConfig,
    pub pubmed: PubMedConfig,
    /// Defaults applied to every new session.
    pub settings: Settings,
    pub prompts: Prompts,
    pub messages: Messages,
}

/// Connection settings for the Ollama server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL; `None` defers to `OLLAMA_HOST` and then the client default.
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Model names for each language-model task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Keyword/journal extraction.
    pub query_model: String,
    pub intent_model: String,
    pub ner_model: String,
    pub embedding_model: String,
    pub summary_model: String,
    /// Token budget for the intent classifier's reply.
    pub intent_max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            query_model: "llama3.2".to_string(),
            intent_model: "llama3.2".to_string(),
            ner_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            summary_model: "llama3.2".to_string(),
            intent_max_tokens: 1,
        }
    }
}

/// PubMed E-utilities settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubMedConfig {
    pub base_url: String,
    /// NCBI API key; raises the request rate limit when set.
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: PUBMED_BASE_URL.to_string(),
            api_key: None,
            request_timeout_secs: 30,
        }
    }
}

/// System prompts and few-shot examples for every model task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub query_system: String,
    pub query_examples: Vec<String>,
    pub intent_system: String,
    pub intent_examples: Vec<String>,
    pub ner_system: String,
    pub summary_system: String,
}

impl Prompts {
    /// Joins a system prompt with its few-shot examples.
    pub fn with_examples(system: &str, examples: &[String]) -> String {
        if examples.is_empty() {
            return system.to_string();
        }
        format!("{}\n\n{}", system, examples.join("\n\n"))
    }

    /// System prompt for keyword/journal extraction, examples included.
    pub fn query_prompt(&self) -> String {
        Self::with_examples(&self.query_system, &self.query_examples)
    }

    /// System prompt for intent classification, examples included.
    pub fn intent_prompt(&self) -> String {
        Self::with_examples(&self.intent_system, &self.intent_examples)
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            query_system: "You extract search fields for a biomedical literature database. \
Given a user request, return the scientific concepts to search for as a list of short \
keywords, and the journal name only if the user explicitly asks for one. Do not include \
author names, dates or filler words such as \"papers\" or \"articles\" in the keywords."
                .to_string(),
            query_examples: vec![
                "Input: find papers about CRISPR by Zhang in 2020\n\
Output: {\"keywords\": [\"CRISPR\"], \"journal\": null}"
                    .to_string(),
                "Input: recent articles on gut microbiome and depression in Nature\n\
Output: {\"keywords\": [\"gut microbiome\", \"depression\"], \"journal\": \"Nature\"}"
                    .to_string(),
                "Input: show me studies of mRNA vaccine efficacy published in The Lancet\n\
Output: {\"keywords\": [\"mRNA vaccine\", \"efficacy\"], \"journal\": \"The Lancet\"}"
                    .to_string(),
            ],
            intent_system: "Classify the user's message. Answer with exactly one word: \
\"retrieval\" if the user wants to search for articles, \"summary\" if the user wants a \
summary of an article that was already shown, or \"other\" otherwise."
                .to_string(),
            intent_examples: vec![
                "Message: find papers about CRISPR by Zhang in 2020\nAnswer: retrieval"
                    .to_string(),
                "Message: summarize the second article\nAnswer: summary".to_string(),
                "Message: what can you do?\nAnswer: other".to_string(),
            ],
            ner_system: "You are a named-entity recognizer. List every date expression \
and every person name that appears in the user's text, in the order they appear, copying \
each span exactly as written. Label dates DATE and person names PERSON. Return JSON of the \
form {\"entities\": [{\"text\": \"...\", \"label\": \"DATE\"}]}. Return an empty list when \
there are none."
                .to_string(),
            summary_system: "Summarize the following scientific article text for a \
general reader in at most {max_length} words. Return only the summary."
                .to_string(),
        }
    }
}

/// Fixed user-facing texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub welcome: String,
    pub results_intro: String,
    pub results_outro: String,
    pub no_results: String,
    pub retrieve_first: String,
    pub clarification: String,
    /// `{title}` is replaced with the matched article title.
    pub summary_intro: String,
    pub processing_failed: String,
    pub upstream_failed: String,
    pub retry_hint: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            welcome: "Hello! I can search PubMed for you. Describe the articles you are \
looking for (topic, authors, journal, years), and once I have shown you some results you \
can ask me to summarize one of them."
                .to_string(),
            results_intro: "Sure! Here are the results I found related to your search query"
                .to_string(),
            results_outro: "Let me know if you'd like more details about any of these articles"
                .to_string(),
            no_results: "I'm sorry, I was not able to find any article with the search \
criteria specified."
                .to_string(),
            retrieve_first: "I don't have any articles to summarize yet. Ask me to search \
for some articles first."
                .to_string(),
            clarification: "I'm not sure what you would like me to do. You can ask me to \
search for articles, or to summarize one of the articles I found."
                .to_string(),
            summary_intro: "Here is a summary of **{title}**:".to_string(),
            processing_failed: "I'm sorry, I could not process that request.".to_string(),
            upstream_failed: "I'm sorry, something went wrong while contacting an external \
service."
                .to_string(),
            retry_hint: "Please try again in a moment.".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration.
    ///
    /// Reads `.env` if present, then `path` if given, else the default config
    /// file if it exists, else built-in defaults; finally applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a config file exists but cannot be read or
    /// parsed. A missing default config file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parses a JSON config file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading config file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies environment variable overrides.
    ///
    /// - `OLLAMA_HOST` sets the Ollama base URL
    /// - `OLLAMA_MODEL` sets every language-model task's model
    /// - `PUBCHAT_EMBEDDING_MODEL` sets the embedding model
    /// - `NCBI_API_KEY` sets the PubMed API key
    pub fn apply_env_overrides(&mut self) {
        if let Some(host) = non_empty_env("OLLAMA_HOST") {
            self.ollama.base_url = Some(host);
        }
        if let Some(model) = non_empty_env("OLLAMA_MODEL") {
            self.models.query_model = model.clone();
            self.models.intent_model = model.clone();
            self.models.ner_model = model.clone();
            self.models.summary_model = model;
        }
        if let Some(model) = non_empty_env("PUBCHAT_EMBEDDING_MODEL") {
            self.models.embedding_model = model;
        }
        if let Some(key) = non_empty_env("NCBI_API_KEY") {
            self.pubmed.api_key = Some(key);
        }
    }
}

/// Returns `{config_dir}/pubchat/config.json`, where `config_dir` is:
/// - Linux: `~/.config`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pubchat").join("config.json"))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
