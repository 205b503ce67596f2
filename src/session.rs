//! Per-session conversation state.

use indexmap::IndexMap;

use crate::models::{Article, Settings, SettingsUpdate};

/// The last successfully retrieved batch of articles, keyed by title.
///
/// Iteration follows insertion order, which is the order the bibliographic
/// service returned the batch in. Titles are assumed unique within a batch:
/// when two articles share a title the later one replaces the earlier one,
/// keeping the earlier one's position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleHistory {
    articles: IndexMap<String, Article>,
}

impl ArticleHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from a retrieval batch.
    pub fn from_batch(batch: impl IntoIterator<Item = Article>) -> Self {
        let mut articles = IndexMap::new();
        for article in batch {
            articles.insert(article.title.clone(), article);
        }
        Self { articles }
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Looks up an article by its exact title.
    pub fn get(&self, title: &str) -> Option<&Article> {
        self.articles.get(title)
    }

    /// Titles in insertion order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.articles.keys().map(String::as_str)
    }

    /// Returns the article at `index` in insertion order.
    pub fn get_index(&self, index: usize) -> Option<&Article> {
        self.articles.get_index(index).map(|(_, article)| article)
    }
}

/// State owned by one chat session.
///
/// Created empty at session start and dropped when the session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    last_articles: ArticleHistory,
    settings: Settings,
}

impl SessionState {
    /// Creates a session with empty history and the given settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            last_articles: ArticleHistory::new(),
            settings: settings.clamped(),
        }
    }

    pub fn last_articles(&self) -> &ArticleHistory {
        &self.last_articles
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the history wholesale with a new retrieval batch.
    pub fn replace_articles(&mut self, batch: impl IntoIterator<Item = Article>) {
        self.last_articles = ArticleHistory::from_batch(batch);
    }

    /// Merges a settings update, clamping out-of-range values.
    pub fn update_settings(&mut self, update: &SettingsUpdate) -> Settings {
        self.settings = self.settings.merged(update);
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleBuilder;

    fn article(title: &str, journal: &str) -> Article {
        ArticleBuilder::new().title(title).journal(journal).build()
    }

    #[test]
    fn new_session_has_empty_history() {
        let state = SessionState::new(Settings::default());
        assert!(state.last_articles().is_empty());
        assert_eq!(state.last_articles().len(), 0);
    }

    #[test]
    fn history_preserves_batch_order() {
        let history = ArticleHistory::from_batch(vec![
            article("B", "j1"),
            article("A", "j2"),
            article("C", "j3"),
        ]);
        assert_eq!(history.titles().collect::<Vec<_>>(), vec!["B", "A", "C"]);
        assert_eq!(history.get_index(1).unwrap().title, "A");
    }

    #[test]
    fn duplicate_titles_are_last_wins() {
        let history = ArticleHistory::from_batch(vec![
            article("Same", "first"),
            article("Other", "x"),
            article("Same", "second"),
        ]);

        assert_eq!(history.len(), 2);
        assert_eq!(history.get("Same").unwrap().journal.as_deref(), Some("second"));
        assert_eq!(history.titles().collect::<Vec<_>>(), vec!["Same", "Other"]);
    }

    #[test]
    fn replace_articles_discards_previous_batch() {
        let mut state = SessionState::new(Settings::default());
        state.replace_articles(vec![article("Old", "j")]);
        state.replace_articles(vec![article("New", "j")]);

        assert!(state.last_articles().get("Old").is_none());
        assert!(state.last_articles().get("New").is_some());
    }

    #[test]
    fn new_session_clamps_initial_settings() {
        let state = SessionState::new(Settings {
            max_returns: 99,
            ..Settings::default()
        });
        assert_eq!(state.settings().max_returns, 15);
    }

    #[test]
    fn update_settings_merges_and_returns_result() {
        let mut state = SessionState::new(Settings::default());
        let updated = state.update_settings(&SettingsUpdate {
            max_summary_len: Some(60),
            ..Default::default()
        });

        assert_eq!(updated.max_summary_len, 60);
        assert_eq!(state.settings().max_summary_len, 60);
        assert_eq!(state.settings().max_returns, Settings::default().max_returns);
    }
}
