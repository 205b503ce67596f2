use serde::{Deserialize, Serialize};

/// Bibliographic metadata for one retrieved article.
///
/// Articles are produced by the bibliographic service and treated as opaque
/// records, except for `title`, which identifies the article within a
/// session's retrieval history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Article title.
    pub title: String,
    /// Author names in publication order.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Abstract text, when the record carries one.
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Journal title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    /// Publication date as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Article {
    /// Text handed to the summarization service: the abstract, or the title
    /// when no abstract is available.
    pub fn summary_source(&self) -> &str {
        self.abstract_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(&self.title)
    }
}

/// Builder for constructing `Article` instances with optional fields.
///
/// # Examples
///
/// ```
/// use pubchat::ArticleBuilder;
///
/// let article = ArticleBuilder::new()
///     .title("A Study of X")
///     .authors(["Zhang Feng"])
///     .build();
///
/// assert_eq!(article.title, "A Study of X");
/// assert!(article.abstract_text.is_none());
/// ```
#[derive(Debug, Default)]
pub struct ArticleBuilder {
    title: Option<String>,
    authors: Vec<String>,
    abstract_text: Option<String>,
    journal: Option<String>,
    date: Option<String>,
}

impl ArticleBuilder {
    /// Creates a new `ArticleBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = Some(abstract_text.into());
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = Some(journal.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Builds the `Article`.
    ///
    /// # Panics
    ///
    /// Panics if `title` has not been set.
    pub fn build(self) -> Article {
        Article {
            title: self.title.expect("title is required"),
            authors: self.authors,
            abstract_text: self.abstract_text,
            journal: self.journal,
            date: self.date,
        }
    }
}
