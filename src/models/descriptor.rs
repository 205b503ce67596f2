/// Structured form of one user query.
///
/// Built once per turn by `QueryDescriptorBuilder` and never modified
/// afterwards: all fields are private and exposed read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    raw_text: String,
    dates: Vec<String>,
    authors: Vec<String>,
    keywords: Vec<String>,
    journal: Option<String>,
}

impl QueryDescriptor {
    /// Assembles a descriptor from already-extracted parts.
    pub fn new(
        raw_text: impl Into<String>,
        dates: Vec<String>,
        authors: Vec<String>,
        keywords: Vec<String>,
        journal: Option<String>,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            dates,
            authors,
            keywords,
            journal,
        }
    }

    /// The user text this descriptor was built from.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Digit-only date tokens in recognition order.
    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    /// Person names in order of mention.
    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    /// Search keywords in extractor order.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Requested journal, if any.
    pub fn journal(&self) -> Option<&str> {
        self.journal.as_deref()
    }

    /// Returns `(start, end)` when exactly two dates were recognized.
    ///
    /// Any other count is degenerate and yields `None`, meaning the search
    /// runs without a date filter.
    pub fn date_range(&self) -> Option<(&str, &str)> {
        match self.dates.as_slice() {
            [start, end] => Some((start.as_str(), end.as_str())),
            _ => None,
        }
    }
}
