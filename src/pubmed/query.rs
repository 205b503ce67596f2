use crate::models::QueryDescriptor;

/// An E-utilities search: a boolean term expression plus an optional
/// publication date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
    date_range: Option<(String, String)>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, date_range: Option<(String, String)>) -> Self {
        Self {
            term: term.into(),
            date_range,
        }
    }

    /// Translates a descriptor into a PubMed query.
    ///
    /// Keywords are used as-is, each author becomes `"{author}[Author]"` and
    /// the journal becomes `"{journal}[Journal]"`; all parts are joined with
    /// `AND`. The date range is set only when the descriptor holds exactly
    /// two dates.
    pub fn from_descriptor(descriptor: &QueryDescriptor) -> Self {
        let mut parts: Vec<String> = descriptor
            .keywords()
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect();

        parts.extend(
            descriptor
                .authors()
                .iter()
                .map(|author| author.trim())
                .filter(|author| !author.is_empty())
                .map(|author| format!("{}[Author]", author)),
        );

        if let Some(journal) = descriptor.journal().map(str::trim)
            && !journal.is_empty()
        {
            parts.push(format!("{}[Journal]", journal));
        }

        let date_range = descriptor
            .date_range()
            .map(|(start, end)| (start.to_string(), end.to_string()));

        Self {
            term: parts.join(" AND "),
            date_range,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn date_range(&self) -> Option<(&str, &str)> {
        self.date_range
            .as_ref()
            .map(|(start, end)| (start.as_str(), end.as_str()))
    }

    /// Returns `true` when there is nothing to search for.
    pub fn is_empty(&self) -> bool {
        self.term.trim().is_empty()
    }
}
