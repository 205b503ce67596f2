//! PubMed efetch XML to `Article` records.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::ServiceError;
use crate::models::Article;

/// Elements that delimit one record in a `PubmedArticleSet`.
fn is_record(name: &str) -> bool {
    matches!(name, "PubmedArticle" | "PubmedBookArticle")
}

fn within(path: &[String], name: &str) -> bool {
    path.iter().any(|element| element == name)
}

fn parent_is(path: &[String], name: &str) -> bool {
    path.len() >= 2 && path[path.len() - 2] == name
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accumulates the fields of one record while its events stream past.
#[derive(Debug, Default)]
struct RecordBuilder {
    title: String,
    title_done: bool,
    abstract_text: String,
    abstract_done: bool,
    journal: String,
    journal_done: bool,
    authors: Vec<String>,
    last_name: String,
    fore_name: String,
    day: String,
    month: String,
    year: String,
    date_done: bool,
}

impl RecordBuilder {
    /// Routes character data according to the current element path.
    fn text(&mut self, path: &[String], text: &str) {
        let Some(current) = path.last().map(String::as_str) else {
            return;
        };

        if !self.title_done && within(path, "ArticleTitle") {
            self.title.push_str(text);
        }
        if !self.abstract_done && within(path, "Abstract") && within(path, "AbstractText") {
            self.abstract_text.push_str(text);
        }
        if !self.journal_done && current == "Title" && parent_is(path, "Journal") {
            self.journal.push_str(text);
        }
        if within(path, "Author") {
            match current {
                "LastName" => self.last_name.push_str(text),
                "ForeName" => self.fore_name.push_str(text),
                _ => {}
            }
        }
        if !self.date_done && parent_is(path, "ArticleDate") {
            match current {
                "Day" => self.day.push_str(text),
                "Month" => self.month.push_str(text),
                "Year" => self.year.push_str(text),
                _ => {}
            }
        }
    }

    /// Handles an element end; `path` no longer contains `name`.
    fn close(&mut self, name: &str, path: &[String]) {
        match name {
            "ArticleTitle" => self.title_done = true,
            "AbstractText" if within(path, "Abstract") => self.abstract_done = true,
            "Title" if path.last().is_some_and(|p| p == "Journal") => self.journal_done = true,
            "ArticleDate" => self.date_done = true,
            "Author" => {
                let last = self.last_name.trim();
                let fore = self.fore_name.trim();
                let name = match (last.is_empty(), fore.is_empty()) {
                    (false, false) => format!("{} {}", last, fore),
                    (false, true) => last.to_string(),
                    (true, false) => fore.to_string(),
                    (true, true) => String::new(),
                };
                if !name.is_empty() {
                    self.authors.push(name);
                }
                self.last_name.clear();
                self.fore_name.clear();
            }
            _ => {}
        }
    }

    /// Builds the article, or `None` if the record has no title.
    fn finish(self) -> Option<Article> {
        let title = collapse_whitespace(&self.title);
        if title.is_empty() {
            return None;
        }

        let non_empty = |text: &str| {
            let text = collapse_whitespace(text);
            if text.is_empty() { None } else { Some(text) }
        };

        let date = match (self.day.trim(), self.month.trim(), self.year.trim()) {
            (day, month, year) if !day.is_empty() && !month.is_empty() && !year.is_empty() => {
                Some(format!("{}/{}/{}", day, month, year))
            }
            _ => None,
        };

        Some(Article {
            title,
            authors: self.authors,
            abstract_text: non_empty(&self.abstract_text),
            journal: non_empty(&self.journal),
            date,
        })
    }
}

/// Parses an efetch `PubmedArticleSet` document.
///
/// For each record: the title from `ArticleTitle` (inline markup flattened),
/// authors as `"LastName ForeName"` in document order, the first
/// `Abstract/AbstractText`, the journal from `Journal/Title`, and the date
/// from `ArticleDate` as `DD/MM/YYYY`. Records without a title are skipped.
///
/// # Errors
///
/// Returns `ServiceError::Malformed` if the document is not well-formed XML.
pub fn parse_articles(xml: &str) -> Result<Vec<Article>, ServiceError> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut record: Option<RecordBuilder> = None;
    let mut articles = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            ServiceError::malformed(format!(
                "invalid PubMed XML at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                if is_record(&name) {
                    record = Some(RecordBuilder::default());
                }
                path.push(name);
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                path.pop();
                if is_record(&name) {
                    if let Some(article) = record.take().and_then(RecordBuilder::finish) {
                        articles.push(article);
                    }
                } else if let Some(builder) = record.as_mut() {
                    builder.close(&name, &path);
                }
            }
            Event::Text(text) => {
                if let Some(builder) = record.as_mut() {
                    let text = text.unescape().map_err(|e| {
                        ServiceError::malformed(format!("invalid text in PubMed XML: {}", e))
                    })?;
                    builder.text(&path, &text);
                }
            }
            Event::CData(data) => {
                if let Some(builder) = record.as_mut() {
                    builder.text(&path, &String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(articles)
}
