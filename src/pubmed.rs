/// PubMed bibliographic search.
///
/// `SearchQuery` translates a descriptor into an E-utilities term,
/// `PubMedClient` runs it, and `parse_articles` turns efetch XML into
/// `Article` records.
mod client;
mod parser;
mod query;

pub use client::{PubMedClient, PubMedClientBuilder};
pub use parser::parse_articles;
pub use query::SearchQuery;

use crate::error::ServiceError;
use crate::models::Article;

/// Bibliographic database capability.
///
/// Implemented by `PubMedClient`; mocked in tests.
pub trait BibliographicService: Send + Sync {
    /// Returns up to `max_results` record ids matching the query.
    fn search(&self, query: &SearchQuery, max_results: u32) -> Result<Vec<String>, ServiceError>;

    /// Fetches the records for the given ids.
    fn fetch(&self, ids: &[String]) -> Result<Vec<Article>, ServiceError>;
}
