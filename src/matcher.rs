//! Resolves a free-text reference ("summarize the CRISPR one") to an article
//! from the session's history by embedding similarity of titles.

use std::sync::Arc;

use tracing::debug;

use crate::error::{MatchError, ServiceError};
use crate::models::Article;
use crate::ollama::EmbeddingClient;
use crate::session::ArticleHistory;

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for vectors of different length, empty vectors and
/// zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Index of the highest score; the first one wins ties.
///
/// `NaN` scores never win. Returns `None` for an empty slice.
pub fn best_index(scores: &[f32]) -> Option<usize> {
    if scores.is_empty() {
        return None;
    }

    let mut best = 0;
    for (index, &score) in scores.iter().enumerate().skip(1) {
        // Strictly greater, so an equal later score never displaces the first.
        if score > scores[best] || (scores[best].is_nan() && !score.is_nan()) {
            best = index;
        }
    }
    Some(best)
}

/// Finds the previously retrieved article a query refers to.
pub struct ArticleMatcher {
    client: Arc<dyn EmbeddingClient>,
    model: String,
}

impl ArticleMatcher {
    pub fn new(client: Arc<dyn EmbeddingClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Returns the article whose title is most similar to `query`.
    ///
    /// Always returns a match when the history is non-empty, however low the
    /// similarity.
    ///
    /// # Errors
    ///
    /// - `MatchError::EmptyHistory` if `articles` is empty; no embedding call
    ///   is made
    /// - `MatchError::Embedding` if the embedding call fails or returns the
    ///   wrong number of vectors
    pub fn find_best_match<'a>(
        &self,
        articles: &'a ArticleHistory,
        query: &str,
    ) -> Result<&'a Article, MatchError> {
        if articles.is_empty() {
            return Err(MatchError::EmptyHistory);
        }

        // Titles first, query last, in a single request.
        let mut inputs: Vec<String> = articles.titles().map(str::to_string).collect();
        inputs.push(query.to_string());

        let mut vectors = self
            .client
            .embed(&self.model, &inputs)
            .map_err(MatchError::Embedding)?;
        if vectors.len() != inputs.len() {
            return Err(MatchError::Embedding(ServiceError::malformed(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            ))));
        }

        let query_vector = vectors.pop().unwrap_or_default();
        let scores: Vec<f32> = vectors
            .iter()
            .map(|title_vector| cosine_similarity(&query_vector, title_vector))
            .collect();

        let index = best_index(&scores).ok_or(MatchError::EmptyHistory)?;
        let article = articles.get_index(index).ok_or(MatchError::EmptyHistory)?;
        debug!(title = %article.title, score = scores[index], "matched article");
        Ok(article)
    }
}
