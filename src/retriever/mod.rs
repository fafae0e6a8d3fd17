// Similarity retrieval
// Embeds a question and keeps the nearest documents above the score threshold

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::config::RetrievalConfig;
use crate::embeddings::Embedder;
use crate::vector_store::{ScoredDocument, VectorIndex};
use crate::{FaqError, Result};

pub struct Retriever<E, I> {
    embedder: E,
    index: I,
    top_k: usize,
    score_threshold: f32,
}

impl<E: Embedder, I: VectorIndex> Retriever<E, I> {
    #[inline]
    pub fn new(embedder: E, index: I, config: &RetrievalConfig) -> Self {
        Self {
            embedder,
            index,
            top_k: config.top_k,
            score_threshold: config.score_threshold,
        }
    }

    #[inline]
    pub fn score_threshold(&self) -> f32 {
        self.score_threshold
    }

    /// Documents relevant to `query`, best first.
    ///
    /// At most `top_k` documents are returned and every one scores at least the threshold.
    /// An empty result means nothing in the index is close enough.
    #[inline]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredDocument>> {
        let query_vector = self
            .embedder
            .embed_query(query)
            .map_err(|e| FaqError::Embedding(format!("{:#}", e)))?;

        let candidates = self.index.search(&query_vector, self.top_k).await?;
        let total = candidates.len();

        let mut relevant: Vec<ScoredDocument> = candidates
            .into_iter()
            .filter(|candidate| candidate.score >= self.score_threshold)
            .collect();
        relevant.sort_by(|a, b| b.score.total_cmp(&a.score));
        relevant.truncate(self.top_k);

        debug!(
            "Kept {} of {} candidates at threshold {}",
            relevant.len(),
            total,
            self.score_threshold
        );

        Ok(relevant)
    }
}
