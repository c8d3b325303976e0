//! Similarity search over the knowledge base.
//!
//! Failures never reach the caller: an unreachable index reads the same as an
//! index with nothing relevant, i.e. zero passages.

use async_trait::async_trait;
use std::sync::Arc;

use crate::embeddings::EmbeddingModel;
use crate::storage::{VectorMatch, VectorStore};
use crate::types::RetrievedPassage;

#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// Top-`k` passages for `query`, most similar first. Empty on failure.
    async fn search(&self, query: &str, k: usize) -> Vec<RetrievedPassage>;
}

/// Embeds the query, runs a vector query, and maps hits to passages.
pub struct VectorSearchClient {
    embeddings: Arc<dyn EmbeddingModel>,
    store: Arc<dyn VectorStore>,
}

impl VectorSearchClient {
    pub fn new(embeddings: Arc<dyn EmbeddingModel>, store: Arc<dyn VectorStore>) -> Self {
        Self { embeddings, store }
    }

    async fn try_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<RetrievedPassage>> {
        let vector = self.embeddings.embed_query(query).await?;
        let matches = self.store.query(vector, k).await?;
        Ok(matches_to_passages(matches))
    }
}

#[async_trait]
impl SimilaritySearch for VectorSearchClient {
    async fn search(&self, query: &str, k: usize) -> Vec<RetrievedPassage> {
        match self.try_search(query, k).await {
            Ok(passages) => {
                tracing::debug!(
                    k = k,
                    found = passages.len(),
                    model = %self.embeddings.model_name(),
                    "Similarity search complete"
                );
                passages
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error searching vector store, continuing without context");
                Vec::new()
            }
        }
    }
}

/// Passage text lives in the `text` metadata field; the whole metadata map is
/// carried along.
fn matches_to_passages(mut matches: Vec<VectorMatch>) -> Vec<RetrievedPassage> {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
        .into_iter()
        .map(|m| RetrievedPassage {
            text: m
                .metadata
                .get("text")
                .and_then(|t| t.as_str())
                .unwrap_or("")
                .to_string(),
            metadata: m.metadata,
        })
        .collect()
}
