pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

pub use openai::OpenAIEmbeddings;

/// Unified embedding model trait
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed a search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}
