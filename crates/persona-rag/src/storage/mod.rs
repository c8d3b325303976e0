pub mod pinecone_store;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use pinecone_store::PineconeStore;

/// One nearest-neighbour hit from the vector index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Top-k matches for a query vector, metadata included
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<VectorMatch>>;
}
