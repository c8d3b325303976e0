use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;

use super::{VectorMatch, VectorStore};
use crate::config::VectorStoreConfig;

const API_VERSION: &str = "2024-07";

/// Pinecone index accessed over its data-plane REST API.
///
/// When no data-plane host is configured it is looked up from the control
/// plane on the first query, so an unreachable control plane surfaces as a
/// failed query rather than a failed startup.
pub struct PineconeStore {
    client: Client,
    api_key: String,
    index_name: String,
    control_plane_url: String,
    host: OnceCell<String>,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

impl PineconeStore {
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("vector_store.api_key is not set (PINECONE_API_KEY)"))?;

        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build Pinecone HTTP client")?;

        let host = match config.index_host.as_deref().filter(|h| !h.is_empty()) {
            Some(host) => OnceCell::new_with(Some(normalize_host(host))),
            None if config.index_name.is_empty() => {
                return Err(anyhow!(
                    "vector_store.index_name is not set (PINECONE_INDEX) and no index_host given"
                ));
            }
            None => OnceCell::new(),
        };

        tracing::info!(
            index = %config.index_name,
            host = host.get().map(String::as_str).unwrap_or("<lookup on first query>"),
            "Pinecone store configured"
        );

        Ok(Self {
            client,
            api_key,
            index_name: config.index_name.clone(),
            control_plane_url: config.control_plane_url.clone(),
            host,
        })
    }

    async fn host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let host = Self::describe_host(
                    &self.client,
                    &self.api_key,
                    &self.control_plane_url,
                    &self.index_name,
                )
                .await?;
                let host = normalize_host(&host);
                tracing::info!(index = %self.index_name, host = %host, "Resolved Pinecone index host");
                Ok::<_, anyhow::Error>(host)
            })
            .await?;
        Ok(host.as_str())
    }

    async fn describe_host(
        client: &Client,
        api_key: &str,
        control_plane_url: &str,
        index_name: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/indexes/{}",
            control_plane_url.trim_end_matches('/'),
            index_name
        );
        let response = client
            .get(&url)
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .with_context(|| format!("Failed to describe Pinecone index {}", index_name))?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(anyhow!("Pinecone describe_index error ({}): {}", status, error));
        }

        let body: DescribeIndexResponse = response
            .json()
            .await
            .context("Failed to parse describe_index response")?;
        Ok(body.host)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<VectorMatch>> {
        let url = format!("{}/query", self.host().await?);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&json!({
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true,
            }))
            .send()
            .await
            .with_context(|| format!("Pinecone query to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(anyhow!("Pinecone query error ({}): {}", status, error));
        }

        let body: QueryResponse = response
            .json()
            .await
            .context("Failed to parse Pinecone query response")?;
        Ok(body.matches)
    }
}
