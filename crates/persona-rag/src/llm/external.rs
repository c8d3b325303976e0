//! External API provider for hosted chat completion
//! OpenAI-compatible endpoints (OpenAI, OpenRouter, Ollama, custom) and Anthropic.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{
    ApiProvider, ChatMessage, ChatRole, CompletionContent, GenerationConfig, LLMProvider,
    ProviderInfo,
};

/// External API provider
pub struct ExternalProvider {
    provider: ApiProvider,
    api_key: String,
    model: String,
    client: Client,
}

impl ExternalProvider {
    /// Parse a response body as JSON, returning a clear error if the server returned HTML
    /// (e.g. a gateway error page) instead of valid JSON.
    async fn parse_json_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response body from {}: {}", endpoint, e))?;

        let trimmed = body.trim_start();
        if trimmed.starts_with('<') {
            let preview: String = trimmed.chars().take(200).collect();
            return Err(anyhow!(
                "Endpoint {} returned HTML instead of JSON (HTTP {}). Response: {}",
                endpoint,
                status,
                preview
            ));
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            anyhow!(
                "Failed to parse JSON from {} (HTTP {}): {}. Response body: {}",
                endpoint,
                status,
                e,
                preview
            )
        })
    }

    pub fn new(provider: ApiProvider, api_key: String, model: String) -> Result<Self> {
        // Only connection setup is bounded; a slow completion is left to run.
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()?;

        tracing::info!(
            provider = ?provider,
            model = %model,
            "Creating ExternalProvider"
        );

        Ok(Self {
            provider,
            api_key,
            model,
            client,
        })
    }

    fn get_endpoint(&self) -> String {
        match &self.provider {
            ApiProvider::OpenAI => "https://api.openai.com/v1/chat/completions".to_string(),
            ApiProvider::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
            ApiProvider::OpenRouter => "https://openrouter.ai/api/v1/chat/completions".to_string(),
            ApiProvider::Ollama => "http://localhost:11434/v1/chat/completions".to_string(),
            ApiProvider::Custom { endpoint } => endpoint.clone(),
        }
    }

    fn format_openai_messages(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect()
    }

    /// Anthropic takes the system prompt as a top-level field, not a message.
    fn format_anthropic_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<Value>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut api_messages = Vec::new();

        for m in messages {
            match m.role {
                ChatRole::System => system_parts.push(&m.content),
                ChatRole::User | ChatRole::Assistant => {
                    api_messages.push(json!({
                        "role": m.role.as_str(),
                        "content": m.content,
                    }));
                }
            }
        }

        let system_prompt = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system_prompt, api_messages)
    }

    fn parse_openai_body(body: &Value) -> Result<CompletionContent> {
        let choices = body["choices"]
            .as_array()
            .ok_or_else(|| anyhow!("Response has no choices array"))?;
        let message = &choices
            .first()
            .ok_or_else(|| anyhow!("No choices returned from API"))?["message"];

        match &message["content"] {
            Value::Null => Ok(CompletionContent::Text(String::new())),
            content => serde_json::from_value(content.clone())
                .map_err(|e| anyhow!("Unexpected message content shape: {}", e)),
        }
    }

    fn parse_anthropic_body(body: &Value) -> Result<CompletionContent> {
        let blocks = body["content"]
            .as_array()
            .ok_or_else(|| anyhow!("No content returned from Anthropic API"))?;
        Ok(CompletionContent::Parts(blocks.clone()))
    }

    /// Chat completion (OpenAI-compatible).
    async fn openai_chat(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<CompletionContent> {
        let endpoint = self.get_endpoint();
        tracing::debug!(
            endpoint = %endpoint,
            model = %self.model,
            max_tokens = config.max_tokens,
            messages = messages.len(),
            "Sending OpenAI-compatible chat request"
        );

        let request = json!({
            "model": self.model,
            "messages": Self::format_openai_messages(messages),
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "top_p": config.top_p,
            "stream": false
        });

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    tracing::error!(endpoint = %endpoint, error = %e, "Connection failed");
                    anyhow!("Failed to connect to {} (check network or proxy settings): {}", endpoint, e)
                } else {
                    tracing::error!(endpoint = %endpoint, error = %e, "Request failed");
                    anyhow!("Chat request to {} failed: {}", endpoint, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await?;
            tracing::error!(endpoint = %endpoint, status = %status, error = %error, "API returned error");
            return Err(anyhow!("Chat API error ({}): {}", status, error));
        }

        let body: Value = Self::parse_json_response(response, &endpoint).await?;
        Self::parse_openai_body(&body)
    }

    /// Chat completion (Anthropic Messages API).
    async fn anthropic_chat(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<CompletionContent> {
        let (system_prompt, api_messages) = Self::format_anthropic_messages(messages);

        let mut request = json!({
            "model": self.model,
            "messages": api_messages,
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "top_p": config.top_p
        });

        if let Some(ref sys) = system_prompt {
            request["system"] = json!(sys);
        }

        let endpoint = self.get_endpoint();
        let response = self
            .client
            .post(&endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await?;
            return Err(anyhow!("Anthropic chat error ({}): {}", status, error));
        }

        let body: Value = Self::parse_json_response(response, &endpoint).await?;
        Self::parse_anthropic_body(&body)
    }
}

#[async_trait]
impl LLMProvider for ExternalProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<CompletionContent> {
        match &self.provider {
            ApiProvider::Anthropic => self.anthropic_chat(messages, config).await,
            _ => self.openai_chat(messages, config).await,
        }
    }

    fn info(&self) -> ProviderInfo {
        let provider_name = match &self.provider {
            ApiProvider::OpenAI => "OpenAI",
            ApiProvider::Anthropic => "Anthropic",
            ApiProvider::OpenRouter => "OpenRouter",
            ApiProvider::Ollama => "Ollama",
            ApiProvider::Custom { .. } => "Custom",
        };

        ProviderInfo {
            name: provider_name.to_string(),
            model: self.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anthropic_lifts_system_prompt() {
        let messages = vec![
            ChatMessage::system("You are helpful"),
            ChatMessage::user("hi"),
        ];
        let (system, api) = ExternalProvider::format_anthropic_messages(&messages);
        assert_eq!(system.as_deref(), Some("You are helpful"));
        assert_eq!(api.len(), 1);
        assert_eq!(api[0]["role"], "user");
    }

    #[test]
    fn test_openai_messages_keep_order() {
        let messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("question"),
        ];
        let api = ExternalProvider::format_openai_messages(&messages);
        assert_eq!(api[0]["role"], "system");
        assert_eq!(api[1]["content"], "question");
    }

    #[test]
    fn test_parse_openai_string_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Hello!"}}]});
        let content = ExternalProvider::parse_openai_body(&body).unwrap();
        assert_eq!(content.into_text(), "Hello!");
    }

    #[test]
    fn test_parse_openai_empty_choices() {
        let body = json!({"choices": []});
        assert!(ExternalProvider::parse_openai_body(&body).is_err());
    }

    #[test]
    fn test_parse_anthropic_blocks() {
        let body = json!({"content": [
            {"type": "text", "text": "Pavan"},
            {"type": "text", "text": "builds AI"}
        ]});
        let content = ExternalProvider::parse_anthropic_body(&body).unwrap();
        assert_eq!(content.into_text(), "Pavan builds AI");
    }

    #[test]
    fn test_custom_endpoint() {
        let provider = ExternalProvider::new(
            ApiProvider::Custom { endpoint: "http://localhost:8080/v1/chat/completions".into() },
            "key".into(),
            "local".into(),
        )
        .unwrap();
        assert_eq!(provider.get_endpoint(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(provider.info().name, "Custom");
    }
}
