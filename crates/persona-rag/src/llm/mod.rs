//! LLM Module - hosted chat-completion support
//! The core never runs a model itself; it talks to a provider behind `LLMProvider`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub mod external;

pub use external::ExternalProvider;

/// LLM operation mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LLMMode {
    /// External API provider
    External {
        provider: ApiProvider,
        api_key: String,
        model: String,
    },
    /// LLM disabled; every completion call fails and callers fall back
    Disabled,
}

/// External API providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ApiProvider {
    OpenAI,
    Anthropic,
    OpenRouter,
    Ollama,
    Custom { endpoint: String },
}

impl ApiProvider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "anthropic" => Some(Self::Anthropic),
            "openrouter" => Some(Self::OpenRouter),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    pub mode: LLMMode,
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    /// Token budget for the single-word tone label call
    pub tone_max_tokens: usize,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            mode: LLMMode::Disabled,
            max_tokens: 1024,
            temperature: 0.7,
            top_p: 1.0,
            tone_max_tokens: 5,
        }
    }
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
}

impl From<&LLMConfig> for GenerationConfig {
    fn from(config: &LLMConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "system" => Some(ChatRole::System),
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

/// One entry of the caller-supplied transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Raw completion payload. Providers return either one string or a list of
/// content parts (strings or `{ "text": ... }` blocks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompletionContent {
    Text(String),
    Parts(Vec<JsonValue>),
}

impl CompletionContent {
    /// Flatten to plain text. Parts are joined with single spaces; parts that
    /// carry no text become empty strings.
    pub fn into_text(self) -> String {
        match self {
            CompletionContent::Text(text) => text,
            CompletionContent::Parts(parts) => parts
                .iter()
                .map(part_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn part_text(part: &JsonValue) -> &str {
    match part {
        JsonValue::String(s) => s.as_str(),
        JsonValue::Object(map) => map.get("text").and_then(|t| t.as_str()).unwrap_or(""),
        _ => "",
    }
}

/// Provider information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
}

/// Core trait for completion providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Chat completion over an ordered list of role-tagged messages
    async fn chat(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<CompletionContent>;

    /// Get provider info
    fn info(&self) -> ProviderInfo;
}

/// Main LLM manager
pub struct LLMManager {
    config: LLMConfig,
    provider: Option<Box<dyn LLMProvider>>,
}

impl LLMManager {
    /// Create new LLM manager
    pub fn new(config: LLMConfig) -> Self {
        Self {
            config,
            provider: None,
        }
    }

    /// Create a manager around an already-built provider
    pub fn with_provider(config: LLMConfig, provider: Box<dyn LLMProvider>) -> Self {
        Self {
            config,
            provider: Some(provider),
        }
    }

    /// Initialize the provider described by the configured mode
    pub fn initialize(&mut self) -> Result<()> {
        match &self.config.mode {
            LLMMode::External { provider, api_key, model } => {
                let provider =
                    ExternalProvider::new(provider.clone(), api_key.clone(), model.clone())?;
                self.provider = Some(Box::new(provider));
                Ok(())
            }
            LLMMode::Disabled => {
                tracing::warn!("LLM disabled; completions will fall back to canned replies");
                self.provider = None;
                Ok(())
            }
        }
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    /// Chat completion with the configured generation settings
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<CompletionContent> {
        match &self.provider {
            Some(provider) => {
                let config = GenerationConfig::from(&self.config);
                provider.chat(messages, &config).await
            }
            None => Err(anyhow!("LLM is disabled or not initialized")),
        }
    }

    /// Chat completion with custom max_tokens and temperature
    pub async fn chat_custom(
        &self,
        messages: &[ChatMessage],
        max_tokens: usize,
        temperature: f32,
    ) -> Result<CompletionContent> {
        match &self.provider {
            Some(provider) => {
                let mut config = GenerationConfig::from(&self.config);
                config.max_tokens = max_tokens;
                config.temperature = temperature;
                provider.chat(messages, &config).await
            }
            None => Err(anyhow!("LLM is disabled or not initialized")),
        }
    }

    /// Get current provider info
    pub fn info(&self) -> Option<ProviderInfo> {
        self.provider.as_ref().map(|p| p.info())
    }
}
