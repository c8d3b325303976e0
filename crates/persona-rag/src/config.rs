use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::llm::{ApiProvider, LLMConfig, LLMMode};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaRagConfig {
    pub persona: PersonaConfig,
    pub search: SearchConfig,
    pub llm: LLMConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
}

/// What to answer when retrieval finds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyContextPolicy {
    /// Return the configured "don't know" text
    #[default]
    CannedFallback,
    /// Ask the model with a context-free persona prompt
    GenericGeneration,
}

impl EmptyContextPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "canned_fallback" | "canned" => Some(Self::CannedFallback),
            "generic_generation" | "generic" => Some(Self::GenericGeneration),
            _ => None,
        }
    }
}

/// Persona identity and the fixed texts the assistant falls back to.
/// `{subject}` in any text is replaced with `subject_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub subject_name: String,
    pub assistant_name: String,
    /// Refuse questions that are not about the subject
    pub restrict_to_subject: bool,
    pub empty_context_policy: EmptyContextPolicy,
    /// Romanized Telugu function words that mark a code-mixed message
    pub regional_markers: Vec<String>,
    pub unknown_answer: String,
    pub unknown_answer_regional: String,
    pub error_message: String,
    pub clarification_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
    /// Classify tone while retrieval runs. Saves latency on answered questions
    /// but spends a tone call on every empty-retrieval reply.
    pub concurrent_tone: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub api_key: Option<String>,
    pub index_name: String,
    /// Data-plane host; looked up from the control plane when unset
    pub index_host: Option<String>,
    pub control_plane_url: String,
}

pub const DEFAULT_REGIONAL_MARKERS: &[&str] = &[
    "enti", "nenu", "nuvvu", "cheppu", "undi", "ledu", "kada", "bagunnava", "chestunnav",
    "mama", "baaga", "emaina", "naaku", "ela unnav",
];

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            subject_name: "Pavan Tejavath".to_string(),
            assistant_name: "PT Bot".to_string(),
            restrict_to_subject: false,
            empty_context_policy: EmptyContextPolicy::CannedFallback,
            regional_markers: DEFAULT_REGIONAL_MARKERS.iter().map(|m| m.to_string()).collect(),
            unknown_answer: "I don't know about that one. Ask me something about {subject} instead!"
                .to_string(),
            unknown_answer_regional: "Adi naaku teliyadu ra. {subject} gurinchi emaina adugu!"
                .to_string(),
            error_message:
                "I'm sorry, I encountered an error processing your request. Please try again."
                    .to_string(),
            clarification_message: "I'm sorry, I don't understand.".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            concurrent_tone: false,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: String::new(),
            index_host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
        }
    }
}

impl PersonaRagConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.search.top_k == 0 {
            return Err("search.top_k must be > 0".into());
        }
        if self.persona.subject_name.trim().is_empty() {
            return Err("persona.subject_name must not be empty".into());
        }
        if self.persona.unknown_answer.trim().is_empty()
            || self.persona.unknown_answer_regional.trim().is_empty()
            || self.persona.error_message.trim().is_empty()
            || self.persona.clarification_message.trim().is_empty()
        {
            return Err("persona fallback texts must not be empty".into());
        }
        if self.llm.max_tokens == 0 || self.llm.tone_max_tokens == 0 {
            return Err("llm.max_tokens and llm.tone_max_tokens must be > 0".into());
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err("llm.temperature must be in [0.0, 2.0]".into());
        }
        if !(0.0..=1.0).contains(&self.llm.top_p) {
            return Err("llm.top_p must be in [0.0, 1.0]".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();
        let openai_key = get("OPENAI_API_KEY").filter(|k| !k.is_empty());

        // Persona
        if let Some(name) = get("PERSONA_SUBJECT_NAME").filter(|n| !n.trim().is_empty()) {
            config.persona.subject_name = name;
        }
        if let Some(flag) = get("PERSONA_RESTRICT_TO_SUBJECT") {
            config.persona.restrict_to_subject =
                matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(policy) = get("PERSONA_EMPTY_CONTEXT_POLICY") {
            config.persona.empty_context_policy = EmptyContextPolicy::from_name(&policy)
                .ok_or_else(|| format!("Unknown PERSONA_EMPTY_CONTEXT_POLICY: {}", policy))?;
        }

        // Search
        if let Some(k) = get("RAG_TOP_K") {
            config.search.top_k = k
                .trim()
                .parse()
                .map_err(|_| format!("RAG_TOP_K must be a positive integer, got {}", k))?;
        }

        if let Some(flag) = get("RAG_CONCURRENT_TONE") {
            config.search.concurrent_tone =
                matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }

        // LLM
        // OPENAI_BASE_URL points both embeddings and OpenAI completions at the
        // same gateway; LLM_PROVIDER=custom takes a full completion URL instead.
        let openai_base_url = get("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty());
        let provider_name = get("LLM_PROVIDER").unwrap_or_else(|| "openai".to_string());
        let provider = match provider_name.trim().to_lowercase().as_str() {
            "custom" => ApiProvider::Custom {
                endpoint: get("LLM_ENDPOINT")
                    .filter(|e| !e.trim().is_empty())
                    .ok_or_else(|| "LLM_PROVIDER=custom requires LLM_ENDPOINT".to_string())?,
            },
            _ => match ApiProvider::from_name(&provider_name) {
                Some(ApiProvider::OpenAI) => match &openai_base_url {
                    Some(base) => ApiProvider::Custom {
                        endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
                    },
                    None => ApiProvider::OpenAI,
                },
                Some(provider) => provider,
                None => return Err(format!("Unknown LLM_PROVIDER: {}", provider_name)),
            },
        };
        let api_key = match provider {
            ApiProvider::Anthropic => get("ANTHROPIC_API_KEY"),
            ApiProvider::OpenRouter => get("OPENROUTER_API_KEY"),
            ApiProvider::Ollama => Some(String::new()),
            ApiProvider::Custom { .. } => get("LLM_API_KEY").or_else(|| openai_key.clone()),
            ApiProvider::OpenAI => openai_key.clone(),
        };
        let model = get("LLM_MODEL").unwrap_or_else(|| match provider {
            ApiProvider::Anthropic => "claude-3-5-haiku-latest".to_string(),
            ApiProvider::Ollama => "llama3.1".to_string(),
            _ => "gpt-4o-mini".to_string(),
        });
        config.llm.mode = match api_key {
            Some(api_key) if provider == ApiProvider::Ollama || !api_key.is_empty() => {
                LLMMode::External { provider, api_key, model }
            }
            _ => LLMMode::Disabled,
        };

        // Embeddings
        config.embedding.api_key = openai_key;
        if let Some(model) = get("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Some(base_url) = openai_base_url {
            config.embedding.base_url = base_url;
        }

        // Vector store
        config.vector_store.api_key = get("PINECONE_API_KEY");
        if let Some(index) = get("PINECONE_INDEX") {
            config.vector_store.index_name = index;
        }
        config.vector_store.index_host = get("PINECONE_INDEX_HOST");

        config.validate()?;
        Ok(config)
    }
}
