pub mod chat;
pub mod config;
pub mod embeddings;
pub mod llm;
pub mod rag;
pub mod rag_engine;
pub mod search;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience
pub use chat::{Action, ActionType, ConversationOrchestrator, ConversationResponse, ConversationState};
pub use config::{EmptyContextPolicy, PersonaConfig, PersonaRagConfig};
pub use rag::{Intent, ToneLabel};
pub use rag_engine::ResponseGenerator;
pub use types::RetrievedPassage;

// Re-export LLM types
pub use llm::{
    ApiProvider, ChatMessage, ChatRole, CompletionContent, GenerationConfig, LLMConfig,
    LLMManager, LLMMode, LLMProvider, ProviderInfo,
};

// Re-export common types
pub use anyhow::{Error, Result};
