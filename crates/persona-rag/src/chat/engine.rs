use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::PersonaRagConfig;
use crate::embeddings::OpenAIEmbeddings;
use crate::llm::{ChatMessage, ChatRole, LLMManager};
use crate::rag::{IntentDetector, KeywordIntentRouter, KeywordLocaleDetector, LlmToneClassifier};
use crate::rag_engine::ResponseGenerator;
use crate::search::VectorSearchClient;
use crate::storage::PineconeStore;

use super::{ConversationResponse, ConversationState};

/// Top-level entry point: one transcript in, one response envelope out.
pub struct ConversationOrchestrator {
    intent_detector: Arc<dyn IntentDetector>,
    generator: ResponseGenerator,
}

impl ConversationOrchestrator {
    pub fn new(intent_detector: Arc<dyn IntentDetector>, generator: ResponseGenerator) -> Self {
        Self {
            intent_detector,
            generator,
        }
    }

    /// Wire the production collaborators from configuration. Makes no network
    /// calls; service outages show up per request as degraded answers.
    pub fn from_config(config: &PersonaRagConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

        let embeddings =
            OpenAIEmbeddings::new(&config.embedding).context("Failed to set up embeddings")?;
        let store =
            PineconeStore::new(&config.vector_store).context("Failed to set up vector store")?;
        let search = VectorSearchClient::new(Arc::new(embeddings), Arc::new(store));

        let mut llm = LLMManager::new(config.llm.clone());
        llm.initialize().context("Failed to initialize LLM provider")?;
        if let Some(info) = llm.info() {
            tracing::info!(provider = %info.name, model = %info.model, "LLM provider ready");
        }
        let llm = Arc::new(llm);

        let generator = ResponseGenerator::new(
            config,
            Arc::new(search),
            Arc::new(LlmToneClassifier::new(llm.clone())),
            Arc::new(KeywordLocaleDetector::new(&config.persona.regional_markers)),
            llm,
        );

        Ok(Self::new(Arc::new(KeywordIntentRouter::default()), generator))
    }

    /// Route the latest message, answer it, and attach a follow-up action
    /// when the user wants to book or get in touch. Never fails.
    pub async fn process(&self, history: &[ChatMessage]) -> ConversationResponse {
        let latest = match history.last() {
            Some(latest) if latest.role == ChatRole::User => latest,
            Some(latest) => {
                tracing::warn!(role = latest.role.as_str(), "Latest message is not from the user");
                return ConversationResponse::text(self.generator.persona().clarification_message());
            }
            None => {
                tracing::warn!("Empty conversation history");
                return ConversationResponse::text(self.generator.persona().clarification_message());
            }
        };

        let mut state = ConversationState::new(history);
        let intent = self.intent_detector.detect_intent(latest);
        state.intent = Some(intent);
        state.attach_placeholder();

        tracing::info!(
            intent = ?intent,
            history = state.messages.len(),
            "Intent detected"
        );

        let response = self.generator.generate(&latest.content).await;

        ConversationResponse {
            response,
            intent: state.intent,
            action: state.action(),
        }
    }
}
