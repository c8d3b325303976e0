//! Tone Classifier
//!
//! One short completion call labels the user's message with an emotional
//! tone. The raw label is parsed at this boundary: anything outside the closed
//! set becomes `Unknown`, and so does a failed call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::llm::{ChatMessage, LLMManager};

const TONE_SYSTEM_PROMPT: &str = "Classify the emotional tone of the user's message. \
Reply with exactly one lowercase word from this list and nothing else: \
ego, polite, casual, angry, unknown.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneLabel {
    Ego,
    Polite,
    Casual,
    Angry,
    Unknown,
}

impl ToneLabel {
    pub const ALL: [ToneLabel; 5] = [
        ToneLabel::Ego,
        ToneLabel::Polite,
        ToneLabel::Casual,
        ToneLabel::Angry,
        ToneLabel::Unknown,
    ];

    /// Trimmed, case-insensitive parse; unrecognized labels map to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let label = raw
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        match label.as_str() {
            "ego" => ToneLabel::Ego,
            "polite" => ToneLabel::Polite,
            "casual" => ToneLabel::Casual,
            "angry" => ToneLabel::Angry,
            _ => ToneLabel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneLabel::Ego => "ego",
            ToneLabel::Polite => "polite",
            ToneLabel::Casual => "casual",
            ToneLabel::Angry => "angry",
            ToneLabel::Unknown => "unknown",
        }
    }
}

#[async_trait]
pub trait ToneClassifier: Send + Sync {
    async fn classify_tone(&self, utterance: &str) -> ToneLabel;
}

/// Model-backed tone classification.
pub struct LlmToneClassifier {
    llm: Arc<LLMManager>,
}

impl LlmToneClassifier {
    pub fn new(llm: Arc<LLMManager>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ToneClassifier for LlmToneClassifier {
    async fn classify_tone(&self, utterance: &str) -> ToneLabel {
        let messages = [
            ChatMessage::system(TONE_SYSTEM_PROMPT),
            ChatMessage::user(utterance),
        ];
        let max_tokens = self.llm.config().tone_max_tokens;

        match self.llm.chat_custom(&messages, max_tokens, 0.0).await {
            Ok(content) => {
                let raw = content.into_text();
                let tone = ToneLabel::parse(&raw);
                if tone == ToneLabel::Unknown && !raw.trim().eq_ignore_ascii_case("unknown") {
                    tracing::debug!(raw = %raw.trim(), "Unrecognized tone label, using unknown");
                }
                tone
            }
            Err(e) => {
                tracing::warn!(error = %e, "Tone classification failed, using unknown");
                ToneLabel::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionContent, GenerationConfig, LLMConfig, LLMProvider, ProviderInfo};
    use anyhow::{anyhow, Result};

    struct FixedReply(&'static str);

    #[async_trait]
    impl LLMProvider for FixedReply {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            config: &GenerationConfig,
        ) -> Result<CompletionContent> {
            assert_eq!(messages.len(), 2);
            assert_eq!(config.temperature, 0.0);
            Ok(CompletionContent::Text(self.0.to_string()))
        }
        fn info(&self) -> ProviderInfo {
            ProviderInfo { name: "fixed".into(), model: "test".into() }
        }
    }

    struct Broken;

    #[async_trait]
    impl LLMProvider for Broken {
        async fn chat(&self, _: &[ChatMessage], _: &GenerationConfig) -> Result<CompletionContent> {
            Err(anyhow!("provider outage"))
        }
        fn info(&self) -> ProviderInfo {
            ProviderInfo { name: "broken".into(), model: "test".into() }
        }
    }

    fn classifier(provider: Box<dyn LLMProvider>) -> LlmToneClassifier {
        LlmToneClassifier::new(Arc::new(LLMManager::with_provider(LLMConfig::default(), provider)))
    }

    #[test]
    fn test_parse_known_labels() {
        assert_eq!(ToneLabel::parse("ego"), ToneLabel::Ego);
        assert_eq!(ToneLabel::parse("  Polite\n"), ToneLabel::Polite);
        assert_eq!(ToneLabel::parse("CASUAL."), ToneLabel::Casual);
        assert_eq!(ToneLabel::parse("angry"), ToneLabel::Angry);
    }

    #[test]
    fn test_parse_unrecognized_is_unknown() {
        assert_eq!(ToneLabel::parse("sarcastic"), ToneLabel::Unknown);
        assert_eq!(ToneLabel::parse(""), ToneLabel::Unknown);
        assert_eq!(ToneLabel::parse("the tone is angry"), ToneLabel::Unknown);
    }

    #[tokio::test]
    async fn test_classify_trims_and_lowercases() {
        let tone = classifier(Box::new(FixedReply(" Angry \n"))).classify_tone("why is this broken?!").await;
        assert_eq!(tone, ToneLabel::Angry);
    }

    #[tokio::test]
    async fn test_classify_failure_is_unknown() {
        let tone = classifier(Box::new(Broken)).classify_tone("hello").await;
        assert_eq!(tone, ToneLabel::Unknown);
    }
}
