//! Response Generator
//!
//! Retrieves passages, classifies tone, then composes the persona prompt and
//! makes one completion call. Tone is only needed when retrieval found
//! something, so by default it is classified after search; `concurrent_tone`
//! overlaps the two instead. `generate` always yields text: retrieval
//! failures read as "no context", and a failed completion becomes the
//! configured apology.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{EmptyContextPolicy, PersonaRagConfig};
use crate::llm::{ChatMessage, LLMManager};
use crate::rag::{LocaleDetector, PersonaPolicy, ToneClassifier};
use crate::search::SimilaritySearch;
use crate::types::join_passages;

pub struct ResponseGenerator {
    search: Arc<dyn SimilaritySearch>,
    tone: Arc<dyn ToneClassifier>,
    locale: Arc<dyn LocaleDetector>,
    llm: Arc<LLMManager>,
    persona: PersonaPolicy,
    top_k: usize,
    concurrent_tone: bool,
}

impl ResponseGenerator {
    pub fn new(
        config: &PersonaRagConfig,
        search: Arc<dyn SimilaritySearch>,
        tone: Arc<dyn ToneClassifier>,
        locale: Arc<dyn LocaleDetector>,
        llm: Arc<LLMManager>,
    ) -> Self {
        Self {
            search,
            tone,
            locale,
            llm,
            persona: PersonaPolicy::new(config.persona.clone()),
            top_k: config.search.top_k,
            concurrent_tone: config.search.concurrent_tone,
        }
    }

    pub fn persona(&self) -> &PersonaPolicy {
        &self.persona
    }

    /// Answer `question` from the knowledge base in the persona's voice.
    pub async fn generate(&self, question: &str) -> String {
        let start = Instant::now();

        let (passages, early_tone) = if self.concurrent_tone {
            let (passages, tone) = tokio::join!(
                self.search.search(question, self.top_k),
                self.tone.classify_tone(question)
            );
            (passages, Some(tone))
        } else {
            (self.search.search(question, self.top_k).await, None)
        };
        let regional_mix = self.locale.is_regional_mix(question);

        if passages.is_empty() {
            tracing::info!(regional_mix = regional_mix, "No passages retrieved");
            return match self.persona.empty_context_policy() {
                EmptyContextPolicy::CannedFallback => self.persona.unknown_answer(regional_mix),
                EmptyContextPolicy::GenericGeneration => {
                    let prompt = self.persona.build_generic_prompt(regional_mix);
                    self.complete(prompt, question, start).await
                }
            };
        }

        let tone = match early_tone {
            Some(tone) => tone,
            None => self.tone.classify_tone(question).await,
        };

        tracing::info!(
            passages = passages.len(),
            tone = tone.as_str(),
            regional_mix = regional_mix,
            "Retrieval and tone classification done"
        );

        let context = join_passages(&passages);
        let prompt = self
            .persona
            .build_system_prompt(Some(&context), tone, regional_mix);
        self.complete(prompt, question, start).await
    }

    async fn complete(&self, system_prompt: String, question: &str, start: Instant) -> String {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(question)];

        match self.llm.chat(&messages).await {
            Ok(content) => {
                let answer = content.into_text();
                tracing::info!(
                    chars = answer.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Response generated"
                );
                answer
            }
            Err(e) => {
                tracing::error!(error = %e, "Error generating response");
                self.persona.error_message()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersonaConfig;
    use crate::llm::{ChatRole, CompletionContent};
    use crate::rag::{KeywordLocaleDetector, ToneLabel, NO_CONTEXT_MARKER};
    use crate::testing::{CountingTone, FixedTone, RecordingProvider, StubSearch};
    use serde_json::json;

    fn generator(
        config: PersonaRagConfig,
        search: StubSearch,
        tone: ToneLabel,
        provider: &RecordingProvider,
    ) -> ResponseGenerator {
        let locale = KeywordLocaleDetector::new(&config.persona.regional_markers);
        ResponseGenerator::new(
            &config,
            Arc::new(search),
            Arc::new(FixedTone(tone)),
            Arc::new(locale),
            provider.manager(),
        )
    }

    #[tokio::test]
    async fn test_answer_uses_context_prompt() {
        let provider = RecordingProvider::replying("Pavan is an AI engineer.");
        let generator = generator(
            PersonaRagConfig::default(),
            StubSearch::with_texts(&["Pavan builds agents.", "Pavan lives in Hyderabad."]),
            ToneLabel::Polite,
            &provider,
        );

        let answer = generator.generate("What does Pavan do?").await;
        assert_eq!(answer, "Pavan is an AI engineer.");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        let messages = &calls[0];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0]
            .content
            .contains("Pavan builds agents.\n\nPavan lives in Hyderabad."));
        assert!(messages[0].content.contains("respectful and witty"));
        assert_eq!(messages[1], ChatMessage::user("What does Pavan do?"));
    }

    #[tokio::test]
    async fn test_empty_search_returns_canned_fallback_without_completion() {
        let provider = RecordingProvider::replying("should not be used");
        let generator = generator(
            PersonaRagConfig::default(),
            StubSearch::empty(),
            ToneLabel::Unknown,
            &provider,
        );

        let answer = generator.generate("asdkjasd").await;
        assert_eq!(
            answer,
            "I don't know about that one. Ask me something about Pavan Tejavath instead!"
        );
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_fallback_is_localized() {
        let provider = RecordingProvider::replying("unused");
        let generator = generator(
            PersonaRagConfig::default(),
            StubSearch::empty(),
            ToneLabel::Casual,
            &provider,
        );

        let answer = generator.generate("nuvvu evaru mama?").await;
        assert!(answer.starts_with("Adi naaku teliyadu ra."));
    }

    #[tokio::test]
    async fn test_generic_generation_policy_uses_context_free_prompt() {
        let mut config = PersonaRagConfig::default();
        config.persona = PersonaConfig {
            empty_context_policy: EmptyContextPolicy::GenericGeneration,
            ..PersonaConfig::default()
        };
        let provider = RecordingProvider::replying("Try booking a call with Pavan.");
        let generator = generator(config, StubSearch::empty(), ToneLabel::Ego, &provider);

        let answer = generator.generate("What's the weather?").await;
        assert_eq!(answer, "Try booking a call with Pavan.");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0][0].content.contains(NO_CONTEXT_MARKER));
        assert!(!calls[0][0].content.contains("Context:\n"));
    }

    #[tokio::test]
    async fn test_completion_failure_yields_error_message() {
        let provider = RecordingProvider::failing();
        let generator = generator(
            PersonaRagConfig::default(),
            StubSearch::with_texts(&["Pavan builds agents."]),
            ToneLabel::Angry,
            &provider,
        );

        let answer = generator.generate("Tell me about Pavan").await;
        assert_eq!(
            answer,
            "I'm sorry, I encountered an error processing your request. Please try again."
        );
    }

    #[tokio::test]
    async fn test_parts_completion_is_flattened() {
        let provider = RecordingProvider {
            reply: Some(CompletionContent::Parts(vec![
                json!("a"),
                json!({"text": "b"}),
                json!("c"),
            ])),
            ..RecordingProvider::replying("")
        };
        let generator = generator(
            PersonaRagConfig::default(),
            StubSearch::with_texts(&["ctx"]),
            ToneLabel::Unknown,
            &provider,
        );

        assert_eq!(generator.generate("q").await, "a b c");
    }

    #[tokio::test]
    async fn test_top_k_bounds_passages() {
        let mut config = PersonaRagConfig::default();
        config.search.top_k = 1;
        let provider = RecordingProvider::replying("ok");
        let generator = generator(
            config,
            StubSearch::with_texts(&["first", "second"]),
            ToneLabel::Unknown,
            &provider,
        );

        generator.generate("q").await;
        let system = &provider.calls()[0][0].content;
        assert!(system.contains("first"));
        assert!(!system.contains("second"));
    }

    fn counting_generator(
        concurrent_tone: bool,
        search: StubSearch,
        tone: &CountingTone,
        provider: &RecordingProvider,
    ) -> ResponseGenerator {
        let mut config = PersonaRagConfig::default();
        config.search.concurrent_tone = concurrent_tone;
        let locale = KeywordLocaleDetector::new(&config.persona.regional_markers);
        ResponseGenerator::new(
            &config,
            Arc::new(search),
            Arc::new(tone.clone()),
            Arc::new(locale),
            provider.manager(),
        )
    }

    #[tokio::test]
    async fn test_empty_search_skips_tone_call_by_default() {
        let tone = CountingTone::new(ToneLabel::Casual);
        let provider = RecordingProvider::replying("unused");
        let generator = counting_generator(false, StubSearch::empty(), &tone, &provider);

        generator.generate("asdkjasd").await;
        assert_eq!(tone.count(), 0);
    }

    #[tokio::test]
    async fn test_tone_classified_once_when_passages_found() {
        for concurrent in [false, true] {
            let tone = CountingTone::new(ToneLabel::Ego);
            let provider = RecordingProvider::replying("ok");
            let generator =
                counting_generator(concurrent, StubSearch::with_texts(&["ctx"]), &tone, &provider);

            generator.generate("Pavan who?").await;
            assert_eq!(tone.count(), 1);
            assert!(provider.calls()[0][0].content.contains("savage and sarcastic"));
        }
    }

    #[tokio::test]
    async fn test_concurrent_tone_runs_even_without_passages() {
        let tone = CountingTone::new(ToneLabel::Casual);
        let provider = RecordingProvider::replying("unused");
        let generator = counting_generator(true, StubSearch::empty(), &tone, &provider);

        generator.generate("asdkjasd").await;
        assert_eq!(tone.count(), 1);
    }
}
