//! Stub collaborators shared by unit tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::llm::{
    ChatMessage, CompletionContent, GenerationConfig, LLMConfig, LLMManager, LLMProvider,
    ProviderInfo,
};
use crate::rag::{ToneClassifier, ToneLabel};
use crate::search::SimilaritySearch;
use crate::types::RetrievedPassage;

pub struct StubSearch {
    pub passages: Vec<RetrievedPassage>,
}

impl StubSearch {
    pub fn with_texts(texts: &[&str]) -> Self {
        Self {
            passages: texts.iter().map(|t| RetrievedPassage::new(*t)).collect(),
        }
    }

    pub fn empty() -> Self {
        Self { passages: Vec::new() }
    }
}

#[async_trait]
impl SimilaritySearch for StubSearch {
    async fn search(&self, _query: &str, k: usize) -> Vec<RetrievedPassage> {
        self.passages.iter().take(k).cloned().collect()
    }
}

pub struct FixedTone(pub ToneLabel);

#[async_trait]
impl ToneClassifier for FixedTone {
    async fn classify_tone(&self, _utterance: &str) -> ToneLabel {
        self.0
    }
}

/// Fixed label that counts how often it was asked.
#[derive(Clone)]
pub struct CountingTone {
    label: ToneLabel,
    calls: Arc<AtomicUsize>,
}

impl CountingTone {
    pub fn new(label: ToneLabel) -> Self {
        Self {
            label,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToneClassifier for CountingTone {
    async fn classify_tone(&self, _utterance: &str) -> ToneLabel {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.label
    }
}

/// Records every message list it receives and answers with `reply`, or fails
/// when `reply` is `None`.
#[derive(Clone)]
pub struct RecordingProvider {
    pub reply: Option<CompletionContent>,
    pub calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl RecordingProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(CompletionContent::Text(text.to_string())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn manager(&self) -> Arc<LLMManager> {
        Arc::new(LLMManager::with_provider(LLMConfig::default(), Box::new(self.clone())))
    }
}

#[async_trait]
impl LLMProvider for RecordingProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _config: &GenerationConfig,
    ) -> Result<CompletionContent> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.reply
            .clone()
            .ok_or_else(|| anyhow!("completion service unavailable"))
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "recording".to_string(),
            model: "test".to_string(),
        }
    }
}
