//! Persona Policy
//!
//! Builds the system instruction for the answer call. Templates are picked in
//! two steps: the register family (plain English, or an English/Telugu
//! code-mixed reply) and then a tone directive inside that family. Every
//! combination produces a prompt, so composition never fails.
//!
//! Whether off-topic questions are refused is a configuration switch
//! (`restrict_to_subject`), not a separate template set.

use crate::config::{EmptyContextPolicy, PersonaConfig};
use crate::rag::tone::ToneLabel;

pub const NO_CONTEXT_MARKER: &str = "No context available.";

pub struct PersonaPolicy {
    config: PersonaConfig,
}

impl PersonaPolicy {
    pub fn new(config: PersonaConfig) -> Self {
        Self { config }
    }

    pub fn empty_context_policy(&self) -> EmptyContextPolicy {
        self.config.empty_context_policy
    }

    fn fill(&self, template: &str) -> String {
        template.replace("{subject}", &self.config.subject_name)
    }

    fn identity(&self, regional_mix: bool) -> String {
        let subject = &self.config.subject_name;
        let assistant = &self.config.assistant_name;
        if regional_mix {
            format!(
                "You are {assistant}, {subject}'s personal AI assistant. The user is writing in \
                 Tenglish (Telugu words typed in English letters mixed with English). Reply in the \
                 same Tenglish style, keeping sentences short and natural."
            )
        } else {
            format!(
                "You are {assistant}, {subject}'s personal AI assistant. You answer questions about \
                 {subject} using the information provided in the context below."
            )
        }
    }

    fn tone_directive(tone: ToneLabel, regional_mix: bool) -> &'static str {
        match (regional_mix, tone) {
            (false, ToneLabel::Ego) => {
                "The user is showing off or acting superior. Be savage and sarcastic, but never rude \
                 or offensive. Deflate the ego with humour, then answer."
            }
            (false, ToneLabel::Polite) => {
                "The user is polite. Be respectful and witty, and match their courtesy."
            }
            (false, ToneLabel::Casual) => {
                "The user is casual. Be chill and friendly, like talking to a friend."
            }
            (false, ToneLabel::Angry) => {
                "The user is upset. Stay calm and de-escalating. Acknowledge the frustration \
                 briefly, then help."
            }
            (false, ToneLabel::Unknown) => "Be helpful and conversational.",
            (true, ToneLabel::Ego) => {
                "The user is showing off. Be savage and sarcastic in Tenglish, roast them lightly \
                 like a close friend would, then answer."
            }
            (true, ToneLabel::Polite) => {
                "The user is polite. Be respectful and witty in Tenglish, warm like talking to an elder."
            }
            (true, ToneLabel::Casual) => {
                "The user is casual. Be chill and friendly in Tenglish, like chatting with a mama at \
                 the tea stall."
            }
            (true, ToneLabel::Angry) => {
                "The user is upset. Stay calm and de-escalating in Tenglish. Cool them down gently, \
                 then help."
            }
            (true, ToneLabel::Unknown) => "Be helpful and conversational in Tenglish.",
        }
    }

    fn scope_rule(&self, tone: ToneLabel) -> String {
        let subject = &self.config.subject_name;
        if !self.config.restrict_to_subject {
            return "Answer using the context. If the question cannot be answered from the context, \
                    just say you don't know. Do not make up an answer."
                .to_string();
        }
        match tone {
            ToneLabel::Ego | ToneLabel::Casual | ToneLabel::Angry => format!(
                "Only answer questions about {subject}. If the question is about anything else, \
                 refuse with a short sassy deflection and steer the user back to {subject}. If the \
                 context does not cover the question, say you don't know."
            ),
            ToneLabel::Polite | ToneLabel::Unknown => format!(
                "Only answer questions about {subject}. If the question is about anything else, \
                 politely decline and suggest asking about {subject} instead. If the context does \
                 not cover the question, say you don't know."
            ),
        }
    }

    /// Compose the system prompt for an answer call.
    ///
    /// `context` is appended verbatim; when absent the prompt carries
    /// [`NO_CONTEXT_MARKER`] instead.
    pub fn build_system_prompt(
        &self,
        context: Option<&str>,
        tone: ToneLabel,
        regional_mix: bool,
    ) -> String {
        let context_block = match context {
            Some(context) => format!("Context:\n{}", context),
            None => NO_CONTEXT_MARKER.to_string(),
        };

        format!(
            "{}\n\n{}\n\n{}\n\n{}",
            self.identity(regional_mix),
            Self::tone_directive(tone, regional_mix),
            self.scope_rule(tone),
            context_block
        )
    }

    /// Context-free prompt used when retrieval found nothing and the generic
    /// generation policy is on.
    pub fn build_generic_prompt(&self, regional_mix: bool) -> String {
        let subject = &self.config.subject_name;
        let language = if regional_mix {
            "Reply in Tenglish, matching the user's style."
        } else {
            "Reply in English."
        };
        format!(
            "{}\n\nYou have no specific information about this question. Give a brief helpful \
             reply, and suggest that the user book an appointment with {subject} or send {subject} \
             a message for more details. {language}\n\n{NO_CONTEXT_MARKER}",
            self.identity(regional_mix)
        )
    }

    pub fn unknown_answer(&self, regional_mix: bool) -> String {
        if regional_mix {
            self.fill(&self.config.unknown_answer_regional)
        } else {
            self.fill(&self.config.unknown_answer)
        }
    }

    pub fn error_message(&self) -> String {
        self.fill(&self.config.error_message)
    }

    pub fn clarification_message(&self) -> String {
        self.fill(&self.config.clarification_message)
    }
}
