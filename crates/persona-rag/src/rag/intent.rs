//! Keyword intent routing for the latest user message.
//!
//! Appointment keywords are checked before contact keywords, so a message
//! that mentions both ("call me to schedule a meeting") routes to
//! `Appointment`. Matching is case-insensitive substring matching.

use serde::{Deserialize, Serialize};

use crate::llm::{ChatMessage, ChatRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    General,
    Appointment,
    Contact,
    Info,
}

const APPOINTMENT_KEYWORDS: &[&str] = &[
    "appointment",
    "schedule",
    "book",
    "meet",
    "meeting",
    "availability",
    "available",
    "time",
    "slot",
    "calendar",
];

const CONTACT_KEYWORDS: &[&str] = &[
    "contact",
    "message",
    "email",
    "reach",
    "call",
    "get in touch",
    "talk to",
    "speak with",
    "send a message",
];

pub trait IntentDetector: Send + Sync {
    fn detect_intent(&self, latest: &ChatMessage) -> Intent;
}

pub struct KeywordIntentRouter {
    appointment: Vec<String>,
    contact: Vec<String>,
}

impl KeywordIntentRouter {
    pub fn new(appointment: Vec<String>, contact: Vec<String>) -> Self {
        Self {
            appointment: appointment.into_iter().map(|k| k.to_lowercase()).collect(),
            contact: contact.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(keywords: &[String], text: &str) -> bool {
        keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

impl Default for KeywordIntentRouter {
    fn default() -> Self {
        Self::new(
            APPOINTMENT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            CONTACT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        )
    }
}

impl IntentDetector for KeywordIntentRouter {
    fn detect_intent(&self, latest: &ChatMessage) -> Intent {
        if latest.role != ChatRole::User {
            return Intent::General;
        }

        let text = latest.content.to_lowercase();
        if Self::matches(&self.appointment, &text) {
            Intent::Appointment
        } else if Self::matches(&self.contact, &text) {
            Intent::Contact
        } else {
            Intent::Info
        }
    }
}
