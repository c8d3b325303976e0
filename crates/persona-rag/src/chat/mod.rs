pub mod engine;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::llm::ChatMessage;
use crate::rag::Intent;

pub use engine::ConversationOrchestrator;

/// Request-scoped working state for one `process` call. Built from the
/// caller's transcript and dropped once the envelope is assembled.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
    pub intent: Option<Intent>,
    pub appointment_data: Option<Value>,
    pub contact_data: Option<Value>,
}

impl ConversationState {
    pub fn new(messages: &[ChatMessage]) -> Self {
        Self {
            messages: messages.to_vec(),
            ..Self::default()
        }
    }

    /// Attach the placeholder payload for follow-up intents. Entities are not
    /// extracted from the utterance; the payload only records what the user
    /// wants to do.
    pub fn attach_placeholder(&mut self) {
        match self.intent {
            Some(Intent::Appointment) => {
                self.appointment_data = Some(json!({ "intent": "book_appointment" }));
            }
            Some(Intent::Contact) => {
                self.contact_data = Some(json!({ "intent": "send_message" }));
            }
            _ => {}
        }
    }

    /// The follow-up directive, present only when placeholder data was set.
    pub fn action(&self) -> Option<Action> {
        if let Some(data) = &self.appointment_data {
            return Some(Action {
                action_type: ActionType::BookAppointment,
                data: data.clone(),
            });
        }
        self.contact_data.as_ref().map(|data| Action {
            action_type: ActionType::SendMessage,
            data: data.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    BookAppointment,
    SendMessage,
}

/// Advisory directive telling the UI which follow-up flow to open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub data: Value,
}

/// Envelope returned for every chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl ConversationResponse {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            intent: None,
            action: None,
        }
    }
}
