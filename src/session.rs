use crate::extraction::Extractor;
use crate::llm::MessageRole;
use crate::ui::streaming::{Card, MessageStream, RenderDecision};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Streaming,
    Complete,
    /// The transport stopped before the reply finished
    Abandoned,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    /// Raw text as typed by the user or streamed by the model
    pub text: String,
    /// URLs of uploaded images attached to a user message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Text the user sees, with card blocks removed
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
    pub status: MessageStatus,
}

/// Conversation state for one chat.
///
/// Holds everything the UI needs to redraw the conversation. The assistant
/// turn currently being streamed is tracked separately and is not persisted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatSession {
    pub id: String,
    pub name: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub messages: Vec<ChatMessage>,
    /// The assistant is producing a reply
    #[serde(default)]
    pub is_typing: bool,
    #[serde(skip)]
    active_turn: Option<MessageStream>,
}

impl ChatSession {
    pub fn new_empty(id: String, name: String) -> Self {
        Self {
            id,
            name,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
            messages: Vec::new(),
            is_typing: false,
            active_turn: None,
        }
    }

    pub fn add_user_message(&mut self, text: impl Into<String>, images: Vec<String>) {
        let text = text.into();
        self.messages.push(ChatMessage {
            role: MessageRole::User,
            display_text: text.clone(),
            text,
            images,
            cards: Vec::new(),
            status: MessageStatus::Complete,
        });
        self.touch();
    }

    /// Start streaming a new assistant reply. A reply still in flight is abandoned.
    pub fn begin_assistant_turn(&mut self, extractor: Arc<Extractor>) {
        if self.active_turn.is_some() {
            info!("Abandoning unfinished reply in session {}", self.id);
            self.abandon_turn();
        }

        self.messages.push(ChatMessage {
            role: MessageRole::Assistant,
            text: String::new(),
            images: Vec::new(),
            display_text: String::new(),
            cards: Vec::new(),
            status: MessageStatus::Streaming,
        });
        self.active_turn = Some(MessageStream::new(extractor));
        self.is_typing = true;
        debug!("Began assistant turn in session {}", self.id);
    }

    /// Append a delta to the active reply. Returns `None` when no reply is active.
    pub fn apply_delta(&mut self, delta: &str) -> Option<RenderDecision> {
        let stream = self.active_turn.as_mut()?;
        let decision = stream.push_delta(delta);
        if let Some(message) = self.messages.last_mut() {
            update_message(message, stream, &decision, MessageStatus::Streaming);
        }
        Some(decision)
    }

    /// Finish the active reply and store its final text and cards
    pub fn complete_turn(&mut self) -> Option<RenderDecision> {
        let mut stream = self.active_turn.take()?;
        let decision = stream.complete();
        if let Some(message) = self.messages.last_mut() {
            update_message(message, &stream, &decision, MessageStatus::Complete);
        }
        self.is_typing = false;
        self.touch();
        Some(decision)
    }

    /// Stop the active reply where it is, keeping whatever was already shown
    pub fn abandon_turn(&mut self) {
        let Some(stream) = self.active_turn.take() else {
            return;
        };
        if let Some(message) = self.messages.last_mut() {
            update_message(message, &stream, stream.decision(), MessageStatus::Abandoned);
        }
        self.is_typing = false;
        self.touch();
    }

    /// Store a reply that was streamed elsewhere
    pub fn record_assistant_turn(&mut self, stream: &MessageStream) {
        self.abandon_turn();

        let status = if stream.is_streaming() {
            MessageStatus::Abandoned
        } else {
            MessageStatus::Complete
        };
        let mut message = ChatMessage {
            role: MessageRole::Assistant,
            text: String::new(),
            images: Vec::new(),
            display_text: String::new(),
            cards: Vec::new(),
            status,
        };
        update_message(&mut message, stream, stream.decision(), status);
        self.messages.push(message);
        self.touch();
    }

    pub fn is_turn_active(&self) -> bool {
        self.active_turn.is_some()
    }

    pub fn card_count(&self) -> usize {
        self.messages.iter().map(|m| m.cards.len()).sum()
    }

    fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }
}

fn update_message(
    message: &mut ChatMessage,
    stream: &MessageStream,
    decision: &RenderDecision,
    status: MessageStatus,
) {
    message.text = stream.message().full_text.clone();
    message.display_text = if decision.show_plain_text {
        decision.plain_text.clone()
    } else {
        String::new()
    };
    message.cards = decision.cards_to_render.clone();
    message.status = status;
}
