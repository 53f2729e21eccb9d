//! In-memory conversation history

use chrono::{DateTime, Local};

use crate::api::AgentReply;

/// Fixed notice shown when a submission cannot be delivered.
pub const SUBMIT_FAILURE_NOTICE: &str = "Failed to send message. Please try again.";

/// Who a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Agent,
    Error,
}

/// A single chat message. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    author: Option<String>,
    text: String,
    sent_at: DateTime<Local>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::User,
            author: None,
            text: text.into(),
            sent_at: Local::now(),
        }
    }

    pub fn agent(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Agent,
            author: Some(author.into()),
            text: text.into(),
            sent_at: Local::now(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            author: None,
            text: text.into(),
            sent_at: Local::now(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Display name, only set for agent messages
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp_label(&self) -> String {
        self.sent_at.format("%H:%M:%S").to_string()
    }
}

impl From<AgentReply> for Message {
    fn from(reply: AgentReply) -> Self {
        Message::agent(reply.author, reply.text)
    }
}

/// Append-only message sequence for the lifetime of the session.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
