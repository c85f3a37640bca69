//! Append-only message log
//!
//! One entry per inbound or outbound chat event, in local arrival order
//! (which governs display order, not the payload's own timestamp). The log
//! is never filtered in place; `conversation` evaluates the render-time
//! filter fresh against the current selection.

use relaydesk_shared::{ChatMessage, MessageType};

/// Chronologically ordered chat history for the whole session
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.entries.push(message);
    }

    /// Messages visible in the active conversation view: CHAT or SYSTEM
    /// typed, and exchanged between the agent and the selected customer.
    pub fn conversation<'a>(
        &'a self,
        agent_id: &str,
        selected: Option<&str>,
    ) -> Vec<&'a ChatMessage> {
        let Some(customer) = selected else {
            return Vec::new();
        };
        self.entries
            .iter()
            .filter(|m| matches!(m.kind, MessageType::Chat | MessageType::System))
            .filter(|m| {
                m.sender == customer
                    || (m.sender == agent_id && m.receiver.as_deref() == Some(customer))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }
}
