use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::core::message::Message;

/// Append-only, creation-ordered transcript.
///
/// Ordering is the order of `append` calls; timestamps are never compared.
#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the updated history.
    pub fn append(&mut self, message: Message) -> &[Message] {
        self.messages.push(message);
        &self.messages
    }

    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn key(&self) -> HistoryKey {
        HistoryKey::of(&self.messages)
    }
}

/// Identifies a history value for session caching: two histories with the
/// same key seed identical sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    len: usize,
    digest: u64,
}

impl HistoryKey {
    pub fn of(messages: &[Message]) -> Self {
        let mut hasher = DefaultHasher::new();
        for message in messages {
            message.role().hash(&mut hasher);
            message.text().hash(&mut hasher);
        }
        Self {
            len: messages.len(),
            digest: hasher.finish(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
