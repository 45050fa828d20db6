//! Bounded chat history kept per room.

use std::collections::VecDeque;

use super::entity::ChatMessage;

/// Number of messages a room keeps by default
pub const DEFAULT_CHAT_CAPACITY: usize = 100;

/// FIFO ring buffer of the most recent chat messages of a room
#[derive(Debug, Clone)]
pub struct ChatLog {
    capacity: usize,
    messages: VecDeque<ChatMessage>,
}

impl ChatLog {
    /// Create an empty log holding at most `capacity` messages
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a message, evicting the oldest ones beyond capacity
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// The last `count` messages, oldest first
    pub fn recent(&self, count: usize) -> Vec<ChatMessage> {
        let skip = self.messages.len().saturating_sub(count);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHAT_CAPACITY)
    }
}
