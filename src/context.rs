//! Conversation context — a bounded FIFO of recent turns.
//!
//! Interpretation and generation read the context for continuity but never
//! mutate it; only the caller (or orchestrator) appends turns.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of retained turns.
pub const DEFAULT_CONTEXT_CAPACITY: usize = 10;

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The last N turns of a conversation, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_CAPACITY)
    }
}

impl ConversationContext {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a turn, evicting the oldest when at capacity.
    pub fn push(&mut self, turn: Turn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Turns spoken by the user, oldest first.
    pub fn user_turns(&self) -> Vec<&Turn> {
        self.turns.iter().filter(|t| t.role == Role::User).collect()
    }

    /// Turns spoken by the assistant, oldest first.
    pub fn assistant_turns(&self) -> Vec<&Turn> {
        self.turns
            .iter()
            .filter(|t| t.role == Role::Assistant)
            .collect()
    }

    /// All prior user text concatenated, for archetype matching.
    pub fn prior_user_text(&self) -> String {
        self.user_turns()
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Most recent user turn, if any.
    pub fn last_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }
}
