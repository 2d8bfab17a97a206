//! Turn and ConversationLog domain types.
//!
//! A `Turn` is one attributed utterance; the `ConversationLog` is the
//! append-only, chronologically ordered record of them. Exactly two things
//! ever write to the log: the user producing an utterance and the model
//! producing a response. Nothing is deleted or reordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::persona::{Persona, builtin};

/// Unique identifier for a conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One attributed utterance. Created when the utterance is finalized,
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// The utterance text.
    pub content: String,

    /// Who spoke.
    pub persona: Persona,

    /// When the utterance was finalized.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped now.
    pub fn new(persona: Persona, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            persona,
            timestamp: Utc::now(),
        }
    }

    /// Body attributed to the actual speaker: `Name: content`.
    pub fn attributed_line(&self) -> String {
        format!("{}: {}", self.persona.name, self.content)
    }

    /// Body re-attributed to the user: `User: content`. The turn that
    /// immediately precedes generation is always presented this way.
    pub fn as_user_line(&self) -> String {
        format!("{}: {}", builtin::USER_NAME, self.content)
    }
}

/// Append-only, chronologically ordered sequence of turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLog {
    /// Unique log ID.
    pub id: ConversationId,

    /// Ordered turns. Invariant: timestamps are non-decreasing.
    turns: Vec<Turn>,

    /// When this log was created.
    pub created_at: DateTime<Utc>,

    /// When the last turn was recorded.
    pub updated_at: DateTime<Utc>,
}

impl ConversationLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record an utterance produced by the user.
    pub fn record_user(&mut self, content: impl Into<String>) {
        self.append(Turn::new(builtin::user(), content));
    }

    /// Record a model response, attributed to the persona that prompted it.
    pub fn record_reply(&mut self, persona: &Persona, content: impl Into<String>) {
        self.append(Turn::new(persona.clone(), content));
    }

    /// The ordered turns.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn append(&mut self, mut turn: Turn) {
        // Clamp against clock steps so index order stays chronological.
        if let Some(last) = self.turns.last() {
            if turn.timestamp < last.timestamp {
                turn.timestamp = last.timestamp;
            }
        }
        self.updated_at = turn.timestamp;
        self.turns.push(turn);
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_preserves_insertion_order() {
        let mut log = ConversationLog::new();
        log.record_user("Hi");
        log.record_reply(&builtin::wise_friend(), "Hello!");
        log.record_user("How are you?");

        let contents: Vec<&str> = log.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["Hi", "Hello!", "How are you?"]);
    }

    #[test]
    fn timestamps_are_non_decreasing() {
        let mut log = ConversationLog::new();
        for i in 0..20 {
            log.record_user(format!("turn {i}"));
        }
        for pair in log.turns().windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn user_turns_carry_the_user_persona() {
        let mut log = ConversationLog::new();
        log.record_user("Hi");
        assert!(log.last().unwrap().persona.is_user());
    }

    #[test]
    fn attributed_and_relabeled_bodies() {
        let turn = Turn::new(builtin::wise_friend(), "Hello!");
        assert_eq!(turn.attributed_line(), "Wise Friend: Hello!");
        assert_eq!(turn.as_user_line(), "User: Hello!");
    }

    #[test]
    fn empty_log_has_no_last_turn() {
        let log = ConversationLog::new();
        assert!(log.is_empty());
        assert!(log.last().is_none());
    }

    #[test]
    fn log_serialization_roundtrip() {
        let mut log = ConversationLog::new();
        log.record_user("Hi");
        log.record_reply(&builtin::cultural_bridge(), "Imagine this.");

        let json = serde_json::to_string(&log).unwrap();
        let back: ConversationLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.turns()[1].persona.name, "Cultural Bridge");
    }
}
