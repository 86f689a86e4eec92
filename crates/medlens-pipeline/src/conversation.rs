//! Conversation log: append-only, session-scoped chat history
//!
//! Insertion order is chronological order is display order. Turns are never
//! mutated or removed; the log lives exactly as long as the session.

use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role-tagged message unit in the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Uploaded image bytes, retained for thumbnail redisplay (user turns only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
    pub timestamp: i64,
}

impl Turn {
    /// Create a user turn with an attached image
    pub fn user(text: impl Into<String>, image: Option<Vec<u8>>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create an assistant turn (report or warning text)
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            image: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Ordered sequence of turns owned by the active session
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn, retaining the uploaded image for redisplay
    pub fn append_user(&mut self, text: impl Into<String>, image: Option<Vec<u8>>) {
        self.turns.push(Turn::user(text, image));
    }

    /// Append an assistant turn
    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::assistant(text));
    }

    /// All turns in insertion order; the iterator is restartable
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent turn, if any
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let conv = Conversation::new();
        assert!(conv.is_empty());
        assert_eq!(conv.turns().count(), 0);
    }

    #[test]
    fn test_alternating_turns_after_n_runs() {
        let mut conv = Conversation::new();
        let n = 5;
        for i in 0..n {
            conv.append_user("Uploaded an image for analysis.", Some(vec![i as u8]));
            conv.append_assistant(format!("report {i}"));
        }
        assert_eq!(conv.len(), 2 * n);
        for (i, turn) in conv.turns().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
    }

    #[test]
    fn test_user_turn_retains_image() {
        let mut conv = Conversation::new();
        conv.append_user("Uploaded an image for analysis.", Some(vec![1, 2, 3]));
        conv.append_assistant("### 1. Image Type & Region ...");
        let user = conv.turns().next().unwrap();
        assert_eq!(user.image.as_deref(), Some(&[1u8, 2, 3][..]));
        assert!(conv.last().unwrap().image.is_none());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut conv = Conversation::new();
        conv.append_user("hi", None);
        conv.append_assistant("report");
        let first: Vec<_> = conv.turns().map(|t| t.role).collect();
        let second: Vec<_> = conv.turns().map(|t| t.role).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_timestamps_monotone_non_decreasing() {
        let mut conv = Conversation::new();
        conv.append_user("a", None);
        conv.append_assistant("b");
        let stamps: Vec<_> = conv.turns().map(|t| t.timestamp).collect();
        assert!(stamps[0] <= stamps[1]);
    }
}
