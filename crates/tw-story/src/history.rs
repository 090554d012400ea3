//! Bounded conversation history.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a line of conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    /// The player's typed action.
    Player,
    /// Generated narration.
    Narrator,
    /// Engine notices (quest accepted, closure, ...).
    System,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Narrator => write!(f, "Narrator"),
            Self::System => write!(f, "System"),
        }
    }
}

/// A single line of conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Who said it.
    pub speaker: Speaker,
    /// What was said.
    pub text: String,
    /// Adventure turn at the time.
    pub turn: u32,
    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Ring buffer of recent conversation; the oldest entry is dropped first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ConversationHistory {
    /// Create an empty history keeping at most `limit` entries.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Append an entry, evicting the oldest beyond the limit.
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>, turn: u32) {
        self.entries.push_back(HistoryEntry {
            speaker,
            text: text.into(),
            turn,
            timestamp: Utc::now(),
        });
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last `n` entries rendered as "Speaker: text" lines.
    pub fn transcript(&self, n: usize) -> String {
        let skip = self.entries.len().saturating_sub(n);
        self.entries
            .iter()
            .skip(skip)
            .map(|e| format!("{}: {}", e.speaker, e.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
