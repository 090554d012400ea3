//! Configuration for a story session.

use serde::{Deserialize, Serialize};

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// RNG seed for reproducible dice and wildcard draws.
    pub seed: u64,
    /// Turn cap; reaching it forces the denouement.
    pub max_turns: u32,
    /// Conversation entries kept (oldest dropped first).
    pub history_limit: usize,
    /// Adventure moments kept (least significant dropped first).
    pub moment_limit: usize,
    /// Finished quests kept (oldest dropped first).
    pub completed_quest_limit: usize,
    /// Lines kept in each combat log.
    pub combat_log_limit: usize,
    /// How many recent generator invocations the wildcard cooldown checks.
    pub recent_generator_window: usize,
    /// Quest options shown to the player at once.
    pub quest_option_count: usize,
    /// From this turn on, completing a quest ends the story.
    pub closure_floor_turn: u32,
    /// Wildcard probability while exploring.
    pub wildcard_exploration: f64,
    /// Wildcard probability during dialogue.
    pub wildcard_dialogue: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_turns: 50,
            history_limit: 20,
            moment_limit: 15,
            completed_quest_limit: 10,
            combat_log_limit: 50,
            recent_generator_window: 3,
            quest_option_count: 3,
            closure_floor_turn: 25,
            wildcard_exploration: 0.15,
            wildcard_dialogue: 0.10,
        }
    }
}

impl SessionConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the turn cap (at least 1).
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    /// Set the conversation history size (at least 1).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Set the moment cap (at least 1).
    pub fn with_moment_limit(mut self, limit: usize) -> Self {
        self.moment_limit = limit.max(1);
        self
    }

    /// Set how many quest options are shown (at least 1).
    pub fn with_quest_option_count(mut self, count: usize) -> Self {
        self.quest_option_count = count.max(1);
        self
    }

    /// Set the turn from which a completed quest closes the story.
    pub fn with_closure_floor_turn(mut self, turn: u32) -> Self {
        self.closure_floor_turn = turn;
        self
    }

    /// Set both wildcard probabilities (each clamped to 0-1).
    pub fn with_wildcard_odds(mut self, exploration: f64, dialogue: f64) -> Self {
        self.wildcard_exploration = exploration.clamp(0.0, 1.0);
        self.wildcard_dialogue = dialogue.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.max_turns, 50);
        assert_eq!(cfg.history_limit, 20);
        assert_eq!(cfg.moment_limit, 15);
        assert_eq!(cfg.recent_generator_window, 3);
        assert_eq!(cfg.closure_floor_turn, 25);
        assert!((cfg.wildcard_exploration - 0.15).abs() < f64::EPSILON);
        assert!((cfg.wildcard_dialogue - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn builder_methods() {
        let cfg = SessionConfig::default()
            .with_seed(7)
            .with_max_turns(30)
            .with_history_limit(5)
            .with_moment_limit(4)
            .with_quest_option_count(2);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.max_turns, 30);
        assert_eq!(cfg.history_limit, 5);
        assert_eq!(cfg.moment_limit, 4);
        assert_eq!(cfg.quest_option_count, 2);
    }

    #[test]
    fn values_clamped() {
        let cfg = SessionConfig::default()
            .with_max_turns(0)
            .with_history_limit(0)
            .with_wildcard_odds(-1.0, 3.0);
        assert_eq!(cfg.max_turns, 1);
        assert_eq!(cfg.history_limit, 1);
        assert!(cfg.wildcard_exploration.abs() < f64::EPSILON);
        assert!((cfg.wildcard_dialogue - 1.0).abs() < f64::EPSILON);
    }
}
