//! Quests and their objectives.

pub mod board;
pub mod tracker;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Most objectives a quest may carry.
pub const MAX_OBJECTIVES: usize = 3;

/// Lifecycle state of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestStatus {
    /// In progress.
    #[default]
    Active,
    /// Every objective is done.
    Completed,
    /// The quest can no longer be finished.
    Failed,
    /// The player walked away from it.
    Abandoned,
}

impl std::fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// One thing the player must do to finish a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Identifier, unique within its quest.
    pub id: String,
    /// What the player must do, e.g. "Recover the silver amulet".
    pub description: String,
    /// Whether the objective is done.
    pub completed: bool,
    /// For counted objectives, how many times it must be met.
    pub target_count: Option<u32>,
    /// Progress toward `target_count`.
    pub current_count: u32,
}

impl Objective {
    /// Create a simple one-shot objective.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            completed: false,
            target_count: None,
            current_count: 0,
        }
    }

    /// Turn this into a counted objective (target at least 1).
    pub fn with_target(mut self, target: u32) -> Self {
        self.target_count = Some(target.max(1));
        self
    }

    /// Record one qualifying event. Returns true if this completed it.
    pub fn record_progress(&mut self) -> bool {
        if self.completed {
            return false;
        }
        match self.target_count {
            Some(target) => {
                self.current_count = (self.current_count + 1).min(target);
                self.completed = self.current_count >= target;
            }
            None => self.completed = true,
        }
        self.completed
    }

    /// Display line, e.g. "[x] Recover the amulet" or "[ ] Slay wolves (1/3)".
    pub fn display_line(&self) -> String {
        let mark = if self.completed { "x" } else { " " };
        match self.target_count {
            Some(target) => format!(
                "[{mark}] {} ({}/{target})",
                self.description, self.current_count
            ),
            None => format!("[{mark}] {}", self.description),
        }
    }
}

/// A goal the player pursues through one or more objectives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Unique identifier.
    pub id: Uuid,
    /// Short title.
    pub title: String,
    /// Longer hook text.
    pub description: String,
    /// Between one and three objectives.
    pub objectives: Vec<Objective>,
    /// Promised reward.
    pub reward: String,
    /// Who offered the quest.
    pub giver: String,
    /// Where to start looking.
    pub location_hint: Option<String>,
    /// Lifecycle state.
    pub status: QuestStatus,
}

impl Quest {
    /// Create an active quest with no objectives yet.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        giver: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            objectives: Vec::new(),
            reward: String::new(),
            giver: giver.into(),
            location_hint: None,
            status: QuestStatus::Active,
        }
    }

    /// Add a one-shot objective.
    pub fn with_objective(mut self, description: impl Into<String>) -> Self {
        let id = format!("obj-{}", self.objectives.len() + 1);
        self.objectives.push(Objective::new(id, description));
        self
    }

    /// Add an objective that must be met `target` times.
    pub fn with_counted_objective(mut self, description: impl Into<String>, target: u32) -> Self {
        let id = format!("obj-{}", self.objectives.len() + 1);
        self.objectives
            .push(Objective::new(id, description).with_target(target));
        self
    }

    /// Set the reward.
    pub fn with_reward(mut self, reward: impl Into<String>) -> Self {
        self.reward = reward.into();
        self
    }

    /// Set the location hint.
    pub fn with_location_hint(mut self, hint: impl Into<String>) -> Self {
        self.location_hint = Some(hint.into());
        self
    }

    /// Check the structural rules: a non-empty title and 1-3 objectives.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("quest has no title".to_string());
        }
        if self.objectives.is_empty() || self.objectives.len() > MAX_OBJECTIVES {
            return Err(format!(
                "quest \"{}\" has {} objectives (expected 1 to {MAX_OBJECTIVES})",
                self.title,
                self.objectives.len()
            ));
        }
        Ok(())
    }

    /// Number of finished objectives.
    pub fn completed_objectives(&self) -> usize {
        self.objectives.iter().filter(|o| o.completed).count()
    }

    /// Fraction of objectives finished (0.0 for a quest without any).
    pub fn progress(&self) -> f64 {
        if self.objectives.is_empty() {
            return 0.0;
        }
        self.completed_objectives() as f64 / self.objectives.len() as f64
    }

    /// Whether every objective is done.
    pub fn all_objectives_done(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }

    /// Whether the quest has been completed.
    pub fn is_completed(&self) -> bool {
        self.status == QuestStatus::Completed
    }

    /// Multi-line description for a quest board or status screen.
    pub fn describe(&self) -> String {
        let mut out = format!("{} (from {})\n{}", self.title, self.giver, self.description);
        if let Some(hint) = &self.location_hint {
            out.push_str(&format!("\nStart at: {hint}"));
        }
        for obj in &self.objectives {
            out.push_str(&format!("\n  {}", obj.display_line()));
        }
        if !self.reward.is_empty() {
            out.push_str(&format!("\nReward: {}", self.reward));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest() -> Quest {
        Quest::new("The Lost Amulet", "A widow's heirloom is missing.", "Widow Marra")
            .with_objective("Recover the silver amulet")
            .with_counted_objective("Defeat the chapel's guardians", 2)
            .with_reward("40 silver")
    }

    #[test]
    fn objective_ids_are_sequential() {
        let q = quest();
        assert_eq!(q.objectives[0].id, "obj-1");
        assert_eq!(q.objectives[1].id, "obj-2");
    }

    #[test]
    fn counted_objective_needs_every_hit() {
        let mut q = quest();
        let obj = &mut q.objectives[1];
        assert!(!obj.record_progress());
        assert_eq!(obj.current_count, 1);
        assert!(obj.record_progress());
        assert!(obj.completed);
        assert!(!obj.record_progress());
        assert_eq!(obj.current_count, 2);
    }

    #[test]
    fn progress_fraction() {
        let mut q = quest();
        assert!(q.progress().abs() < f64::EPSILON);
        q.objectives[0].record_progress();
        assert!((q.progress() - 0.5).abs() < f64::EPSILON);
        assert!(!q.all_objectives_done());
    }

    #[test]
    fn validate_objective_count() {
        assert!(quest().validate().is_ok());
        let empty = Quest::new("Nothing", "", "nobody");
        assert!(empty.validate().is_err());
        let crowded = Quest::new("Busy", "", "nobody")
            .with_objective("a")
            .with_objective("b")
            .with_objective("c")
            .with_objective("d");
        assert!(crowded.validate().is_err());
        let untitled = Quest::new("  ", "", "nobody").with_objective("a");
        assert!(untitled.validate().is_err());
    }

    #[test]
    fn describe_lists_objectives() {
        let text = quest().with_location_hint("the old chapel").describe();
        assert!(text.contains("The Lost Amulet (from Widow Marra)"));
        assert!(text.contains("[ ] Recover the silver amulet"));
        assert!(text.contains("(0/2)"));
        assert!(text.contains("Start at: the old chapel"));
        assert!(text.contains("Reward: 40 silver"));
    }

    #[test]
    fn serde_roundtrip() {
        let q = quest();
        let json = serde_json::to_string(&q).unwrap();
        let back: Quest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
