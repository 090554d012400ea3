//! Narrative-arc pacing derived from the turn counter.
//!
//! Pacing is a tone hint for narration. It never changes game rules; the
//! session's gameplay phase is tracked separately in [`crate::phase`].

use serde::{Deserialize, Serialize};

use crate::quest::Quest;

/// Where the story sits on its arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PacingPhase {
    /// Turns 0-5.
    #[default]
    Setup,
    /// Turns 6-20.
    Rising,
    /// Turns 21-30.
    MidPoint,
    /// Turns 31-42.
    Climax,
    /// Turn 43 onward, or a late quest completion.
    Denouement,
}

impl PacingPhase {
    /// Urgency added on top of turn progress.
    pub fn urgency_bonus(self) -> f64 {
        match self {
            Self::Setup => 0.0,
            Self::Rising => 0.05,
            Self::MidPoint => 0.1,
            Self::Climax => 0.2,
            Self::Denouement => 0.3,
        }
    }
}

impl std::fmt::Display for PacingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Rising => write!(f, "rising action"),
            Self::MidPoint => write!(f, "midpoint"),
            Self::Climax => write!(f, "climax"),
            Self::Denouement => write!(f, "denouement"),
        }
    }
}

/// Pacing phase for a turn number alone.
pub fn phase_for_turn(turn: u32) -> PacingPhase {
    match turn {
        0..=5 => PacingPhase::Setup,
        6..=20 => PacingPhase::Rising,
        21..=30 => PacingPhase::MidPoint,
        31..=42 => PacingPhase::Climax,
        _ => PacingPhase::Denouement,
    }
}

/// Pacing phase taking the quest into account.
///
/// A quest completed at or after `closure_floor` pulls the story straight
/// into its denouement.
pub fn phase_for_session(turn: u32, quest: Option<&Quest>, closure_floor: u32) -> PacingPhase {
    if turn >= closure_floor && quest.is_some_and(Quest::is_completed) {
        return PacingPhase::Denouement;
    }
    phase_for_turn(turn)
}

/// Urgency scalar in `[0, 1]`.
///
/// `turn / max` plus 0.2 times the quest's objective progress plus the
/// phase bonus, capped at 1.
pub fn urgency(turn: u32, max_turns: u32, quest: Option<&Quest>, phase: PacingPhase) -> f64 {
    let progress = f64::from(turn) / f64::from(max_turns.max(1));
    let quest_bonus = quest.map_or(0.0, |q| 0.2 * q.progress());
    (progress + quest_bonus + phase.urgency_bonus()).clamp(0.0, 1.0)
}
