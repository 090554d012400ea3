//! Gameplay phases and the transitions allowed between them.

use serde::{Deserialize, Serialize};

/// The coarse gameplay mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// The player is building a character.
    CharacterCreation,
    /// The player is choosing a quest.
    QuestSelection,
    /// Free-form adventuring.
    Exploration,
    /// A combat encounter is running.
    Combat,
    /// The story is wrapping up. Terminal.
    Denouement,
}

impl GamePhase {
    /// Whether a session in this phase may move to `next`.
    ///
    /// Staying in the same phase is always allowed.
    pub fn can_transition_to(self, next: Self) -> bool {
        use GamePhase::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (CharacterCreation, QuestSelection)
                | (QuestSelection, Exploration)
                | (QuestSelection, Denouement)
                | (Exploration, Combat)
                | (Exploration, QuestSelection)
                | (Exploration, Denouement)
                | (Combat, Exploration)
                | (Combat, Denouement)
        )
    }

    /// True for the final phase.
    pub fn is_terminal(self) -> bool {
        self == Self::Denouement
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CharacterCreation => write!(f, "character creation"),
            Self::QuestSelection => write!(f, "quest selection"),
            Self::Exploration => write!(f, "exploration"),
            Self::Combat => write!(f, "combat"),
            Self::Denouement => write!(f, "denouement"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GamePhase::*;
    use super::*;

    const ALL: [GamePhase; 5] = [
        CharacterCreation,
        QuestSelection,
        Exploration,
        Combat,
        Denouement,
    ];

    #[test]
    fn main_path_is_legal() {
        assert!(CharacterCreation.can_transition_to(QuestSelection));
        assert!(QuestSelection.can_transition_to(Exploration));
        assert!(Exploration.can_transition_to(Combat));
        assert!(Combat.can_transition_to(Exploration));
        assert!(Exploration.can_transition_to(Denouement));
    }

    #[test]
    fn shortcuts_are_illegal() {
        assert!(!CharacterCreation.can_transition_to(Combat));
        assert!(!CharacterCreation.can_transition_to(Exploration));
        assert!(!QuestSelection.can_transition_to(Combat));
        assert!(!Combat.can_transition_to(QuestSelection));
    }

    #[test]
    fn denouement_is_terminal() {
        assert!(Denouement.is_terminal());
        for next in ALL {
            assert_eq!(Denouement.can_transition_to(next), next == Denouement);
        }
    }

    #[test]
    fn self_transitions_allowed() {
        for phase in ALL {
            assert!(phase.can_transition_to(phase));
        }
    }

    #[test]
    fn display() {
        assert_eq!(QuestSelection.to_string(), "quest selection");
        assert_eq!(Denouement.to_string(), "denouement");
    }
}
