//! Pre-configured enemy templates.
//!
//! Each template produces a fresh enemy combatant at full health when an
//! encounter starts.

use serde::{Deserialize, Serialize};

use crate::dice::DiceNotation;
use crate::sheet::signed;

/// Statistics for an enemy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Display name (e.g., "Goblin").
    pub name: String,
    /// Short flavor line for narration.
    pub description: String,
    /// Starting and maximum hit points.
    pub max_health: u32,
    /// Attacks hit on `d20 + bonus >= defense`.
    pub defense: u32,
    /// Dexterity modifier applied to initiative.
    pub dex_modifier: i32,
    /// Attack roll bonus.
    pub attack_bonus: i32,
    /// Damage dealt on a hit.
    pub damage: DiceNotation,
}

impl std::fmt::Display for EnemyTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (HP {}, defense {}, attack {}, damage {})",
            self.name,
            self.max_health,
            self.defense,
            signed(self.attack_bonus),
            self.damage
        )
    }
}

/// A small, quick goblin skirmisher.
pub fn goblin() -> EnemyTemplate {
    EnemyTemplate {
        name: "Goblin".to_string(),
        description: "a wiry goblin with a notched scimitar and a worse temper".to_string(),
        max_health: 7,
        defense: 13,
        dex_modifier: 2,
        attack_bonus: 4,
        damage: DiceNotation::new(1, 6, 2),
    }
}

/// A hungry wolf.
pub fn wolf() -> EnemyTemplate {
    EnemyTemplate {
        name: "Wolf".to_string(),
        description: "a gaunt grey wolf, ribs showing, eyes fixed on you".to_string(),
        max_health: 11,
        defense: 13,
        dex_modifier: 2,
        attack_bonus: 4,
        damage: DiceNotation::new(2, 4, 2),
    }
}

/// A roadside bandit.
pub fn bandit() -> EnemyTemplate {
    EnemyTemplate {
        name: "Bandit".to_string(),
        description: "a masked bandit who clearly expected an easier mark".to_string(),
        max_health: 11,
        defense: 12,
        dex_modifier: 1,
        attack_bonus: 3,
        damage: DiceNotation::new(1, 6, 1),
    }
}

/// An animated skeleton.
pub fn skeleton() -> EnemyTemplate {
    EnemyTemplate {
        name: "Skeleton".to_string(),
        description: "a rattling skeleton in the rusted remains of a soldier's kit".to_string(),
        max_health: 13,
        defense: 13,
        dex_modifier: 2,
        attack_bonus: 4,
        damage: DiceNotation::new(1, 6, 2),
    }
}

/// A lumbering ogre. Dangerous for a fresh adventurer.
pub fn ogre() -> EnemyTemplate {
    EnemyTemplate {
        name: "Ogre".to_string(),
        description: "an ogre dragging a tree trunk it insists is a club".to_string(),
        max_health: 30,
        defense: 11,
        dex_modifier: -1,
        attack_bonus: 6,
        damage: DiceNotation::new(2, 8, 4),
    }
}

/// Every template, weakest first.
pub fn all() -> Vec<EnemyTemplate> {
    vec![goblin(), bandit(), wolf(), skeleton(), ogre()]
}

/// Look up a template by name (case-insensitive).
pub fn find(name: &str) -> Option<EnemyTemplate> {
    all()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goblin_stats() {
        let g = goblin();
        assert_eq!(g.max_health, 7);
        assert_eq!(g.defense, 13);
        assert_eq!(g.attack_bonus, 4);
        assert_eq!(g.damage.to_string(), "1d6+2");
    }

    #[test]
    fn all_templates_are_sane() {
        let templates = all();
        assert_eq!(templates.len(), 5);
        for t in &templates {
            assert!(t.max_health > 0, "{} has no health", t.name);
            assert!(t.defense >= 10);
            assert!(!t.description.is_empty());
        }
    }

    #[test]
    fn find_is_case_insensitive() {
        assert_eq!(find("WOLF").unwrap().name, "Wolf");
        assert_eq!(find(" ogre ").unwrap().max_health, 30);
        assert!(find("dragon").is_none());
    }

    #[test]
    fn display() {
        assert_eq!(
            goblin().to_string(),
            "Goblin (HP 7, defense 13, attack +4, damage 1d6+2)"
        );
    }
}
