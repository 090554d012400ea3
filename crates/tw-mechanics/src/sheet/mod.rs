//! Player character sheets.
//!
//! The sheet holds the handful of numbers combat needs: maximum health,
//! defense, dexterity modifier (initiative and fleeing), attack bonus, and
//! a weapon damage expression.

pub mod health;

pub use health::Health;

use serde::{Deserialize, Serialize};

use crate::dice::DiceNotation;

/// A player character's mechanical profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    /// Character name.
    pub name: String,
    /// One-line concept, e.g. "a disgraced knight seeking redemption".
    pub concept: String,
    /// Maximum hit points.
    pub max_health: u32,
    /// Armor-class-style defense value; attacks hit on `d20 + bonus >= defense`.
    pub defense: u32,
    /// Dexterity modifier applied to initiative and flee checks.
    pub dex_modifier: i32,
    /// Bonus added to attack rolls.
    pub attack_bonus: i32,
    /// Weapon damage.
    pub damage: DiceNotation,
}

impl CharacterSheet {
    /// A sheet with default adventurer statistics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concept: "a wandering adventurer".to_string(),
            max_health: 20,
            defense: 13,
            dex_modifier: 1,
            attack_bonus: 4,
            damage: DiceNotation::new(1, 8, 2),
        }
    }

    /// Set the concept line.
    pub fn with_concept(mut self, concept: impl Into<String>) -> Self {
        self.concept = concept.into();
        self
    }

    /// Set maximum health (at least 1).
    pub fn with_max_health(mut self, max: u32) -> Self {
        self.max_health = max.max(1);
        self
    }

    /// Set defense.
    pub fn with_defense(mut self, defense: u32) -> Self {
        self.defense = defense;
        self
    }

    /// Set the dexterity modifier.
    pub fn with_dex_modifier(mut self, modifier: i32) -> Self {
        self.dex_modifier = modifier;
        self
    }

    /// Set the attack bonus.
    pub fn with_attack_bonus(mut self, bonus: i32) -> Self {
        self.attack_bonus = bonus;
        self
    }

    /// Set the weapon damage.
    pub fn with_damage(mut self, damage: DiceNotation) -> Self {
        self.damage = damage;
        self
    }

    /// A one-line summary for narrative context.
    pub fn summary(&self) -> String {
        format!(
            "{}, {} (HP {}, defense {}, attack {}, damage {})",
            self.name,
            self.concept,
            self.max_health,
            self.defense,
            signed(self.attack_bonus),
            self.damage
        )
    }
}

/// Format a modifier with an explicit sign: `+2`, `-1`, `+0`.
pub fn signed(value: i32) -> String {
    if value < 0 {
        value.to_string()
    } else {
        format!("+{value}")
    }
}

impl Default for CharacterSheet {
    fn default() -> Self {
        Self::new("Wanderer")
    }
}
