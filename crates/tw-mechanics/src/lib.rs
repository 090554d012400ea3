//! Game mechanics engine for Taleweaver.
//!
//! Provides dice notation parsing and rolling (with advantage and
//! disadvantage), player character sheets with clamped health, a bestiary
//! of enemy templates, and a one-on-one combat encounter engine.
//!
//! All randomness flows through a caller-supplied [`RollSource`], so every
//! mechanical outcome can be reproduced from a seed or scripted in tests.

pub mod combat;
pub mod dice;
pub mod error;
pub mod sheet;

pub use combat::{
    AttackOutcome, CombatState, Combatant, Encounter, EncounterEnd, EncounterOutcome,
    EnemyTemplate, FleeOutcome, Side,
};
pub use dice::{D20Roll, DiceNotation, Die, RollMode, RollResult, RollSource, ScriptedRolls};
pub use error::{MechError, MechResult};
pub use sheet::{CharacterSheet, Health};
