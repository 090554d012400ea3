//! Error types for the mechanics engine.

/// Errors that can occur during mechanics operations.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// A dice expression did not match `<count>d<sides>[+|-<modifier>]`.
    #[error("invalid dice notation: '{0}'")]
    InvalidNotation(String),

    /// A health value would leave the `0 <= current <= max` range.
    #[error("health {current} exceeds maximum {max}")]
    InvalidHealth {
        /// The rejected current value.
        current: i64,
        /// The maximum at the time of the update.
        max: u32,
    },

    /// An action was attempted out of turn order.
    #[error("it is not {0}'s turn")]
    OutOfTurn(String),

    /// The encounter has already been resolved.
    #[error("the encounter is already over")]
    EncounterOver,

    /// A stored encounter does not describe a valid one-on-one fight.
    #[error("invalid encounter: {0}")]
    InvalidEncounter(String),

    /// An error occurred during combat resolution.
    #[error("combat error: {0}")]
    CombatError(String),
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
