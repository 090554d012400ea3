//! Error types for the story engine.

use thiserror::Error;

use crate::phase::GamePhase;

/// Result type for story operations.
pub type StoryResult<T> = Result<T, StoryError>;

/// Errors that can occur while driving a session.
///
/// Every error is raised before the session is mutated, so a rejected call
/// leaves the session exactly as it was.
#[derive(Debug, Error)]
pub enum StoryError {
    /// The requested phase change is not allowed from the current phase.
    #[error("cannot move from {from} to {to}")]
    InvalidPhaseTransition {
        /// Phase the session is in.
        from: GamePhase,
        /// Phase that was requested.
        to: GamePhase,
    },

    /// The change would break a session invariant (e.g. health above max).
    #[error("session invariant violated: {0}")]
    SessionInvariantViolation(String),

    /// The action does not make sense in the current phase.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// A selection or argument was out of range.
    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    /// The operation needs an active quest.
    #[error("no active quest")]
    NoActiveQuest,

    /// The operation needs an active combat encounter.
    #[error("no active encounter")]
    NoActiveEncounter,

    /// Mechanics engine error.
    #[error("{0}")]
    Mechanics(#[from] tw_mechanics::MechError),

    /// The session record could not be encoded or decoded.
    #[error("session record error: {0}")]
    Serialization(#[from] serde_json::Error),
}
