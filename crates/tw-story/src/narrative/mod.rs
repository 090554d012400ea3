//! Narrative generator ports.
//!
//! The engine never talks to a language model directly. It asks a
//! [`NarrativeGenerator`] for text per role and a [`QuestOptionGenerator`]
//! for quest candidates; both are async and may fail, and the engine
//! recovers from every failure locally.

pub mod templates;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::moments::MomentKind;
use crate::pacing::PacingPhase;
use crate::quest::Quest;
use crate::router::{GeneratorRole, RouteMode};

pub use templates::TemplateNarrator;

/// Why a generator call produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationFailure {
    /// The call did not finish in time.
    #[error("generator timed out")]
    Timeout,
    /// The generator answered with something that could not be used.
    #[error("malformed generator output: {0}")]
    Malformed(String),
    /// The backing service reported an error.
    #[error("generator unavailable: {0}")]
    Upstream(String),
}

/// One call to a narrative generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Which voice is being asked to speak.
    pub role: GeneratorRole,
    /// How the turn was routed.
    pub mode: RouteMode,
    /// The player's action, verbatim.
    pub action: String,
    /// Rendered context: character, quest, recent history and any earlier
    /// output from this turn.
    pub context: String,
    /// Facts the text must stay consistent with (dice results, combat
    /// events, moments for an epilogue).
    pub facts: Vec<String>,
    /// Tone hint.
    pub pacing: PacingPhase,
    /// Tone hint in `[0, 1]`.
    pub urgency: f64,
}

/// A generator asking for a moment to be remembered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentSignal {
    /// Category.
    pub kind: MomentKind,
    /// One-line summary.
    pub summary: String,
    /// Weight in `[0, 1]`.
    pub significance: f64,
}

impl MomentSignal {
    /// A signal using the kind's default significance.
    pub fn new(kind: MomentKind, summary: impl Into<String>) -> Self {
        Self {
            kind,
            summary: summary.into(),
            significance: kind.default_significance(),
        }
    }
}

/// What a generator returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOutput {
    /// Text shown to the player.
    pub text: String,
    /// Optional moment to record.
    pub moment: Option<MomentSignal>,
    /// Suggested next actions.
    pub choices: Vec<String>,
}

impl GeneratorOutput {
    /// Plain text output.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attach a moment signal.
    pub fn with_moment(mut self, moment: MomentSignal) -> Self {
        self.moment = Some(moment);
        self
    }

    /// Attach follow-on choices.
    pub fn with_choices(mut self, choices: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}

/// Produces narration for one generator role.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Generate text for a request.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratorOutput, GenerationFailure>;
}

/// Produces quest candidates for the quest board.
#[async_trait]
pub trait QuestOptionGenerator: Send + Sync {
    /// Suggest quests suited to the character and recent conversation.
    async fn generate_options(
        &self,
        character_summary: &str,
        history: &str,
    ) -> Result<Vec<Quest>, GenerationFailure>;
}
