//! Story engine for Taleweaver.
//!
//! Turns free-text player actions into an adventure: a session state
//! machine (character creation, quest selection, exploration, combat,
//! denouement), a pacing model over a capped number of turns, keyword-based
//! quest tracking, a router that decides which narrative voices speak each
//! turn, and an orchestrator that calls them in order.
//!
//! Text generation sits behind the async [`NarrativeGenerator`] and
//! [`QuestOptionGenerator`] ports. [`TemplateNarrator`] implements both
//! offline. [`GameMaster`] ties it all together behind
//! [`GameMaster::take_turn`].

pub mod config;
pub mod encounter;
pub mod engine;
pub mod error;
pub mod history;
pub mod moments;
pub mod narrative;
pub mod orchestrator;
pub mod pacing;
pub mod phase;
pub mod quest;
pub mod router;
pub mod session;

pub use config::SessionConfig;
pub use encounter::{CombatAction, CombatRound};
pub use engine::{EncounterSnapshot, GameMaster, QuestSnapshot, TurnResult};
pub use error::{StoryError, StoryResult};
pub use history::{ConversationHistory, HistoryEntry, Speaker};
pub use moments::{AdventureMoment, MomentKind, MomentLog};
pub use narrative::{
    GenerationFailure, GenerationRequest, GeneratorOutput, MomentSignal, NarrativeGenerator,
    QuestOptionGenerator, TemplateNarrator,
};
pub use orchestrator::{TurnContext, TurnNarrative, TurnOrchestrator};
pub use pacing::PacingPhase;
pub use phase::GamePhase;
pub use quest::{Objective, Quest, QuestStatus};
pub use router::{GeneratorRole, RouteMode, RoutingDecision};
pub use session::{ClosureReason, Session};
