//! The game master: one entry point that plays a full turn.
//!
//! `GameMaster` owns a [`Session`], a roll source, and the generator ports.
//! Every turn runs against a draft copy of the session that replaces the
//! real one only once the whole [`TurnResult`] has been built. A rejected
//! action, or a turn future dropped halfway, leaves the session untouched.
//! Dice already drawn stay drawn.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use tw_mechanics::combat::bestiary;
use tw_mechanics::dice::roll_d20;
use tw_mechanics::sheet::signed;
use tw_mechanics::{
    CharacterSheet, Encounter, EncounterOutcome, EnemyTemplate, Health, RollMode, RollSource,
};

use crate::encounter::{self, CombatAction};
use crate::error::{StoryError, StoryResult};
use crate::history::Speaker;
use crate::narrative::{NarrativeGenerator, QuestOptionGenerator};
use crate::orchestrator::{MAX_CHOICES, TurnContext, TurnNarrative, TurnOrchestrator};
use crate::pacing::PacingPhase;
use crate::phase::GamePhase;
use crate::quest::{Quest, QuestStatus, board};
use crate::router::{self, GeneratorRole, RouteMode, RoutingDecision, WildcardOdds};
use crate::session::{ClosureReason, Session};

/// Difficulty of the exploration ability check.
pub const ABILITY_DIFFICULTY: i32 = 12;

/// History lines shown to generators.
const CONTEXT_HISTORY: usize = 6;

/// Moments handed to the epilogue.
const EPILOGUE_MOMENTS: usize = 8;

/// A snapshot of the active quest for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestSnapshot {
    /// Quest title.
    pub title: String,
    /// One checklist line per objective.
    pub objectives: Vec<String>,
    /// Fraction of objectives done.
    pub progress: f64,
    /// Current status.
    pub status: QuestStatus,
}

impl From<&Quest> for QuestSnapshot {
    fn from(quest: &Quest) -> Self {
        Self {
            title: quest.title.clone(),
            objectives: quest.objectives.iter().map(|o| o.display_line()).collect(),
            progress: quest.progress(),
            status: quest.status,
        }
    }
}

/// A snapshot of the running encounter for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSnapshot {
    /// Enemy name.
    pub enemy: String,
    /// Enemy health.
    pub enemy_health: Health,
    /// Player health.
    pub player_health: Health,
    /// Current round.
    pub round: u32,
    /// Whether the player is braced.
    pub player_defending: bool,
}

impl From<&Encounter> for EncounterSnapshot {
    fn from(encounter: &Encounter) -> Self {
        Self {
            enemy: encounter.enemy().name.clone(),
            enemy_health: encounter.enemy().health,
            player_health: encounter.player().health,
            round: encounter.round(),
            player_defending: encounter.is_player_defending(),
        }
    }
}

/// Everything a front end needs after one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Completed adventure turns.
    pub turn: u32,
    /// Text to show the player.
    pub narrative: String,
    /// Suggested next actions.
    pub choices: Vec<String>,
    /// Gameplay phase after the turn.
    pub phase: GamePhase,
    /// Narrative-arc phase after the turn.
    pub pacing: PacingPhase,
    /// Tone hint in `[0, 1]`.
    pub urgency: f64,
    /// Player health.
    pub health: Health,
    /// Active quest, if any.
    pub quest: Option<QuestSnapshot>,
    /// Running encounter, if any.
    pub encounter: Option<EncounterSnapshot>,
    /// Generators invoked this turn, in order.
    pub generators: Vec<GeneratorRole>,
    /// Why the story closed, once it has.
    pub closure: Option<ClosureReason>,
    /// False when the input only listed options and no turn was spent.
    pub accepted: bool,
}

/// Output of one phase handler, before the shared wrap-up.
#[derive(Default)]
struct TurnStep {
    text: String,
    notices: Vec<String>,
    choices: Vec<String>,
    generators: Vec<GeneratorRole>,
    accepted: bool,
}

impl TurnStep {
    fn from_narrative(narrative: TurnNarrative) -> Self {
        Self {
            text: narrative.text(),
            generators: narrative.invoked(),
            choices: narrative.choices,
            accepted: true,
            ..Self::default()
        }
    }
}

/// Drives a session one player action at a time.
pub struct GameMaster {
    session: Session,
    rolls: Box<dyn RollSource + Send>,
    orchestrator: TurnOrchestrator,
    quests: Arc<dyn QuestOptionGenerator>,
}

impl std::fmt::Debug for GameMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameMaster")
            .field("session", &self.session.id())
            .field("phase", &self.session.phase())
            .field("turn", &self.session.turn())
            .finish_non_exhaustive()
    }
}

impl GameMaster {
    /// Create a game master over an existing session.
    pub fn new(
        session: Session,
        rolls: Box<dyn RollSource + Send>,
        narrator: Arc<dyn NarrativeGenerator>,
        quests: Arc<dyn QuestOptionGenerator>,
    ) -> Self {
        Self {
            session,
            rolls,
            orchestrator: TurnOrchestrator::new(narrator),
            quests,
        }
    }

    /// Create a game master whose dice come from the session's configured seed.
    pub fn seeded(
        session: Session,
        narrator: Arc<dyn NarrativeGenerator>,
        quests: Arc<dyn QuestOptionGenerator>,
    ) -> Self {
        let rng = StdRng::seed_from_u64(session.config().seed);
        Self::new(session, Box::new(rng), narrator, quests)
    }

    /// The session being played.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Give the session back, e.g. to save it.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Create the player character.
    pub fn create_character(&mut self, sheet: CharacterSheet) -> StoryResult<()> {
        self.session.create_character(sheet)
    }

    /// Make sure quest options are pending and return them.
    pub async fn open_quest_board(&mut self) -> StoryResult<&[Quest]> {
        let mut draft = self.session.clone();
        self.ensure_quest_options(&mut draft).await?;
        self.session = draft;
        self.session
            .pending_quests()
            .ok_or_else(|| StoryError::InvalidAction("no quests are on offer".to_string()))
    }

    /// Play one player action.
    pub async fn take_turn(&mut self, action: &str) -> StoryResult<TurnResult> {
        let action = action.trim();
        if action.is_empty() {
            return Err(StoryError::InvalidAction("say what you do".to_string()));
        }

        let mut draft = self.session.clone();
        let start_phase = draft.phase();
        let mut step = match start_phase {
            GamePhase::CharacterCreation => {
                return Err(StoryError::InvalidAction(
                    "create a character first".to_string(),
                ));
            }
            GamePhase::Denouement => {
                return Err(StoryError::InvalidAction("the story is over".to_string()));
            }
            GamePhase::QuestSelection => self.quest_selection_turn(&mut draft, action).await?,
            GamePhase::Exploration => self.exploration_turn(&mut draft, action).await?,
            GamePhase::Combat => self.combat_turn(&mut draft, action).await?,
        };

        if step.accepted {
            draft.append_history(Speaker::Player, action);
            draft.append_history(Speaker::Narrator, step.text.clone());
            draft.increment_turn();
        }

        if draft.phase() == GamePhase::QuestSelection && start_phase != GamePhase::QuestSelection
        {
            let options = self.ensure_quest_options(&mut draft).await?;
            step.notices
                .push(format!("New quests are on the board:\n{}", list_options(options)));
        }

        if draft.is_over() {
            let epilogue = self.epilogue(&draft, action).await;
            draft.record_generators(&epilogue.invoked());
            draft.append_history(Speaker::Narrator, epilogue.text());
            step.generators.extend(epilogue.invoked());
            step.notices.push(epilogue.text());
        }

        let choices = if draft.phase() != start_phase || step.choices.is_empty() {
            default_choices(&draft)
        } else {
            step.choices.into_iter().take(MAX_CHOICES).collect()
        };

        let mut narrative = step.text;
        for notice in step.notices {
            if !narrative.is_empty() {
                narrative.push_str("\n\n");
            }
            narrative.push_str(&notice);
        }

        let result = TurnResult {
            turn: draft.turn(),
            narrative,
            choices,
            phase: draft.phase(),
            pacing: draft.pacing(),
            urgency: draft.urgency(),
            health: draft.health(),
            quest: draft.active_quest().map(QuestSnapshot::from),
            encounter: draft.encounter().map(EncounterSnapshot::from),
            generators: step.generators,
            closure: draft.closure(),
            accepted: step.accepted,
        };
        tracing::debug!(
            turn = result.turn,
            phase = %result.phase,
            accepted = result.accepted,
            "turn committed"
        );
        self.session = draft;
        Ok(result)
    }

    async fn ensure_quest_options<'a>(&self, draft: &'a mut Session) -> StoryResult<&'a [Quest]> {
        if draft.pending_quests().is_none() {
            let history = draft.history().transcript(CONTEXT_HISTORY);
            let generated = match self
                .quests
                .generate_options(&draft.character_summary(), &history)
                .await
            {
                Ok(options) => options,
                Err(err) => {
                    tracing::warn!(error = %err, "quest generator failed, using the quest board");
                    Vec::new()
                }
            };
            if draft.offer_quests(generated).is_err() {
                let offset = draft.completed_quests().count();
                let count = draft.config().quest_option_count;
                draft.offer_quests(board::options(offset, count))?;
            }
        }
        draft
            .pending_quests()
            .ok_or_else(|| StoryError::InvalidAction("no quests are on offer".to_string()))
    }

    async fn quest_selection_turn(
        &mut self,
        draft: &mut Session,
        action: &str,
    ) -> StoryResult<TurnStep> {
        let options = self.ensure_quest_options(draft).await?;
        let Some(number) = leading_number(action) else {
            return Ok(TurnStep {
                text: format!("Choose a quest by number:\n{}", list_options(options)),
                ..TurnStep::default()
            });
        };
        if number == 0 || number > options.len() {
            return Err(StoryError::InvalidChoice(format!(
                "pick a quest between 1 and {}",
                options.len()
            )));
        }
        let quest = draft.select_quest(number - 1)?;
        Ok(TurnStep {
            text: format!("You accept the quest.\n{}", quest.describe()),
            accepted: true,
            ..TurnStep::default()
        })
    }

    async fn exploration_turn(
        &mut self,
        draft: &mut Session,
        action: &str,
    ) -> StoryResult<TurnStep> {
        if encounter::is_encounter_trigger(action) {
            let enemy = pick_enemy(draft.pacing(), &mut *self.rolls);
            let opening = draft.start_combat(&enemy, &mut *self.rolls)?;
            let mut facts = vec![format!("You face {}.", enemy.description)];
            facts.extend(opening.events);
            facts.extend(opening.summary);
            let decision = self.route(draft, action, RouteMode::Combat, 1.0);
            let narrative = self.narrate(draft, action, &decision, facts).await;
            return Ok(self.absorb(draft, narrative));
        }

        let mode = RouteMode::detect(draft.phase(), action);
        let draw = self.rolls.chance();
        let decision = self.route(draft, action, mode, draw);
        let mut facts = Vec::new();
        if decision.generators.contains(&GeneratorRole::Mechanics) {
            facts.push(ability_check(draft, &mut *self.rolls));
        }
        let narrative = self.narrate(draft, action, &decision, facts).await;
        let text = narrative.text();
        let mut step = self.absorb(draft, narrative);

        step.notices.extend(quest_notices(draft, action, &text)?);
        Ok(step)
    }

    async fn combat_turn(&mut self, draft: &mut Session, action: &str) -> StoryResult<TurnStep> {
        let command = CombatAction::parse(action).ok_or_else(|| {
            StoryError::InvalidAction("in combat you can attack, defend, or flee".to_string())
        })?;
        let round = draft.combat_action(command, &mut *self.rolls)?;

        let mut facts = round.events.clone();
        facts.extend(round.summary.clone());
        let decision = self.route(draft, action, RouteMode::Combat, 1.0);
        let narrative = self.narrate(draft, action, &decision, facts).await;
        let mut step = self.absorb(draft, narrative);

        if round.outcome == Some(EncounterOutcome::Victory) {
            let recap = round.summary.unwrap_or_default();
            step.notices.extend(quest_notices(draft, action, &recap)?);
        }
        Ok(step)
    }

    fn route(&self, draft: &Session, action: &str, mode: RouteMode, draw: f64) -> RoutingDecision {
        let odds = WildcardOdds::from_config(draft.config());
        router::route(action, mode, draft.recent_generators(), &odds, draw)
    }

    async fn narrate(
        &self,
        draft: &Session,
        action: &str,
        decision: &RoutingDecision,
        facts: Vec<String>,
    ) -> TurnNarrative {
        let context = turn_context(draft, facts);
        self.orchestrator.execute(action, decision, &context).await
    }

    /// Store what the generators produced and turn it into a step.
    fn absorb(&self, draft: &mut Session, narrative: TurnNarrative) -> TurnStep {
        for moment in &narrative.moments {
            draft.record_moment(moment.kind, moment.summary.clone(), moment.significance);
        }
        draft.record_generators(&narrative.invoked());
        TurnStep::from_narrative(narrative)
    }

    async fn epilogue(&self, draft: &Session, action: &str) -> TurnNarrative {
        let mut facts: Vec<String> = draft
            .moments()
            .top(EPILOGUE_MOMENTS)
            .iter()
            .map(ToString::to_string)
            .collect();
        if let Some(reason) = draft.closure() {
            facts.insert(0, format!("The story ends because {reason}."));
        }
        let decision = RoutingDecision::single(RouteMode::Exploration, GeneratorRole::Epilogue);
        tracing::info!(moments = facts.len(), "writing the epilogue");
        self.narrate(draft, action, &decision, facts).await
    }
}

fn turn_context(session: &Session, facts: Vec<String>) -> TurnContext {
    TurnContext {
        turn: session.playing_turn(),
        character: session.character_summary(),
        quest: session.quest_summary(),
        history: session.history().transcript(CONTEXT_HISTORY),
        facts,
        pacing: session.pacing(),
        urgency: session.urgency(),
    }
}

/// Advance the active quest and describe what changed.
fn quest_notices(session: &mut Session, action: &str, narrative: &str) -> StoryResult<Vec<String>> {
    let Some(quest) = session.active_quest().cloned() else {
        return Ok(Vec::new());
    };
    let progress = session.advance_quest(action, narrative)?;
    let mut notices: Vec<String> = quest
        .objectives
        .iter()
        .filter(|o| progress.newly_completed.contains(&o.id))
        .map(|o| format!("Objective complete: {}", o.description))
        .collect();
    if progress.quest_completed {
        notices.push(format!("Quest complete: {}!", quest.title));
    }
    Ok(notices)
}

/// Choose an enemy. The ogre only shows up once the story reaches its climax.
pub fn pick_enemy<R: RollSource + ?Sized>(pacing: PacingPhase, source: &mut R) -> EnemyTemplate {
    let mut roster = bestiary::all();
    if pacing < PacingPhase::Climax {
        roster.retain(|e| e.name != "Ogre");
    }
    let index = source.pick(roster.len());
    roster.into_iter().nth(index).unwrap_or_else(bestiary::goblin)
}

/// Roll `d20 + dex` against [`ABILITY_DIFFICULTY`] and describe the result.
fn ability_check<R: RollSource + ?Sized>(session: &Session, source: &mut R) -> String {
    let dex = session.character().map_or(0, |c| c.dex_modifier);
    let roll = roll_d20(RollMode::Normal, source);
    let total = roll.kept as i32 + dex;
    let verdict = if total >= ABILITY_DIFFICULTY {
        "success"
    } else {
        "failure"
    };
    format!(
        "Ability check: {roll} {} = {total} vs {ABILITY_DIFFICULTY}, {verdict}.",
        signed(dex)
    )
}

fn leading_number(action: &str) -> Option<usize> {
    let digits: String = action.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn list_options(options: &[Quest]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {} ({}): {}", i + 1, q.title, q.giver, q.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn default_choices(session: &Session) -> Vec<String> {
    match session.phase() {
        GamePhase::QuestSelection => session
            .pending_quests()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q.title))
            .collect(),
        GamePhase::Exploration => ["Look around", "Search the area", "Talk to someone", "Press onward"]
            .map(String::from)
            .to_vec(),
        GamePhase::Combat => ["Attack", "Defend", "Flee"].map(String::from).to_vec(),
        GamePhase::CharacterCreation | GamePhase::Denouement => Vec::new(),
    }
}
