//! The session aggregate and its state machine.
//!
//! A [`Session`] holds everything about one player's adventure. It is plain
//! data: it owns no RNG and no generator handles, so it serializes to a
//! single JSON record. Every mutating method either applies fully or
//! returns an error without touching the session.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tw_mechanics::{CharacterSheet, Encounter, EncounterOutcome, EnemyTemplate, Health, RollSource};

use crate::config::SessionConfig;
use crate::encounter::{self, CombatAction, CombatRound};
use crate::error::{StoryError, StoryResult};
use crate::history::{ConversationHistory, Speaker};
use crate::moments::{AdventureMoment, MomentKind, MomentLog};
use crate::pacing::{self, PacingPhase};
use crate::phase::GamePhase;
use crate::quest::tracker::{self, QuestProgress};
use crate::quest::{Quest, QuestStatus};
use crate::router::{GeneratorRole, RecentGenerators};

/// Why the story entered its denouement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosureReason {
    /// The turn cap was reached.
    TurnCap,
    /// A quest was completed late enough in the story.
    QuestCompleted,
    /// The player was defeated.
    PlayerDefeated,
}

impl std::fmt::Display for ClosureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TurnCap => write!(f, "the turn limit was reached"),
            Self::QuestCompleted => write!(f, "the quest was completed"),
            Self::PlayerDefeated => write!(f, "the hero fell"),
        }
    }
}

/// One player's adventure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    config: SessionConfig,
    phase: GamePhase,
    turn: u32,
    character: Option<CharacterSheet>,
    health: Health,
    active_quest: Option<Quest>,
    completed_quests: VecDeque<Quest>,
    pending_quests: Option<Vec<Quest>>,
    encounter: Option<Encounter>,
    moments: MomentLog,
    history: ConversationHistory,
    recent_generators: RecentGenerators,
    closure: Option<ClosureReason>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// Start a new session in character creation.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            phase: GamePhase::CharacterCreation,
            turn: 0,
            character: None,
            health: Health::new(CharacterSheet::default().max_health),
            active_quest: None,
            completed_quests: VecDeque::new(),
            pending_quests: None,
            encounter: None,
            moments: MomentLog::new(config.moment_limit),
            history: ConversationHistory::new(config.history_limit),
            recent_generators: RecentGenerators::new(config.recent_generator_window),
            closure: None,
            config,
        }
    }

    // -- queries ------------------------------------------------------------

    /// Unique session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The session's configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current gameplay phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Completed adventure turns.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// The turn being played right now (one past the completed count,
    /// capped at the turn limit).
    pub fn playing_turn(&self) -> u32 {
        self.turn.saturating_add(1).min(self.config.max_turns)
    }

    /// Narrative-arc phase, derived from the completed-turn counter.
    ///
    /// Quest completion is judged against [`Session::playing_turn`] instead,
    /// so a quest finished while `turn()` reads 24 is finished on turn 25 and
    /// closes the story.
    pub fn pacing(&self) -> PacingPhase {
        if self.phase.is_terminal() {
            return PacingPhase::Denouement;
        }
        pacing::phase_for_session(
            self.turn,
            self.active_quest.as_ref(),
            self.config.closure_floor_turn,
        )
    }

    /// Urgency tone hint in `[0, 1]`.
    pub fn urgency(&self) -> f64 {
        pacing::urgency(
            self.turn,
            self.config.max_turns,
            self.active_quest.as_ref(),
            self.pacing(),
        )
    }

    /// The player's health.
    pub fn health(&self) -> Health {
        self.health
    }

    /// The player's character sheet, once created.
    pub fn character(&self) -> Option<&CharacterSheet> {
        self.character.as_ref()
    }

    /// One-line description of the character.
    pub fn character_summary(&self) -> String {
        self.character
            .as_ref()
            .map_or_else(|| "an unnamed wanderer".to_string(), CharacterSheet::summary)
    }

    /// The quest in progress.
    pub fn active_quest(&self) -> Option<&Quest> {
        self.active_quest.as_ref()
    }

    /// Short quest status line, e.g. "The Lost Amulet (1/2 objectives)".
    pub fn quest_summary(&self) -> Option<String> {
        self.active_quest.as_ref().map(|q| {
            format!(
                "{} ({}/{} objectives)",
                q.title,
                q.completed_objectives(),
                q.objectives.len()
            )
        })
    }

    /// Finished, failed, or abandoned quests, oldest first.
    pub fn completed_quests(&self) -> impl Iterator<Item = &Quest> {
        self.completed_quests.iter()
    }

    /// Quest options awaiting a choice.
    pub fn pending_quests(&self) -> Option<&[Quest]> {
        self.pending_quests.as_deref()
    }

    /// The running encounter, while in combat.
    pub fn encounter(&self) -> Option<&Encounter> {
        self.encounter.as_ref()
    }

    /// Remembered moments.
    pub fn moments(&self) -> &MomentLog {
        &self.moments
    }

    /// Recent conversation.
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Recently invoked generators.
    pub fn recent_generators(&self) -> &RecentGenerators {
        &self.recent_generators
    }

    /// Why the story closed, once it has.
    pub fn closure(&self) -> Option<ClosureReason> {
        self.closure
    }

    /// Whether the story has reached its denouement.
    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    // -- phase --------------------------------------------------------------

    /// Move to another phase. Moving to the current phase is a no-op.
    ///
    /// Combat may only be entered with an encounter running and only left
    /// once it has been cleared.
    pub fn set_phase(&mut self, next: GamePhase) -> StoryResult<()> {
        if next == self.phase {
            return Ok(());
        }
        if !self.phase.can_transition_to(next) {
            return Err(StoryError::InvalidPhaseTransition {
                from: self.phase,
                to: next,
            });
        }
        if next == GamePhase::Combat && self.encounter.is_none() {
            return Err(StoryError::SessionInvariantViolation(
                "combat needs an encounter".to_string(),
            ));
        }
        if self.phase == GamePhase::Combat && self.encounter.is_some() {
            return Err(StoryError::SessionInvariantViolation(
                "the encounter is still running".to_string(),
            ));
        }
        tracing::info!(from = %self.phase, to = %next, "phase changed");
        self.phase = next;
        Ok(())
    }

    /// Enter the denouement unconditionally. Keeps the first reason.
    fn close_story(&mut self, reason: ClosureReason) {
        if self.phase.is_terminal() {
            return;
        }
        tracing::info!(%reason, turn = self.turn, "story closing");
        self.phase = GamePhase::Denouement;
        self.encounter = None;
        self.pending_quests = None;
        self.closure = Some(reason);
        self.history
            .push(Speaker::System, format!("The story closes: {reason}."), self.turn);
    }

    // -- turns & health -----------------------------------------------------

    /// Count one accepted action. Returns the new turn count.
    ///
    /// The counter never passes the cap; reaching it forces the denouement
    /// no matter what else is going on. Calling this again afterwards
    /// changes nothing.
    pub fn increment_turn(&mut self) -> u32 {
        if self.turn < self.config.max_turns {
            self.turn += 1;
        }
        if self.turn >= self.config.max_turns {
            self.close_story(ClosureReason::TurnCap);
        }
        self.turn
    }

    /// Change health by `delta`. Returns the new current health.
    ///
    /// Healing past the maximum is rejected; damage stops at zero, and
    /// dropping to zero ends the story. During combat health changes come
    /// from the encounter and this call is rejected.
    pub fn update_health(&mut self, delta: i32) -> StoryResult<u32> {
        if self.phase == GamePhase::Combat {
            return Err(StoryError::InvalidAction(
                "health changes during combat come from the encounter".to_string(),
            ));
        }
        let mut health = self.health;
        let current = health
            .adjust(delta)
            .map_err(|e| StoryError::SessionInvariantViolation(e.to_string()))?;
        self.health = health;
        if health.is_down() && self.character.is_some() {
            self.close_story(ClosureReason::PlayerDefeated);
        }
        Ok(current)
    }

    // -- character ----------------------------------------------------------

    /// Store the character, set health from it, and move to quest selection.
    pub fn create_character(&mut self, sheet: CharacterSheet) -> StoryResult<()> {
        if self.phase != GamePhase::CharacterCreation {
            return Err(StoryError::InvalidAction(
                "the character has already been created".to_string(),
            ));
        }
        if sheet.name.trim().is_empty() {
            return Err(StoryError::InvalidChoice("the character needs a name".to_string()));
        }
        self.set_phase(GamePhase::QuestSelection)?;
        self.health = Health::new(sheet.max_health);
        self.history.push(
            Speaker::System,
            format!("{} sets out.", sheet.name),
            self.turn,
        );
        self.character = Some(sheet);
        Ok(())
    }

    // -- quests -------------------------------------------------------------

    /// Store quest options for the player to choose from.
    ///
    /// Invalid candidates are dropped and at most `quest_option_count` are
    /// kept. Fails if no valid candidate remains.
    pub fn offer_quests(&mut self, options: Vec<Quest>) -> StoryResult<&[Quest]> {
        if self.phase != GamePhase::QuestSelection {
            return Err(StoryError::InvalidAction(format!(
                "quests are offered during quest selection, not {}",
                self.phase
            )));
        }
        let valid: Vec<Quest> = options
            .into_iter()
            .filter(|q| q.status == QuestStatus::Active && q.validate().is_ok())
            .take(self.config.quest_option_count)
            .collect();
        if valid.is_empty() {
            return Err(StoryError::InvalidChoice(
                "none of the offered quests is usable".to_string(),
            ));
        }
        Ok(self.pending_quests.insert(valid).as_slice())
    }

    /// Accept the pending option at `index` (zero-based) and set out.
    pub fn select_quest(&mut self, index: usize) -> StoryResult<&Quest> {
        let pending = self
            .pending_quests
            .as_ref()
            .ok_or_else(|| StoryError::InvalidAction("there are no quests to choose from".into()))?;
        let Some(quest) = pending.get(index).cloned() else {
            return Err(StoryError::InvalidChoice(format!(
                "pick a quest between 1 and {}",
                pending.len()
            )));
        };
        if !self.phase.can_transition_to(GamePhase::Exploration) {
            return Err(StoryError::InvalidPhaseTransition {
                from: self.phase,
                to: GamePhase::Exploration,
            });
        }
        self.set_quest(quest)?;
        self.pending_quests = None;
        self.set_phase(GamePhase::Exploration)?;
        self.active_quest.as_ref().ok_or(StoryError::NoActiveQuest)
    }

    /// Make `quest` the active quest.
    pub fn set_quest(&mut self, quest: Quest) -> StoryResult<()> {
        if self.phase.is_terminal() {
            return Err(StoryError::InvalidAction("the story has ended".to_string()));
        }
        if let Some(current) = &self.active_quest {
            return Err(StoryError::InvalidAction(format!(
                "already on a quest: {}",
                current.title
            )));
        }
        if quest.status != QuestStatus::Active {
            return Err(StoryError::InvalidChoice(format!(
                "quest \"{}\" is {}",
                quest.title, quest.status
            )));
        }
        quest.validate().map_err(StoryError::InvalidChoice)?;
        tracing::info!(quest = %quest.title, "quest accepted");
        self.history.push(
            Speaker::System,
            format!("Quest accepted: {}", quest.title),
            self.turn,
        );
        self.active_quest = Some(quest);
        Ok(())
    }

    /// Check this turn's texts against the active quest's objectives.
    ///
    /// If the quest completes it is retired, and the story may close.
    pub fn advance_quest(&mut self, action: &str, narrative: &str) -> StoryResult<QuestProgress> {
        if self.is_over() {
            return Err(StoryError::InvalidAction("the story has ended".to_string()));
        }
        let quest = self.active_quest.as_mut().ok_or(StoryError::NoActiveQuest)?;
        let progress = tracker::advance(quest, action, narrative);
        if progress.quest_completed {
            self.finish_quest();
        }
        Ok(progress)
    }

    /// Mark every objective of the active quest done and retire it.
    pub fn complete_quest(&mut self) -> StoryResult<()> {
        let quest = self.active_quest.as_mut().ok_or(StoryError::NoActiveQuest)?;
        for obj in &mut quest.objectives {
            obj.completed = true;
            if let Some(target) = obj.target_count {
                obj.current_count = target;
            }
        }
        quest.status = QuestStatus::Completed;
        self.finish_quest();
        Ok(())
    }

    /// Give up on the active quest.
    pub fn abandon_quest(&mut self) -> StoryResult<()> {
        self.retire_quest(QuestStatus::Abandoned)
    }

    /// Mark the active quest as failed.
    pub fn fail_quest(&mut self) -> StoryResult<()> {
        self.retire_quest(QuestStatus::Failed)
    }

    fn retire_quest(&mut self, status: QuestStatus) -> StoryResult<()> {
        if self.phase == GamePhase::Combat {
            return Err(StoryError::InvalidAction(
                "finish the fight first".to_string(),
            ));
        }
        let mut quest = self.active_quest.take().ok_or(StoryError::NoActiveQuest)?;
        quest.status = status;
        tracing::info!(quest = %quest.title, %status, "quest retired");
        self.history.push(
            Speaker::System,
            format!("Quest {status}: {}", quest.title),
            self.turn,
        );
        self.archive_quest(quest);
        if self.phase == GamePhase::Exploration {
            self.phase = GamePhase::QuestSelection;
        }
        Ok(())
    }

    /// Retire a quest that has just been completed.
    fn finish_quest(&mut self) {
        let Some(quest) = self.active_quest.take() else {
            return;
        };
        let turn = self.playing_turn();
        self.record_moment(
            MomentKind::QuestComplete,
            format!("Completed \"{}\" for {}", quest.title, quest.giver),
            MomentKind::QuestComplete.default_significance(),
        );
        self.history.push(
            Speaker::System,
            format!("Quest complete: {}", quest.title),
            turn,
        );
        let closes = pacing::phase_for_session(turn, Some(&quest), self.config.closure_floor_turn)
            == PacingPhase::Denouement;
        self.archive_quest(quest);

        if closes {
            self.close_story(ClosureReason::QuestCompleted);
        } else if self.phase == GamePhase::Exploration {
            tracing::info!(from = %self.phase, to = %GamePhase::QuestSelection, "phase changed");
            self.phase = GamePhase::QuestSelection;
        }
    }

    fn archive_quest(&mut self, quest: Quest) {
        self.completed_quests.push_back(quest);
        while self.completed_quests.len() > self.config.completed_quest_limit.max(1) {
            self.completed_quests.pop_front();
        }
    }

    // -- combat -------------------------------------------------------------

    /// Start a fight against `enemy` and play any enemy turns that come
    /// before the player's first move.
    pub fn start_combat<R: RollSource + ?Sized>(
        &mut self,
        enemy: &EnemyTemplate,
        source: &mut R,
    ) -> StoryResult<CombatRound> {
        if self.phase == GamePhase::Combat {
            return Err(StoryError::InvalidAction("already in combat".to_string()));
        }
        if !self.phase.can_transition_to(GamePhase::Combat) {
            return Err(StoryError::InvalidPhaseTransition {
                from: self.phase,
                to: GamePhase::Combat,
            });
        }
        let sheet = self.character.clone().ok_or_else(|| {
            StoryError::SessionInvariantViolation("no character to fight with".to_string())
        })?;

        let mut fight = Encounter::start(&sheet, self.health, enemy, source)
            .with_log_limit(self.config.combat_log_limit);
        let opening = encounter::resolve_opening(&mut fight, source)?;

        tracing::info!(enemy = %enemy.name, "encounter started");
        self.record_moment(
            MomentKind::Encounter,
            format!("{} faced {}", sheet.name, enemy.description),
            MomentKind::Encounter.default_significance(),
        );
        self.encounter = Some(fight);
        self.set_phase(GamePhase::Combat)?;
        self.settle_encounter();
        Ok(opening)
    }

    /// Take the player's combat action and the enemy's reply.
    pub fn combat_action<R: RollSource + ?Sized>(
        &mut self,
        action: CombatAction,
        source: &mut R,
    ) -> StoryResult<CombatRound> {
        if self.phase != GamePhase::Combat {
            return Err(StoryError::InvalidAction(format!(
                "cannot {action} outside of combat"
            )));
        }
        let mut fight = self.encounter.clone().ok_or(StoryError::NoActiveEncounter)?;
        let round = encounter::resolve_player_action(&mut fight, action, source)?;
        self.encounter = Some(fight);
        self.settle_encounter();
        Ok(round)
    }

    /// Sync health from the encounter and wrap it up if it is over.
    fn settle_encounter(&mut self) {
        let Some(fight) = &self.encounter else {
            return;
        };
        self.health = fight.player().health;
        let Some(outcome) = fight.outcome() else {
            return;
        };
        let summary = fight.summary();
        tracing::info!(%outcome, "encounter ended");
        self.encounter = None;

        match outcome {
            EncounterOutcome::Victory => {
                self.record_moment(MomentKind::CombatVictory, summary, 0.7);
                self.phase = GamePhase::Exploration;
            }
            EncounterOutcome::Fled => {
                self.record_moment(MomentKind::Escape, summary, 0.5);
                self.phase = GamePhase::Exploration;
            }
            EncounterOutcome::Defeat => {
                self.record_moment(MomentKind::CombatDefeat, summary, 1.0);
                self.close_story(ClosureReason::PlayerDefeated);
            }
        }
    }

    // -- memory -------------------------------------------------------------

    /// Record a moment stamped with the turn in progress. Returns false if
    /// it ranked too low to keep.
    pub fn record_moment(
        &mut self,
        kind: MomentKind,
        summary: impl Into<String>,
        significance: f64,
    ) -> bool {
        let moment = AdventureMoment::new(self.playing_turn(), kind, summary, significance);
        tracing::debug!(%kind, "moment recorded");
        self.moments.push(moment)
    }

    /// Append a line to the conversation history.
    pub fn append_history(&mut self, speaker: Speaker, text: impl Into<String>) {
        let turn = self.playing_turn();
        self.history.push(speaker, text, turn);
    }

    /// Remember which generators ran.
    pub fn record_generators(&mut self, roles: &[GeneratorRole]) {
        self.recent_generators.record_all(roles);
    }

    // -- persistence --------------------------------------------------------

    /// Serialize to a JSON record.
    pub fn to_json(&self) -> StoryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore from a JSON record, checking cross-field invariants.
    pub fn from_json(json: &str) -> StoryResult<Self> {
        let session: Self = serde_json::from_str(json)?;
        session.check_invariants()?;
        Ok(session)
    }

    fn check_invariants(&self) -> StoryResult<()> {
        let violation = |msg: &str| Err(StoryError::SessionInvariantViolation(msg.to_string()));
        if self.turn > self.config.max_turns {
            return violation("turn counter is past the turn limit");
        }
        if (self.phase == GamePhase::Combat) != self.encounter.is_some() {
            return violation("an encounter must exist exactly while in combat");
        }
        if self.phase != GamePhase::CharacterCreation && self.character.is_none() {
            return violation("the session has left character creation without a character");
        }
        if self.active_quest.as_ref().is_some_and(|q| q.status != QuestStatus::Active) {
            return violation("the active quest is not active");
        }
        Ok(())
    }
}
