//! Combat encounter state machine.
//!
//! An [`Encounter`] pits the player against a single enemy. It tracks both
//! combatants, the initiative order, the round counter, the player's
//! defending stance, and a bounded log used to summarize the fight.
//!
//! States move `Initiative -> PlayerTurn <-> EnemyTurn -> Resolution`.
//! The end check runs after every mutating action, so an encounter enters
//! `Resolution` the instant a combatant drops or the player escapes.

pub mod action;
pub mod bestiary;

pub use action::{AttackOutcome, FLEE_DIFFICULTY, FleeOutcome};
pub use bestiary::EnemyTemplate;

use serde::{Deserialize, Serialize};

use crate::dice::{DiceNotation, RollSource};
use crate::error::{MechError, MechResult};
use crate::sheet::{CharacterSheet, Health, signed};

/// Default number of log lines kept per encounter.
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// Which side of the fight a combatant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The player character.
    Player,
    /// The opposing enemy.
    Enemy,
}

impl Side {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Enemy => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Enemy => write!(f, "enemy"),
        }
    }
}

/// A participant in an encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Which side this combatant fights for.
    pub side: Side,
    /// Display name.
    pub name: String,
    /// Current and maximum hit points.
    pub health: Health,
    /// Attacks hit on `d20 + bonus >= defense`.
    pub defense: u32,
    /// Dexterity modifier (initiative, fleeing).
    pub dex_modifier: i32,
    /// Attack roll bonus.
    pub attack_bonus: i32,
    /// Damage dealt on a hit.
    pub damage: DiceNotation,
    /// Initiative score (higher acts first).
    pub initiative: i32,
    /// False once health reaches zero.
    pub alive: bool,
    /// Attacks this combatant has made.
    pub attacks_made: u32,
    /// Attacks that hit.
    pub attacks_landed: u32,
}

impl Combatant {
    fn from_sheet(sheet: &CharacterSheet, health: Health) -> Self {
        Self {
            side: Side::Player,
            name: sheet.name.clone(),
            health,
            defense: sheet.defense,
            dex_modifier: sheet.dex_modifier,
            attack_bonus: sheet.attack_bonus,
            damage: sheet.damage,
            initiative: 0,
            alive: !health.is_down(),
            attacks_made: 0,
            attacks_landed: 0,
        }
    }

    fn from_template(template: &EnemyTemplate) -> Self {
        Self {
            side: Side::Enemy,
            name: template.name.clone(),
            health: Health::new(template.max_health),
            defense: template.defense,
            dex_modifier: template.dex_modifier,
            attack_bonus: template.attack_bonus,
            damage: template.damage,
            initiative: 0,
            alive: true,
            attacks_made: 0,
            attacks_landed: 0,
        }
    }
}

/// Where the encounter is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatState {
    /// Rolling initiative.
    Initiative,
    /// Waiting for the player to act.
    PlayerTurn,
    /// The enemy acts next.
    EnemyTurn,
    /// The fight is over.
    Resolution,
}

/// How an encounter ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterOutcome {
    /// The enemy dropped to zero health.
    Victory,
    /// The player dropped to zero health.
    Defeat,
    /// The player escaped.
    Fled,
}

impl std::fmt::Display for EncounterOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Victory => write!(f, "victory"),
            Self::Defeat => write!(f, "defeat"),
            Self::Fled => write!(f, "fled"),
        }
    }
}

/// Result of [`Encounter::check_encounter_end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterEnd {
    /// True once either side is at zero health.
    pub ended: bool,
    /// Victory or defeat, when ended.
    pub reason: Option<EncounterOutcome>,
}

/// An ongoing one-on-one combat encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EncounterRecord")]
pub struct Encounter {
    /// Player at index 0, enemy at index 1.
    combatants: Vec<Combatant>,
    /// Sides sorted by initiative, descending.
    turn_order: Vec<Side>,
    turn_index: usize,
    /// Current round (1-based).
    round: u32,
    state: CombatState,
    player_defending: bool,
    outcome: Option<EncounterOutcome>,
    log: Vec<String>,
    log_limit: usize,
}

/// Unvalidated wire form, checked on deserialization.
#[derive(Deserialize)]
struct EncounterRecord {
    combatants: Vec<Combatant>,
    turn_order: Vec<Side>,
    turn_index: usize,
    round: u32,
    state: CombatState,
    player_defending: bool,
    outcome: Option<EncounterOutcome>,
    log: Vec<String>,
    log_limit: usize,
}

impl TryFrom<EncounterRecord> for Encounter {
    type Error = MechError;

    fn try_from(record: EncounterRecord) -> MechResult<Self> {
        let sides: Vec<Side> = record.combatants.iter().map(|c| c.side).collect();
        if sides != [Side::Player, Side::Enemy] {
            return Err(MechError::InvalidEncounter(
                "expected a player followed by an enemy".to_string(),
            ));
        }
        let permutation = record.turn_order.len() == 2
            && record.turn_order.contains(&Side::Player)
            && record.turn_order.contains(&Side::Enemy);
        if !permutation {
            return Err(MechError::InvalidEncounter(
                "turn order must list each side once".to_string(),
            ));
        }
        if record.turn_index >= record.turn_order.len() {
            return Err(MechError::InvalidEncounter(format!(
                "turn index {} is out of range",
                record.turn_index
            )));
        }
        if record.round == 0 {
            return Err(MechError::InvalidEncounter("rounds start at 1".to_string()));
        }
        Ok(Self {
            combatants: record.combatants,
            turn_order: record.turn_order,
            turn_index: record.turn_index,
            round: record.round,
            state: record.state,
            player_defending: record.player_defending,
            outcome: record.outcome,
            log: record.log,
            log_limit: record.log_limit.max(1),
        })
    }
}

impl Encounter {
    /// Start an encounter: build both combatants and roll initiative.
    ///
    /// Initiative is `1d20 + dex modifier`. The player rolls first; on equal
    /// scores whoever rolled first keeps the earlier slot, so ties go to the
    /// player.
    pub fn start<R: RollSource + ?Sized>(
        player: &CharacterSheet,
        player_health: Health,
        enemy: &EnemyTemplate,
        source: &mut R,
    ) -> Self {
        let mut encounter = Self {
            combatants: vec![
                Combatant::from_sheet(player, player_health),
                Combatant::from_template(enemy),
            ],
            turn_order: Vec::new(),
            turn_index: 0,
            round: 1,
            state: CombatState::Initiative,
            player_defending: false,
            outcome: None,
            log: Vec::new(),
            log_limit: DEFAULT_LOG_LIMIT,
        };

        for side in [Side::Player, Side::Enemy] {
            let roll = source.roll_die(20);
            let combatant = &mut encounter.combatants[side.index()];
            combatant.initiative = roll as i32 + combatant.dex_modifier;
            let line = format!(
                "{} rolls initiative: {roll} {} = {}",
                combatant.name,
                signed(combatant.dex_modifier),
                combatant.initiative
            );
            encounter.log_event(line);
        }

        encounter.sort_initiative();
        encounter.state = encounter.turn_state();
        tracing::debug!(
            player = %encounter.player().name,
            enemy = %encounter.enemy().name,
            leader = %encounter.current_side(),
            "encounter started"
        );
        encounter.refresh_end();
        encounter
    }

    /// Cap the combat log, dropping the oldest lines beyond the limit.
    pub fn with_log_limit(mut self, limit: usize) -> Self {
        self.log_limit = limit.max(1);
        self.trim_log();
        self
    }

    /// The player combatant.
    pub fn player(&self) -> &Combatant {
        &self.combatants[Side::Player.index()]
    }

    /// The enemy combatant.
    pub fn enemy(&self) -> &Combatant {
        &self.combatants[Side::Enemy.index()]
    }

    /// A combatant by side.
    pub fn combatant(&self, side: Side) -> &Combatant {
        &self.combatants[side.index()]
    }

    pub(crate) fn combatant_mut(&mut self, side: Side) -> &mut Combatant {
        &mut self.combatants[side.index()]
    }

    /// Current state in the turn cycle.
    pub fn state(&self) -> CombatState {
        self.state
    }

    /// Current round (1-based).
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Sides in initiative order.
    pub fn turn_order(&self) -> &[Side] {
        &self.turn_order
    }

    /// Whose turn it is.
    pub fn current_side(&self) -> Side {
        self.turn_order
            .get(self.turn_index)
            .copied()
            .unwrap_or(Side::Player)
    }

    /// True if the player's next incoming attack is rolled with disadvantage.
    pub fn is_player_defending(&self) -> bool {
        self.player_defending
    }

    /// How the encounter ended, if it has.
    pub fn outcome(&self) -> Option<EncounterOutcome> {
        self.outcome
    }

    /// True once the encounter is in `Resolution`.
    pub fn is_over(&self) -> bool {
        self.state == CombatState::Resolution
    }

    /// The combat log, oldest first.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Advance to the next combatant in initiative order.
    ///
    /// Wraps to the top of the order and increments the round when the list
    /// is exhausted. Returns true if a new round started. Does nothing once
    /// the encounter is resolved.
    pub fn advance_turn(&mut self) -> bool {
        if self.turn_order.is_empty() || self.is_over() {
            return false;
        }
        self.turn_index += 1;
        let new_round = if self.turn_index >= self.turn_order.len() {
            self.turn_index = 0;
            self.round += 1;
            true
        } else {
            false
        };
        self.state = self.turn_state();
        new_round
    }

    /// Check whether either side has dropped.
    ///
    /// Ended exactly when some combatant is at zero health: defeat if it is
    /// the player, victory otherwise. An escape does not count here; see
    /// [`Encounter::outcome`].
    pub fn check_encounter_end(&self) -> EncounterEnd {
        if self.player().health.is_down() {
            EncounterEnd {
                ended: true,
                reason: Some(EncounterOutcome::Defeat),
            }
        } else if self.enemy().health.is_down() {
            EncounterEnd {
                ended: true,
                reason: Some(EncounterOutcome::Victory),
            }
        } else {
            EncounterEnd {
                ended: false,
                reason: None,
            }
        }
    }

    /// A one-paragraph recap for narrative continuity.
    pub fn summary(&self) -> String {
        let player = self.player();
        let enemy = self.enemy();
        let rounds = if self.round == 1 {
            "1 round".to_string()
        } else {
            format!("{} rounds", self.round)
        };
        match self.outcome {
            Some(EncounterOutcome::Victory) => format!(
                "{} defeated the {} in {rounds}, landing {} of {} attacks, and finished at {} HP.",
                player.name, enemy.name, player.attacks_landed, player.attacks_made, player.health
            ),
            Some(EncounterOutcome::Defeat) => format!(
                "{} fell to the {} after {rounds}; the {} was left at {} HP.",
                player.name, enemy.name, enemy.name, enemy.health
            ),
            Some(EncounterOutcome::Fled) => format!(
                "{} escaped from the {} after {rounds}, with {} HP remaining.",
                player.name, enemy.name, player.health
            ),
            None => format!(
                "{} is fighting the {} (round {}): {} HP against {} HP.",
                player.name, enemy.name, self.round, player.health, enemy.health
            ),
        }
    }

    pub(crate) fn ensure_active(&self) -> MechResult<()> {
        if self.is_over() {
            return Err(MechError::EncounterOver);
        }
        Ok(())
    }

    pub(crate) fn ensure_turn(&self, side: Side) -> MechResult<()> {
        self.ensure_active()?;
        if self.current_side() != side {
            return Err(MechError::OutOfTurn(self.combatant(side).name.clone()));
        }
        Ok(())
    }

    pub(crate) fn set_player_defending(&mut self, defending: bool) {
        self.player_defending = defending;
    }

    pub(crate) fn resolve_as(&mut self, outcome: EncounterOutcome) {
        self.outcome = Some(outcome);
        self.state = CombatState::Resolution;
    }

    /// Run the end check and move to `Resolution` if someone dropped.
    pub(crate) fn refresh_end(&mut self) {
        if self.is_over() {
            return;
        }
        let end = self.check_encounter_end();
        if let Some(reason) = end.reason {
            self.resolve_as(reason);
            let line = format!("The encounter ends in {reason}.");
            self.log_event(line);
            tracing::debug!(%reason, round = self.round, "encounter resolved");
        }
    }

    pub(crate) fn log_event(&mut self, line: String) {
        self.log.push(line);
        self.trim_log();
    }

    fn trim_log(&mut self) {
        if self.log.len() > self.log_limit {
            let excess = self.log.len() - self.log_limit;
            self.log.drain(..excess);
        }
    }

    fn turn_state(&self) -> CombatState {
        match self.current_side() {
            Side::Player => CombatState::PlayerTurn,
            Side::Enemy => CombatState::EnemyTurn,
        }
    }

    /// Sort sides by initiative (descending). The sort is stable, so ties
    /// keep roll order.
    fn sort_initiative(&mut self) {
        let mut order = vec![Side::Player, Side::Enemy];
        order.sort_by(|a, b| {
            self.combatant(*b)
                .initiative
                .cmp(&self.combatant(*a).initiative)
        });
        self.turn_order = order;
        self.turn_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRolls;

    fn hero() -> CharacterSheet {
        CharacterSheet::new("Kael").with_dex_modifier(1)
    }

    fn start_with(rolls: impl IntoIterator<Item = u32>) -> Encounter {
        let mut source = ScriptedRolls::new(rolls);
        Encounter::start(&hero(), Health::new(20), &bestiary::goblin(), &mut source)
    }

    #[test]
    fn player_leads_on_higher_initiative() {
        let e = start_with([15, 5]);
        assert_eq!(e.player().initiative, 16);
        assert_eq!(e.enemy().initiative, 7);
        assert_eq!(e.turn_order(), &[Side::Player, Side::Enemy]);
        assert_eq!(e.state(), CombatState::PlayerTurn);
        assert_eq!(e.round(), 1);
    }

    #[test]
    fn enemy_leads_on_higher_initiative() {
        let e = start_with([3, 18]);
        assert_eq!(e.turn_order(), &[Side::Enemy, Side::Player]);
        assert_eq!(e.state(), CombatState::EnemyTurn);
    }

    #[test]
    fn initiative_ties_go_to_first_roller() {
        // Player 10 + 1 = 11, goblin 9 + 2 = 11.
        let e = start_with([10, 9]);
        assert_eq!(e.player().initiative, e.enemy().initiative);
        assert_eq!(e.turn_order(), &[Side::Player, Side::Enemy]);
    }

    #[test]
    fn advance_turn_wraps_and_counts_rounds() {
        let mut e = start_with([15, 5]);
        assert!(!e.advance_turn());
        assert_eq!(e.state(), CombatState::EnemyTurn);
        assert_eq!(e.round(), 1);
        assert!(e.advance_turn());
        assert_eq!(e.state(), CombatState::PlayerTurn);
        assert_eq!(e.round(), 2);
    }

    #[test]
    fn fresh_encounter_has_not_ended() {
        let e = start_with([15, 5]);
        let end = e.check_encounter_end();
        assert!(!end.ended);
        assert_eq!(end.reason, None);
        assert!(e.outcome().is_none());
        assert_eq!(e.log().len(), 2);
    }

    #[test]
    fn downed_player_starts_resolved() {
        let mut source = ScriptedRolls::new([10, 10]);
        let e = Encounter::start(
            &hero(),
            Health::with_current(0, 20).unwrap(),
            &bestiary::goblin(),
            &mut source,
        );
        assert!(e.is_over());
        assert_eq!(e.outcome(), Some(EncounterOutcome::Defeat));
        assert!(!e.player().alive);
    }

    #[test]
    fn log_is_bounded() {
        let e = start_with([15, 5]).with_log_limit(1);
        assert_eq!(e.log().len(), 1);
        assert!(e.log()[0].contains("Goblin"));
    }

    #[test]
    fn summary_in_progress() {
        let e = start_with([15, 5]);
        assert_eq!(
            e.summary(),
            "Kael is fighting the Goblin (round 1): 20/20 HP against 7/7 HP."
        );
    }

    #[test]
    fn serde_round_trip() {
        let e = start_with([15, 5]);
        let json = serde_json::to_string(&e).unwrap();
        let back: Encounter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn malformed_record_is_rejected() {
        let e = start_with([15, 5]);
        let valid = serde_json::to_value(&e).unwrap();

        let mut empty = valid.clone();
        empty["combatants"] = serde_json::json!([]);
        assert!(serde_json::from_value::<Encounter>(empty).is_err());

        let mut swapped = valid.clone();
        let combatants = swapped["combatants"].as_array_mut().unwrap();
        combatants.swap(0, 1);
        assert!(serde_json::from_value::<Encounter>(swapped).is_err());

        let mut doubled = valid.clone();
        doubled["turn_order"] = serde_json::json!(["Player", "Player"]);
        assert!(serde_json::from_value::<Encounter>(doubled).is_err());

        let mut index = valid;
        index["turn_index"] = serde_json::json!(2);
        assert!(serde_json::from_value::<Encounter>(index).is_err());
    }
}
