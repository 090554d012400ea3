//! Combat flow on top of the mechanics engine.
//!
//! Between player commands an encounter always rests on the player's turn
//! or is over: after the player acts, every enemy turn up to the player's
//! next turn is played out immediately.

use serde::{Deserialize, Serialize};

use tw_mechanics::combat::Side;
use tw_mechanics::sheet::signed;
use tw_mechanics::{
    AttackOutcome, Encounter, EncounterOutcome, FleeOutcome, MechResult, RollSource,
};

/// Phrases that start a fight while exploring.
pub const ENCOUNTER_TRIGGERS: &[&str] = &["attack", "fight", "ambush", "charge"];

/// What the player does on their combat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatAction {
    /// Strike the enemy.
    Attack,
    /// Brace: the next enemy attack has disadvantage.
    Defend,
    /// Try to escape.
    Flee,
}

impl CombatAction {
    /// Parse free text such as "I swing my sword" or "run away".
    pub fn parse(text: &str) -> Option<Self> {
        text.split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .find_map(|word| match word.as_str() {
                "attack" | "strike" | "hit" | "swing" | "stab" | "slash" | "shoot" | "fight" => {
                    Some(Self::Attack)
                }
                "defend" | "block" | "guard" | "parry" | "brace" | "dodge" => Some(Self::Defend),
                "flee" | "run" | "escape" | "retreat" => Some(Self::Flee),
                _ => None,
            })
    }
}

impl std::fmt::Display for CombatAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attack => write!(f, "attack"),
            Self::Defend => write!(f, "defend"),
            Self::Flee => write!(f, "flee"),
        }
    }
}

/// Whether an exploration action picks a fight.
pub fn is_encounter_trigger(action: &str) -> bool {
    action
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| ENCOUNTER_TRIGGERS.iter().any(|t| w.eq_ignore_ascii_case(t)))
}

/// Everything that happened during one exchange of blows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRound {
    /// Human-readable event lines, in order.
    pub events: Vec<String>,
    /// Every attack resolved, in order.
    pub attacks: Vec<AttackOutcome>,
    /// The flee attempt, if the player tried.
    pub flee: Option<FleeOutcome>,
    /// Set when the encounter ended during this exchange.
    pub outcome: Option<EncounterOutcome>,
    /// Recap of the encounter, once it is over.
    pub summary: Option<String>,
}

impl CombatRound {
    fn record_attack(&mut self, attack: AttackOutcome) {
        self.events.push(attack.to_string());
        self.attacks.push(attack);
    }

    fn close(&mut self, encounter: &Encounter) {
        self.outcome = encounter.outcome();
        if self.outcome.is_some() {
            self.summary = Some(encounter.summary());
        }
    }
}

/// Play out any enemy turns that precede the player's first turn.
pub fn resolve_opening<R: RollSource + ?Sized>(
    encounter: &mut Encounter,
    source: &mut R,
) -> MechResult<CombatRound> {
    let mut round = CombatRound::default();
    let order = encounter
        .turn_order()
        .iter()
        .map(|side| encounter.combatant(*side))
        .map(|c| format!("{} ({})", c.name, c.initiative))
        .collect::<Vec<_>>()
        .join(", then ");
    round.events.push(format!("Initiative: {order}."));
    enemy_phase(encounter, &mut round, source)?;
    round.close(encounter);
    Ok(round)
}

/// Resolve the player's action and the enemy's reply.
pub fn resolve_player_action<R: RollSource + ?Sized>(
    encounter: &mut Encounter,
    action: CombatAction,
    source: &mut R,
) -> MechResult<CombatRound> {
    let mut round = CombatRound::default();
    match action {
        CombatAction::Attack => {
            let attack = encounter.player_attack(source)?;
            round.record_attack(attack);
        }
        CombatAction::Defend => {
            encounter.execute_defend()?;
            round
                .events
                .push(format!("{} raises their guard.", encounter.player().name));
        }
        CombatAction::Flee => {
            let flee = encounter.execute_flee(source)?;
            let verdict = if flee.escaped { "escapes" } else { "is cut off" };
            round.events.push(format!(
                "{} tries to flee: d20 [{}] {} = {} vs {}, and {verdict}.",
                encounter.player().name,
                flee.roll,
                signed(encounter.player().dex_modifier),
                flee.total,
                flee.difficulty
            ));
            if let Some(attack) = &flee.opportunity_attack {
                round.record_attack(attack.clone());
            }
            round.flee = Some(flee);
        }
    }

    if !encounter.is_over() {
        encounter.advance_turn();
        enemy_phase(encounter, &mut round, source)?;
    }
    round.close(encounter);
    Ok(round)
}

fn enemy_phase<R: RollSource + ?Sized>(
    encounter: &mut Encounter,
    round: &mut CombatRound,
    source: &mut R,
) -> MechResult<()> {
    while !encounter.is_over() && encounter.current_side() == Side::Enemy {
        let attack = encounter.enemy_turn(source)?;
        round.record_attack(attack);
        if !encounter.is_over() {
            encounter.advance_turn();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tw_mechanics::combat::bestiary;
    use tw_mechanics::{CharacterSheet, CombatState, DiceNotation, Health, ScriptedRolls};

    fn hero() -> CharacterSheet {
        CharacterSheet::new("Kael")
            .with_max_health(20)
            .with_defense(13)
            .with_dex_modifier(1)
            .with_attack_bonus(3)
            .with_damage(DiceNotation::new(1, 6, 0))
    }

    fn start(rolls: &mut ScriptedRolls) -> Encounter {
        Encounter::start(&hero(), Health::new(20), &bestiary::goblin(), rolls)
    }

    #[test]
    fn parse_actions() {
        assert_eq!(CombatAction::parse("I swing my sword"), Some(CombatAction::Attack));
        assert_eq!(CombatAction::parse("Block!"), Some(CombatAction::Defend));
        assert_eq!(CombatAction::parse("run for the trees"), Some(CombatAction::Flee));
        assert_eq!(CombatAction::parse("sing a song"), None);
    }

    #[test]
    fn triggers() {
        assert!(is_encounter_trigger("I attack the bandit"));
        assert!(is_encounter_trigger("CHARGE!"));
        assert!(!is_encounter_trigger("discharge the cannon"));
        assert!(!is_encounter_trigger("look around"));
    }

    #[test]
    fn opening_plays_enemy_turn_when_enemy_leads() {
        // Player 3 + 1 = 4, goblin 15 + 2 = 17; goblin attacks 5 + 4 = 9, misses.
        let mut rolls = ScriptedRolls::new([3, 15, 5]);
        let mut enc = start(&mut rolls);
        let round = resolve_opening(&mut enc, &mut rolls).unwrap();
        assert_eq!(round.attacks.len(), 1);
        assert!(!round.attacks[0].hit);
        assert_eq!(enc.state(), CombatState::PlayerTurn);
        assert!(round.events[0].starts_with("Initiative: Goblin (17), then Kael (4)"));
    }

    #[test]
    fn opening_is_quiet_when_player_leads() {
        let mut rolls = ScriptedRolls::new([12, 5]);
        let mut enc = start(&mut rolls);
        let round = resolve_opening(&mut enc, &mut rolls).unwrap();
        assert!(round.attacks.is_empty());
        assert_eq!(enc.state(), CombatState::PlayerTurn);
    }

    #[test]
    fn attack_then_enemy_reply() {
        // Initiative 13 vs 7. Player hits (15 + 3 = 18) for 4; goblin misses (2 + 4 = 6).
        let mut rolls = ScriptedRolls::new([12, 5, 15, 4, 2]);
        let mut enc = start(&mut rolls);
        let round = resolve_player_action(&mut enc, CombatAction::Attack, &mut rolls).unwrap();
        assert_eq!(round.attacks.len(), 2);
        assert_eq!(enc.enemy().health.current(), 3);
        assert_eq!(enc.state(), CombatState::PlayerTurn);
        assert_eq!(enc.round(), 2);
        assert!(round.outcome.is_none());
    }

    #[test]
    fn killing_blow_ends_without_reply() {
        let mut rolls = ScriptedRolls::new([12, 5, 20, 6, 19, 6, 15, 3]);
        let mut enc = start(&mut rolls);
        resolve_player_action(&mut enc, CombatAction::Attack, &mut rolls).unwrap();
        let round = resolve_player_action(&mut enc, CombatAction::Attack, &mut rolls).unwrap();
        assert_eq!(round.outcome, Some(EncounterOutcome::Victory));
        assert_eq!(round.attacks.len(), 1);
        assert!(round.summary.unwrap().contains("defeated the Goblin"));
    }

    #[test]
    fn failed_flee_then_normal_enemy_turn() {
        // Flee 10 + 1 = 11 < 12; opportunity attack with advantage, then the
        // goblin's regular turn.
        let mut rolls = ScriptedRolls::new([12, 5, 10, 6, 16, 3, 1]);
        let mut enc = start(&mut rolls);
        let round = resolve_player_action(&mut enc, CombatAction::Flee, &mut rolls).unwrap();
        let flee = round.flee.as_ref().unwrap();
        assert!(!flee.escaped);
        assert_eq!(round.attacks.len(), 2);
        assert!(round.attacks[0].opportunity);
        assert!(!round.attacks[1].opportunity);
        assert_eq!(enc.state(), CombatState::PlayerTurn);
        assert!(round.events[0].contains("is cut off"));
    }

    #[test]
    fn successful_flee_ends_encounter() {
        let mut rolls = ScriptedRolls::new([12, 5, 18]);
        let mut enc = start(&mut rolls);
        let round = resolve_player_action(&mut enc, CombatAction::Flee, &mut rolls).unwrap();
        assert_eq!(round.outcome, Some(EncounterOutcome::Fled));
        assert!(round.attacks.is_empty());
    }
}
