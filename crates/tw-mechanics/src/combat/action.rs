//! Combat actions: attack, defend, flee, and the enemy's turn.
//!
//! Every action returns a structured outcome describing exactly what was
//! rolled and what changed, and every action that can change health runs
//! the end check before returning.

use serde::{Deserialize, Serialize};

use super::{Encounter, EncounterOutcome, Side};
use crate::dice::{self, D20Roll, DiceNotation, RollMode, RollResult, RollSource};
use crate::error::{MechError, MechResult};
use crate::sheet::signed;

/// Target number for escaping an encounter.
pub const FLEE_DIFFICULTY: i32 = 12;

/// The result of one attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Who attacked.
    pub attacker: Side,
    /// Who was attacked.
    pub defender: Side,
    /// Attacker's name.
    pub attacker_name: String,
    /// Defender's name.
    pub defender_name: String,
    /// The d20 roll, including both dice under advantage or disadvantage.
    pub roll: D20Roll,
    /// Bonus added to the kept d20.
    pub attack_bonus: i32,
    /// Kept d20 plus bonus.
    pub attack_total: i32,
    /// The defense value the total was compared against.
    pub defense: u32,
    /// True if `attack_total >= defense`.
    pub hit: bool,
    /// Damage dice, rolled only on a hit.
    pub damage_roll: Option<RollResult>,
    /// Damage applied (never negative).
    pub damage: u32,
    /// Defender's health after the attack.
    pub remaining_health: u32,
    /// False if the attack dropped the defender.
    pub defender_alive: bool,
    /// True for an opportunity attack after a failed escape.
    pub opportunity: bool,
}

impl std::fmt::Display for AttackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = if self.opportunity {
            "lashes out at the fleeing"
        } else {
            "attacks"
        };
        write!(
            f,
            "{} {verb} {}: {} {} = {} vs defense {}",
            self.attacker_name,
            self.defender_name,
            self.roll,
            signed(self.attack_bonus),
            self.attack_total,
            self.defense
        )?;
        if self.hit {
            write!(f, ", hit for {}", self.damage)?;
            if !self.defender_alive {
                write!(f, " and {} falls", self.defender_name)?;
            } else {
                write!(f, " ({} HP left)", self.remaining_health)?;
            }
        } else {
            write!(f, ", miss")?;
        }
        Ok(())
    }
}

/// The result of an escape attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleeOutcome {
    /// The raw d20.
    pub roll: u32,
    /// d20 plus dexterity modifier.
    pub total: i32,
    /// The target number.
    pub difficulty: i32,
    /// True if the player got away.
    pub escaped: bool,
    /// The enemy's advantage attack after a failed escape.
    pub opportunity_attack: Option<AttackOutcome>,
}

impl Encounter {
    /// Resolve a single attack between two combatants.
    ///
    /// Rolls `1d20 + attack_bonus` against the defender's defense. On a hit,
    /// rolls `damage`, floors it at zero, and subtracts it from the
    /// defender's health (clamped at zero). If the defender is the player
    /// and is defending, the roll is made with disadvantage and the stance
    /// is spent.
    pub fn resolve_attack<R: RollSource + ?Sized>(
        &mut self,
        attacker: Side,
        defender: Side,
        attack_bonus: i32,
        damage: &DiceNotation,
        source: &mut R,
    ) -> MechResult<AttackOutcome> {
        self.attack(attacker, defender, attack_bonus, damage, RollMode::Normal, source)
    }

    /// The player attacks the enemy with their own bonus and weapon.
    pub fn player_attack<R: RollSource + ?Sized>(
        &mut self,
        source: &mut R,
    ) -> MechResult<AttackOutcome> {
        self.ensure_turn(Side::Player)?;
        let (bonus, damage) = (self.player().attack_bonus, self.player().damage);
        self.attack(Side::Player, Side::Enemy, bonus, &damage, RollMode::Normal, source)
    }

    /// The enemy takes its turn: one attack against the player.
    pub fn enemy_turn<R: RollSource + ?Sized>(
        &mut self,
        source: &mut R,
    ) -> MechResult<AttackOutcome> {
        self.ensure_turn(Side::Enemy)?;
        let (bonus, damage) = (self.enemy().attack_bonus, self.enemy().damage);
        self.attack(Side::Enemy, Side::Player, bonus, &damage, RollMode::Normal, source)
    }

    /// Take a defensive stance: the next enemy attack against the player is
    /// rolled with disadvantage.
    pub fn execute_defend(&mut self) -> MechResult<()> {
        self.ensure_turn(Side::Player)?;
        self.set_player_defending(true);
        let line = format!("{} raises their guard.", self.player().name);
        self.log_event(line);
        Ok(())
    }

    /// Try to escape: `1d20 + dex modifier` against [`FLEE_DIFFICULTY`].
    ///
    /// Success ends the encounter as [`EncounterOutcome::Fled`]. Failure
    /// gives the enemy one immediate attack with advantage; afterwards the
    /// caller resumes the normal turn order.
    pub fn execute_flee<R: RollSource + ?Sized>(
        &mut self,
        source: &mut R,
    ) -> MechResult<FleeOutcome> {
        self.ensure_turn(Side::Player)?;
        let roll = source.roll_die(20);
        let total = roll as i32 + self.player().dex_modifier;
        let escaped = total >= FLEE_DIFFICULTY;

        let name = self.player().name.clone();
        if escaped {
            self.log_event(format!(
                "{name} flees ({total} vs {FLEE_DIFFICULTY}) and escapes."
            ));
            self.resolve_as(EncounterOutcome::Fled);
            tracing::debug!(total, "flee succeeded");
            return Ok(FleeOutcome {
                roll,
                total,
                difficulty: FLEE_DIFFICULTY,
                escaped,
                opportunity_attack: None,
            });
        }

        self.log_event(format!(
            "{name} tries to flee ({total} vs {FLEE_DIFFICULTY}) but is cut off."
        ));
        let (bonus, damage) = (self.enemy().attack_bonus, self.enemy().damage);
        let attack = self.attack_with(
            Side::Enemy,
            Side::Player,
            bonus,
            &damage,
            RollMode::Advantage,
            true,
            source,
        )?;
        Ok(FleeOutcome {
            roll,
            total,
            difficulty: FLEE_DIFFICULTY,
            escaped,
            opportunity_attack: Some(attack),
        })
    }

    fn attack<R: RollSource + ?Sized>(
        &mut self,
        attacker: Side,
        defender: Side,
        attack_bonus: i32,
        damage: &DiceNotation,
        mode: RollMode,
        source: &mut R,
    ) -> MechResult<AttackOutcome> {
        self.attack_with(attacker, defender, attack_bonus, damage, mode, false, source)
    }

    #[allow(clippy::too_many_arguments)]
    fn attack_with<R: RollSource + ?Sized>(
        &mut self,
        attacker: Side,
        defender: Side,
        attack_bonus: i32,
        damage: &DiceNotation,
        mode: RollMode,
        opportunity: bool,
        source: &mut R,
    ) -> MechResult<AttackOutcome> {
        self.ensure_active()?;
        if attacker == defender {
            return Err(MechError::CombatError(
                "a combatant cannot attack itself".to_string(),
            ));
        }
        if !self.combatant(attacker).alive {
            return Err(MechError::CombatError(format!(
                "{} cannot act at zero health",
                self.combatant(attacker).name
            )));
        }

        let mut mode = mode;
        if defender == Side::Player && self.is_player_defending() {
            mode = mode.combine(RollMode::Disadvantage);
            self.set_player_defending(false);
        }

        let roll = dice::roll_d20(mode, source);
        let attack_total = roll.kept as i32 + attack_bonus;
        let defense = self.combatant(defender).defense;
        let hit = attack_total >= defense as i32;

        let (damage_roll, damage) = if hit {
            let rolled = damage.roll(source);
            let amount = rolled.total().max(0) as u32;
            (Some(rolled), amount)
        } else {
            (None, 0)
        };

        let attacker_name = self.combatant(attacker).name.clone();
        {
            let acting = self.combatant_mut(attacker);
            acting.attacks_made += 1;
            if hit {
                acting.attacks_landed += 1;
            }
        }
        let target = self.combatant_mut(defender);
        let remaining_health = target.health.take_damage(damage);
        if target.health.is_down() {
            target.alive = false;
        }
        let outcome = AttackOutcome {
            attacker,
            defender,
            attacker_name,
            defender_name: target.name.clone(),
            roll,
            attack_bonus,
            attack_total,
            defense,
            hit,
            damage_roll,
            damage,
            remaining_health,
            defender_alive: target.alive,
            opportunity,
        };

        self.log_event(outcome.to_string());
        self.refresh_end();
        Ok(outcome)
    }
}
