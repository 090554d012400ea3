//! Dice types, notation, and rolling.
//!
//! Dice are described with standard notation (`2d6+1`, `d20`, `1d8-1`) and
//! rolled against a [`RollSource`]. The d20 helpers implement advantage and
//! disadvantage: roll twice, keep the higher or lower result.

pub mod notation;
pub mod roll;
pub mod source;

pub use notation::DiceNotation;
pub use roll::{D20Roll, RollResult};
pub use source::{RollSource, ScriptedRolls};

use serde::{Deserialize, Serialize};

use crate::error::MechResult;

/// A polyhedral die type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Die {
    /// Four-sided die.
    D4,
    /// Six-sided die.
    D6,
    /// Eight-sided die.
    D8,
    /// Ten-sided die.
    D10,
    /// Twelve-sided die.
    D12,
    /// Twenty-sided die.
    D20,
    /// Percentile die (1-100).
    D100,
    /// A die with a custom number of sides.
    Custom(u32),
}

impl Die {
    /// Returns the number of sides on this die.
    pub fn sides(self) -> u32 {
        match self {
            Self::D4 => 4,
            Self::D6 => 6,
            Self::D8 => 8,
            Self::D10 => 10,
            Self::D12 => 12,
            Self::D20 => 20,
            Self::D100 => 100,
            Self::Custom(n) => n,
        }
    }

    /// Map a side count to a die. Returns `None` for zero sides.
    pub fn from_sides(sides: u32) -> Option<Self> {
        match sides {
            0 => None,
            4 => Some(Self::D4),
            6 => Some(Self::D6),
            8 => Some(Self::D8),
            10 => Some(Self::D10),
            12 => Some(Self::D12),
            20 => Some(Self::D20),
            100 => Some(Self::D100),
            n => Some(Self::Custom(n)),
        }
    }
}

impl std::fmt::Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// How a d20 check is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RollMode {
    /// A single d20.
    #[default]
    Normal,
    /// Two d20, keep the higher.
    Advantage,
    /// Two d20, keep the lower.
    Disadvantage,
}

impl RollMode {
    /// Combine two modes. Advantage and disadvantage cancel out.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Normal, m) | (m, Self::Normal) => m,
            (a, b) if a == b => a,
            _ => Self::Normal,
        }
    }
}

impl std::fmt::Display for RollMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Advantage => write!(f, "advantage"),
            Self::Disadvantage => write!(f, "disadvantage"),
        }
    }
}

/// Parse and roll a dice expression such as `"2d6+3"`.
pub fn roll<R: RollSource + ?Sized>(notation: &str, source: &mut R) -> MechResult<RollResult> {
    let parsed: DiceNotation = notation.parse()?;
    Ok(parsed.roll(source))
}

/// Roll a d20 in the given mode.
pub fn roll_d20<R: RollSource + ?Sized>(mode: RollMode, source: &mut R) -> D20Roll {
    let first = source.roll_die(20);
    let (rolls, kept) = match mode {
        RollMode::Normal => (vec![first], first),
        RollMode::Advantage => {
            let second = source.roll_die(20);
            (vec![first, second], first.max(second))
        }
        RollMode::Disadvantage => {
            let second = source.roll_die(20);
            (vec![first, second], first.min(second))
        }
    };
    D20Roll { mode, rolls, kept }
}

/// Roll two d20 and keep the higher.
pub fn roll_with_advantage<R: RollSource + ?Sized>(source: &mut R) -> D20Roll {
    roll_d20(RollMode::Advantage, source)
}

/// Roll two d20 and keep the lower.
pub fn roll_with_disadvantage<R: RollSource + ?Sized>(source: &mut R) -> D20Roll {
    roll_d20(RollMode::Disadvantage, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn die_sides() {
        assert_eq!(Die::D4.sides(), 4);
        assert_eq!(Die::D20.sides(), 20);
        assert_eq!(Die::D100.sides(), 100);
        assert_eq!(Die::Custom(30).sides(), 30);
    }

    #[test]
    fn die_from_sides() {
        assert_eq!(Die::from_sides(6), Some(Die::D6));
        assert_eq!(Die::from_sides(3), Some(Die::Custom(3)));
        assert_eq!(Die::from_sides(0), None);
    }

    #[test]
    fn die_display() {
        assert_eq!(Die::D20.to_string(), "d20");
        assert_eq!(Die::Custom(30).to_string(), "d30");
    }

    #[test]
    fn mode_combination() {
        use RollMode::*;
        assert_eq!(Normal.combine(Advantage), Advantage);
        assert_eq!(Disadvantage.combine(Normal), Disadvantage);
        assert_eq!(Advantage.combine(Disadvantage), Normal);
        assert_eq!(Advantage.combine(Advantage), Advantage);
    }

    #[test]
    fn roll_parses_and_totals() {
        let mut source = ScriptedRolls::new([3, 5]);
        let result = roll("2d6+3", &mut source).unwrap();
        assert_eq!(result.faces, vec![3, 5]);
        assert_eq!(result.modifier(), 3);
        assert_eq!(result.total(), 11);
    }

    #[test]
    fn roll_rejects_bad_notation() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(roll("2x6", &mut rng).is_err());
        assert!(roll("0d6", &mut rng).is_err());
        assert!(roll("1d0", &mut rng).is_err());
    }

    #[test]
    fn advantage_keeps_higher() {
        let mut source = ScriptedRolls::new([4, 17]);
        let r = roll_with_advantage(&mut source);
        assert_eq!(r.rolls, vec![4, 17]);
        assert_eq!(r.kept, 17);
    }

    #[test]
    fn disadvantage_keeps_lower() {
        let mut source = ScriptedRolls::new([4, 17]);
        let r = roll_with_disadvantage(&mut source);
        assert_eq!(r.rolls, vec![4, 17]);
        assert_eq!(r.kept, 4);
    }

    #[test]
    fn advantage_and_disadvantage_over_many_seeded_draws() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let adv = roll_with_advantage(&mut rng);
            assert_eq!(adv.kept, *adv.rolls.iter().max().unwrap());
            let dis = roll_with_disadvantage(&mut rng);
            assert_eq!(dis.kept, *dis.rolls.iter().min().unwrap());
        }
    }

    proptest! {
        #[test]
        fn notation_rolls_respect_bounds(
            count in 1u32..=20,
            sides in 1u32..=100,
            modifier in -50i32..=50,
            seed in any::<u64>(),
        ) {
            let text = if modifier < 0 {
                format!("{count}d{sides}{modifier}")
            } else {
                format!("{count}d{sides}+{modifier}")
            };
            let mut rng = StdRng::seed_from_u64(seed);
            let result = roll(&text, &mut rng).unwrap();
            prop_assert_eq!(result.faces.len(), count as usize);
            prop_assert!(result.faces.iter().all(|f| (1..=sides).contains(f)));
            let sum: i32 = result.faces.iter().map(|&f| f as i32).sum();
            prop_assert_eq!(result.total(), sum + modifier);
        }
    }
}
