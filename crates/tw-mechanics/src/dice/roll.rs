//! Dice roll results.

use serde::{Deserialize, Serialize};

use super::RollMode;
use super::notation::DiceNotation;

/// The result of rolling a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// The expression that was rolled.
    pub notation: DiceNotation,
    /// Individual face values, in roll order.
    pub faces: Vec<u32>,
}

impl RollResult {
    /// Sum of the face values, before the modifier.
    pub fn face_sum(&self) -> u32 {
        self.faces.iter().sum()
    }

    /// The flat modifier of the expression.
    pub fn modifier(&self) -> i32 {
        self.notation.modifier()
    }

    /// Face sum plus modifier. May be negative for expressions like `1d4-3`.
    pub fn total(&self) -> i32 {
        self.face_sum() as i32 + self.modifier()
    }
}

impl std::fmt::Display for RollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.faces.iter().map(|v| v.to_string()).collect();
        write!(f, "{}: [{}]", self.notation, values.join(", "))?;
        match self.modifier() {
            0 => {}
            m if m > 0 => write!(f, " + {m}")?,
            m => write!(f, " - {}", m.unsigned_abs())?,
        }
        write!(f, " = {}", self.total())
    }
}

/// A d20 roll, possibly with advantage or disadvantage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    /// How the roll was made.
    pub mode: RollMode,
    /// The raw d20 values (one for normal rolls, two otherwise).
    pub rolls: Vec<u32>,
    /// The value that counts.
    pub kept: u32,
}

impl D20Roll {
    /// True if the kept die shows a 20.
    pub fn is_natural_20(&self) -> bool {
        self.kept == 20
    }

    /// True if the kept die shows a 1.
    pub fn is_natural_1(&self) -> bool {
        self.kept == 1
    }
}

impl std::fmt::Display for D20Roll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode {
            RollMode::Normal => write!(f, "d20 [{}]", self.kept),
            mode => {
                let values: Vec<String> = self.rolls.iter().map(|v| v.to_string()).collect();
                write!(f, "d20 with {mode} [{}] keeps {}", values.join(", "), self.kept)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(notation: &str, faces: &[u32]) -> RollResult {
        RollResult {
            notation: notation.parse().unwrap(),
            faces: faces.to_vec(),
        }
    }

    #[test]
    fn totals() {
        assert_eq!(result("2d6+3", &[2, 5]).total(), 10);
        assert_eq!(result("1d4-3", &[1]).total(), -2);
        assert_eq!(result("3d8", &[1, 2, 3]).face_sum(), 6);
    }

    #[test]
    fn display() {
        assert_eq!(result("2d6+3", &[2, 5]).to_string(), "2d6+3: [2, 5] + 3 = 10");
        assert_eq!(result("1d8-1", &[4]).to_string(), "1d8-1: [4] - 1 = 3");
        assert_eq!(result("1d20", &[12]).to_string(), "1d20: [12] = 12");
    }

    #[test]
    fn d20_display_and_naturals() {
        let adv = D20Roll {
            mode: RollMode::Advantage,
            rolls: vec![3, 20],
            kept: 20,
        };
        assert!(adv.is_natural_20());
        assert_eq!(adv.to_string(), "d20 with advantage [3, 20] keeps 20");

        let plain = D20Roll {
            mode: RollMode::Normal,
            rolls: vec![1],
            kept: 1,
        };
        assert!(plain.is_natural_1());
        assert_eq!(plain.to_string(), "d20 [1]");
    }
}
