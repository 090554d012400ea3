//! Dice notation parsing: `<count>d<sides>[+|-<modifier>]`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::roll::RollResult;
use super::source::RollSource;
use super::Die;
use crate::error::{MechError, MechResult};

/// Largest number of dice a single expression may roll.
pub const MAX_DICE: u32 = 100;
/// Largest die a single expression may use.
pub const MAX_SIDES: u32 = 1000;
/// Largest absolute flat modifier.
pub const MAX_MODIFIER: u32 = 1000;

/// A parsed dice expression such as `2d6+1`.
///
/// Serialized as its canonical string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceNotation {
    count: u32,
    die: Die,
    modifier: i32,
}

impl DiceNotation {
    /// Build a notation from its parts.
    ///
    /// Parts are clamped into the parseable range: zero counts and
    /// zero-sided dice become one, and oversized values drop to
    /// [`MAX_DICE`], [`MAX_SIDES`], and [`MAX_MODIFIER`]. Use [`str::parse`]
    /// to reject them instead.
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        let bound = MAX_MODIFIER as i32;
        Self {
            count: count.clamp(1, MAX_DICE),
            die: Die::from_sides(sides.clamp(1, MAX_SIDES)).unwrap_or(Die::Custom(1)),
            modifier: modifier.clamp(-bound, bound),
        }
    }

    /// Number of dice rolled.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The die type rolled.
    pub fn die(&self) -> Die {
        self.die
    }

    /// Flat modifier added to the sum.
    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    /// Smallest possible total.
    pub fn min_total(&self) -> i32 {
        self.count as i32 + self.modifier
    }

    /// Largest possible total.
    pub fn max_total(&self) -> i32 {
        (self.count * self.die.sides()) as i32 + self.modifier
    }

    /// Roll every die in the expression.
    pub fn roll<R: RollSource + ?Sized>(&self, source: &mut R) -> RollResult {
        let faces = (0..self.count)
            .map(|_| source.roll_die(self.die.sides()))
            .collect();
        RollResult {
            notation: *self,
            faces,
        }
    }
}

impl FromStr for DiceNotation {
    type Err = MechError;

    fn from_str(s: &str) -> MechResult<Self> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let invalid = || MechError::InvalidNotation(s.trim().to_string());

        let (count_part, rest) = compact.split_once('d').ok_or_else(invalid)?;
        let count = if count_part.is_empty() {
            1
        } else {
            parse_digits(count_part).ok_or_else(invalid)?
        };

        let (sides_part, modifier) = match rest.find(['+', '-']) {
            Some(at) => {
                let (sides_part, signed) = rest.split_at(at);
                let magnitude = parse_digits(&signed[1..]).ok_or_else(invalid)?;
                if magnitude > MAX_MODIFIER {
                    return Err(invalid());
                }
                let magnitude = magnitude as i32;
                let modifier = if signed.starts_with('-') {
                    -magnitude
                } else {
                    magnitude
                };
                (sides_part, modifier)
            }
            None => (rest, 0),
        };
        let sides = parse_digits(sides_part).ok_or_else(invalid)?;

        if count == 0 || count > MAX_DICE || sides > MAX_SIDES {
            return Err(invalid());
        }
        let die = Die::from_sides(sides).ok_or_else(invalid)?;

        Ok(Self {
            count,
            die,
            modifier,
        })
    }
}

impl TryFrom<String> for DiceNotation {
    type Error = MechError;

    fn try_from(value: String) -> MechResult<Self> {
        value.parse()
    }
}

impl From<DiceNotation> for String {
    fn from(value: DiceNotation) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.count, self.die)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// Parse a non-empty run of ASCII digits. Signs and other characters fail.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> DiceNotation {
        s.parse().unwrap()
    }

    #[test]
    fn parses_full_form() {
        let n = parse("2d6+3");
        assert_eq!(n.count(), 2);
        assert_eq!(n.die(), Die::D6);
        assert_eq!(n.modifier(), 3);
    }

    #[test]
    fn new_clamps_oversized_parts() {
        let n = DiceNotation::new(u32::MAX, u32::MAX, i32::MIN);
        assert_eq!(n.count(), MAX_DICE);
        assert_eq!(n.die().sides(), MAX_SIDES);
        assert_eq!(n.modifier(), -1000);
        assert_eq!(n.max_total(), 99_000);
        assert_eq!(n, parse("100d1000-1000"));
    }

    #[test]
    fn parses_negative_modifier() {
        assert_eq!(parse("1d8-1").modifier(), -1);
    }

    #[test]
    fn implicit_count_and_case() {
        let n = parse("D20");
        assert_eq!(n.count(), 1);
        assert_eq!(n.die(), Die::D20);
        assert_eq!(n.modifier(), 0);
    }

    #[test]
    fn tolerates_whitespace() {
        assert_eq!(parse(" 1d6 + 2 "), parse("1d6+2"));
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "", "d", "6", "2x6", "1d", "-1d6", "0d6", "1d0", "1d6+", "1d6+-2", "1d6*2", "abc",
            "1d6+2+3", "101d6", "1d1001",
        ] {
            let parsed: MechResult<DiceNotation> = bad.parse();
            assert!(
                matches!(parsed, Err(MechError::InvalidNotation(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(parse("d6").to_string(), "1d6");
        assert_eq!(parse("2d8+0").to_string(), "2d8");
        assert_eq!(parse("1d4-2").to_string(), "1d4-2");
        assert_eq!(DiceNotation::new(1, 6, 2).to_string(), "1d6+2");
    }

    #[test]
    fn bounds() {
        let n = parse("2d6+1");
        assert_eq!(n.min_total(), 3);
        assert_eq!(n.max_total(), 13);
    }

    #[test]
    fn serde_uses_string_form() {
        let n = parse("1d6+2");
        let json = serde_json::to_string(&n).unwrap();
        assert_eq!(json, "\"1d6+2\"");
        let back: DiceNotation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, n);
        assert!(serde_json::from_str::<DiceNotation>("\"nope\"").is_err());
    }
}
