//! Hit point tracking.
//!
//! Health is a current/max pair with `0 <= current <= max` held after every
//! mutation. Damage saturates at zero; an explicit adjustment that would
//! overshoot the maximum is rejected instead of clamped.

use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};

/// Current and maximum hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HealthRecord")]
pub struct Health {
    current: u32,
    max: u32,
}

/// Unvalidated wire form, checked on deserialization.
#[derive(Deserialize)]
struct HealthRecord {
    current: u32,
    max: u32,
}

impl TryFrom<HealthRecord> for Health {
    type Error = MechError;

    fn try_from(record: HealthRecord) -> MechResult<Self> {
        Self::with_current(record.current, record.max)
    }
}

impl Health {
    /// Full health with the given maximum.
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Health with an explicit current value. Fails if `current > max`.
    pub fn with_current(current: u32, max: u32) -> MechResult<Self> {
        if current > max {
            return Err(MechError::InvalidHealth {
                current: current.into(),
                max,
            });
        }
        Ok(Self { current, max })
    }

    /// Current hit points.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Maximum hit points.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Apply a signed change.
    ///
    /// Negative deltas floor at zero. A positive delta that would push
    /// current above max is rejected and leaves the value untouched.
    pub fn adjust(&mut self, delta: i32) -> MechResult<u32> {
        let target = i64::from(self.current) + i64::from(delta);
        if target > i64::from(self.max) {
            return Err(MechError::InvalidHealth {
                current: target,
                max: self.max,
            });
        }
        self.current = target.max(0) as u32;
        Ok(self.current)
    }

    /// Subtract damage, saturating at zero. Returns the new value.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.current = self.current.saturating_sub(amount);
        self.current
    }

    /// Restore hit points, capped at max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current - before
    }

    /// True at zero hit points.
    pub fn is_down(&self) -> bool {
        self.current == 0
    }

    /// Fraction of health remaining (0.0 to 1.0).
    pub fn fraction(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        f64::from(self.current) / f64::from(self.max)
    }
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_starts_full() {
        let h = Health::new(20);
        assert_eq!(h.current(), 20);
        assert_eq!(h.max(), 20);
        assert!(!h.is_down());
    }

    #[test]
    fn with_current_rejects_overflow() {
        assert!(Health::with_current(21, 20).is_err());
        assert_eq!(Health::with_current(5, 20).unwrap().current(), 5);
    }

    #[test]
    fn adjust_floors_at_zero() {
        let mut h = Health::new(10);
        assert_eq!(h.adjust(-25).unwrap(), 0);
        assert!(h.is_down());
    }

    #[test]
    fn adjust_rejects_overheal_and_keeps_value() {
        let mut h = Health::with_current(18, 20).unwrap();
        assert!(h.adjust(5).is_err());
        assert_eq!(h.current(), 18);
        assert_eq!(h.adjust(2).unwrap(), 20);
    }

    #[test]
    fn heal_caps_at_max() {
        let mut h = Health::with_current(15, 20).unwrap();
        assert_eq!(h.heal(10), 5);
        assert_eq!(h.current(), 20);
    }

    #[test]
    fn damage_saturates() {
        let mut h = Health::new(7);
        assert_eq!(h.take_damage(4), 3);
        assert_eq!(h.take_damage(5), 0);
    }

    #[test]
    fn fraction_and_display() {
        let h = Health::with_current(5, 10).unwrap();
        assert!((h.fraction() - 0.5).abs() < f64::EPSILON);
        assert_eq!(h.to_string(), "5/10");
        assert!((Health::new(0).fraction()).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<Health>(r#"{"current":3,"max":10}"#).is_ok());
        assert!(serde_json::from_str::<Health>(r#"{"current":30,"max":10}"#).is_err());
    }

    proptest! {
        #[test]
        fn invariant_holds_for_any_adjustments(
            max in 1u32..200,
            deltas in proptest::collection::vec(-60i32..60, 0..40),
        ) {
            let mut h = Health::new(max);
            for delta in deltas {
                let _ = h.adjust(delta);
                prop_assert!(h.current() <= h.max());
            }
        }
    }
}
