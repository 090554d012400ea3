//! Randomness sources for dice.
//!
//! Every roll in the engine draws from a [`RollSource`]. Production code
//! uses a seeded [`StdRng`]; tests substitute [`ScriptedRolls`] to force
//! specific faces.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of die faces and probability draws.
pub trait RollSource {
    /// Roll one die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;

    /// Draw a probability in `[0, 1)`.
    fn chance(&mut self) -> f64;

    /// Pick an index in `0..len` (0 when `len` is 0).
    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.roll_die(len as u32) - 1) as usize
    }
}

impl RollSource for StdRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.random_range(1..=sides.max(1))
    }

    fn chance(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// A scripted roll source that replays preset values.
///
/// Faces are consumed in order and clamped into `1..=sides`; chances are
/// consumed in order and clamped into `[0, 1)`. Once a script runs dry the
/// source falls back to a fixed-seed RNG, so extra draws stay deterministic.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    faces: VecDeque<u32>,
    chances: VecDeque<f64>,
    fallback: StdRng,
}

impl ScriptedRolls {
    /// Create a source that returns the given faces in order.
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            chances: VecDeque::new(),
            fallback: StdRng::seed_from_u64(0),
        }
    }

    /// Script the probability draws as well.
    pub fn with_chances(mut self, chances: impl IntoIterator<Item = f64>) -> Self {
        self.chances = chances.into_iter().collect();
        self
    }

    /// Append more faces to the end of the script.
    pub fn push_faces(&mut self, faces: impl IntoIterator<Item = u32>) {
        self.faces.extend(faces);
    }

    /// Number of scripted faces not yet consumed.
    pub fn remaining_faces(&self) -> usize {
        self.faces.len()
    }
}

impl RollSource for ScriptedRolls {
    fn roll_die(&mut self, sides: u32) -> u32 {
        match self.faces.pop_front() {
            Some(face) => face.clamp(1, sides.max(1)),
            None => self.fallback.roll_die(sides),
        }
    }

    fn chance(&mut self) -> f64 {
        match self.chances.pop_front() {
            Some(p) => p.clamp(0.0, 1.0 - f64::EPSILON),
            None => self.fallback.chance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_rng_faces_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            assert!((1..=6).contains(&rng.roll_die(6)));
            let p = RollSource::chance(&mut rng);
            assert!((0.0..1.0).contains(&p));
        }
    }

    #[test]
    fn std_rng_deterministic_with_seed() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(a.roll_die(20), b.roll_die(20));
        }
    }

    #[test]
    fn scripted_faces_in_order_then_fallback() {
        let mut s = ScriptedRolls::new([15, 4]);
        assert_eq!(s.remaining_faces(), 2);
        assert_eq!(s.roll_die(20), 15);
        assert_eq!(s.roll_die(6), 4);
        assert_eq!(s.remaining_faces(), 0);
        assert!((1..=6).contains(&s.roll_die(6)));
    }

    #[test]
    fn scripted_faces_clamped() {
        let mut s = ScriptedRolls::new([30, 0]);
        assert_eq!(s.roll_die(20), 20);
        assert_eq!(s.roll_die(20), 1);
    }

    #[test]
    fn scripted_chances() {
        let mut s = ScriptedRolls::new([]).with_chances([0.05, 2.0]);
        assert!((s.chance() - 0.05).abs() < f64::EPSILON);
        assert!(s.chance() < 1.0);
    }

    #[test]
    fn pick_uses_faces() {
        let mut s = ScriptedRolls::new([3]);
        assert_eq!(s.pick(5), 2);
        assert_eq!(s.pick(0), 0);
    }
}
