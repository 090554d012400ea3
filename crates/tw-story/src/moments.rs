//! Adventure moments: the highlights an epilogue draws on.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a memorable moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MomentKind {
    /// An enemy was beaten.
    CombatVictory,
    /// The player fell.
    CombatDefeat,
    /// The player got away from a fight.
    Escape,
    /// Something was found or learned.
    Discovery,
    /// The story changed direction.
    TurningPoint,
    /// A quest was finished.
    QuestComplete,
    /// A fight began.
    Encounter,
    /// A notable conversation.
    Dialogue,
}

impl MomentKind {
    /// Significance used when a caller does not supply one.
    pub fn default_significance(self) -> f64 {
        match self {
            Self::CombatDefeat => 1.0,
            Self::QuestComplete => 0.9,
            Self::TurningPoint => 0.8,
            Self::CombatVictory => 0.7,
            Self::Discovery => 0.6,
            Self::Escape => 0.5,
            Self::Encounter => 0.4,
            Self::Dialogue => 0.3,
        }
    }

    /// Parse a tag such as "discovery" or "combat-victory".
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized: String = tag
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "combatvictory" | "victory" => Some(Self::CombatVictory),
            "combatdefeat" | "defeat" => Some(Self::CombatDefeat),
            "escape" => Some(Self::Escape),
            "discovery" => Some(Self::Discovery),
            "turningpoint" => Some(Self::TurningPoint),
            "questcomplete" => Some(Self::QuestComplete),
            "encounter" => Some(Self::Encounter),
            "dialogue" => Some(Self::Dialogue),
            _ => None,
        }
    }
}

impl std::fmt::Display for MomentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::CombatVictory => "combat-victory",
            Self::CombatDefeat => "combat-defeat",
            Self::Escape => "escape",
            Self::Discovery => "discovery",
            Self::TurningPoint => "turning-point",
            Self::QuestComplete => "quest-complete",
            Self::Encounter => "encounter",
            Self::Dialogue => "dialogue",
        };
        f.write_str(tag)
    }
}

/// An immutable record of something memorable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdventureMoment {
    turn: u32,
    kind: MomentKind,
    summary: String,
    significance: f64,
    recorded_at: DateTime<Utc>,
}

impl AdventureMoment {
    /// Record a moment. Significance is clamped to `[0, 1]`.
    pub fn new(turn: u32, kind: MomentKind, summary: impl Into<String>, significance: f64) -> Self {
        let significance = if significance.is_nan() {
            kind.default_significance()
        } else {
            significance.clamp(0.0, 1.0)
        };
        Self {
            turn,
            kind,
            summary: summary.into(),
            significance,
            recorded_at: Utc::now(),
        }
    }

    /// Turn the moment happened on.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Category.
    pub fn kind(&self) -> MomentKind {
        self.kind
    }

    /// One-line description.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Weight in `[0, 1]`.
    pub fn significance(&self) -> f64 {
        self.significance
    }

    /// Wall-clock time of recording.
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

impl std::fmt::Display for AdventureMoment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Turn {} [{}]: {}", self.turn, self.kind, self.summary)
    }
}

/// Bounded collection of moments, most significant first.
///
/// Among equal significance the more recent moment sorts first. When the
/// log is full the least significant moment is dropped, the oldest one if
/// several tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentLog {
    moments: Vec<AdventureMoment>,
    limit: usize,
}

impl Default for MomentLog {
    fn default() -> Self {
        Self::new(15)
    }
}

impl MomentLog {
    /// Create an empty log holding at most `limit` moments.
    pub fn new(limit: usize) -> Self {
        Self {
            moments: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Add a moment. Returns false if it ranked too low to be kept.
    pub fn push(&mut self, moment: AdventureMoment) -> bool {
        let pos = self
            .moments
            .iter()
            .position(|existing| ranks_ahead(&moment, existing))
            .unwrap_or(self.moments.len());
        if pos >= self.limit {
            return false;
        }
        self.moments.insert(pos, moment);
        self.moments.truncate(self.limit);
        true
    }

    /// All moments, most significant first.
    pub fn moments(&self) -> &[AdventureMoment] {
        &self.moments
    }

    /// The `n` most significant moments.
    pub fn top(&self, n: usize) -> &[AdventureMoment] {
        &self.moments[..n.min(self.moments.len())]
    }

    /// Number of stored moments.
    pub fn len(&self) -> usize {
        self.moments.len()
    }

    /// Whether no moments are stored.
    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// Capacity.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Whether a new moment sorts ahead of an existing one.
fn ranks_ahead(new: &AdventureMoment, existing: &AdventureMoment) -> bool {
    match new.significance.total_cmp(&existing.significance) {
        Ordering::Greater => true,
        Ordering::Equal => new.turn >= existing.turn,
        Ordering::Less => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moment(turn: u32, significance: f64) -> AdventureMoment {
        AdventureMoment::new(turn, MomentKind::Discovery, format!("turn {turn}"), significance)
    }

    #[test]
    fn significance_is_clamped() {
        assert!((moment(1, 4.0).significance() - 1.0).abs() < f64::EPSILON);
        assert!(moment(1, -1.0).significance().abs() < f64::EPSILON);
        let nan = AdventureMoment::new(1, MomentKind::Escape, "ran", f64::NAN);
        assert!((nan.significance() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ordered_by_significance_then_recency() {
        let mut log = MomentLog::new(10);
        log.push(moment(1, 0.5));
        log.push(moment(2, 0.9));
        log.push(moment(3, 0.5));
        let turns: Vec<u32> = log.moments().iter().map(AdventureMoment::turn).collect();
        assert_eq!(turns, vec![2, 3, 1]);
    }

    #[test]
    fn cap_evicts_lowest_then_oldest() {
        let mut log = MomentLog::new(3);
        log.push(moment(1, 0.3));
        log.push(moment(2, 0.3));
        log.push(moment(3, 0.8));
        assert!(log.push(moment(4, 0.6)));
        assert_eq!(log.len(), 3);
        let turns: Vec<u32> = log.moments().iter().map(AdventureMoment::turn).collect();
        assert_eq!(turns, vec![3, 4, 2]);
    }

    #[test]
    fn low_moment_rejected_when_full() {
        let mut log = MomentLog::new(2);
        log.push(moment(1, 0.9));
        log.push(moment(2, 0.8));
        assert!(!log.push(moment(3, 0.1)));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn never_exceeds_fifteen_by_default() {
        let mut log = MomentLog::default();
        for turn in 0..40 {
            log.push(moment(turn, f64::from(turn % 7) / 7.0));
        }
        assert_eq!(log.len(), 15);
        assert_eq!(log.limit(), 15);
        let sigs: Vec<f64> = log.moments().iter().map(AdventureMoment::significance).collect();
        assert!(sigs.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn kind_tags() {
        assert_eq!(MomentKind::parse("combat-victory"), Some(MomentKind::CombatVictory));
        assert_eq!(MomentKind::parse("Turning Point"), Some(MomentKind::TurningPoint));
        assert_eq!(MomentKind::parse("nonsense"), None);
        assert_eq!(MomentKind::QuestComplete.to_string(), "quest-complete");
    }

    #[test]
    fn top_is_bounded() {
        let mut log = MomentLog::new(5);
        log.push(moment(1, 0.2));
        assert_eq!(log.top(3).len(), 1);
        assert!(log.top(0).is_empty());
    }
}
