//! Turn routing: which generators speak this turn, and in what order.
//!
//! The wildcard generator joins a turn only when two independent checks
//! both pass: a probability draw for the current mode, and a cooldown that
//! keeps it out while it is among the most recent invocations.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::phase::GamePhase;

/// Words that call for a mechanics pass (matched as whole words).
pub const MECHANICAL_KEYWORDS: &[&str] = &[
    "attack", "fight", "roll", "cast", "defend", "dodge", "swing", "shoot",
];

/// Words that mark an action as conversation.
pub const DIALOGUE_KEYWORDS: &[&str] = &[
    "say", "says", "ask", "asks", "tell", "talk", "speak", "greet", "reply", "answer", "shout",
    "whisper", "persuade", "bargain", "haggle",
];

/// A narrative generator role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorRole {
    /// Main storyteller.
    Narrator,
    /// Explains rolls and combat results.
    Mechanics,
    /// Occasional surprise or comic relief.
    Wildcard,
    /// Closing summary of the whole adventure.
    Epilogue,
}

impl std::fmt::Display for GeneratorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Narrator => write!(f, "narrator"),
            Self::Mechanics => write!(f, "mechanics"),
            Self::Wildcard => write!(f, "wildcard"),
            Self::Epilogue => write!(f, "epilogue"),
        }
    }
}

/// The kind of turn being routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteMode {
    /// Free exploration.
    Exploration,
    /// Talking to someone.
    Dialogue,
    /// A combat round.
    Combat,
}

impl RouteMode {
    /// Pick the mode for an action in the given gameplay phase.
    pub fn detect(phase: GamePhase, action: &str) -> Self {
        if phase == GamePhase::Combat {
            Self::Combat
        } else if contains_any_word(action, DIALOGUE_KEYWORDS) {
            Self::Dialogue
        } else {
            Self::Exploration
        }
    }
}

impl std::fmt::Display for RouteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exploration => write!(f, "exploration"),
            Self::Dialogue => write!(f, "dialogue"),
            Self::Combat => write!(f, "combat"),
        }
    }
}

/// Wildcard probabilities per mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WildcardOdds {
    /// Probability while exploring.
    pub exploration: f64,
    /// Probability during dialogue.
    pub dialogue: f64,
}

impl Default for WildcardOdds {
    fn default() -> Self {
        Self {
            exploration: 0.15,
            dialogue: 0.10,
        }
    }
}

impl WildcardOdds {
    /// Odds taken from a session config.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            exploration: config.wildcard_exploration,
            dialogue: config.wildcard_dialogue,
        }
    }

    /// Probability for a mode. Combat never gets a wildcard.
    pub fn for_mode(&self, mode: RouteMode) -> f64 {
        match mode {
            RouteMode::Exploration => self.exploration,
            RouteMode::Dialogue => self.dialogue,
            RouteMode::Combat => 0.0,
        }
    }
}

/// The most recent generator invocations, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentGenerators {
    roles: VecDeque<GeneratorRole>,
    window: usize,
}

impl Default for RecentGenerators {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RecentGenerators {
    /// Create an empty buffer remembering `window` invocations.
    pub fn new(window: usize) -> Self {
        Self {
            roles: VecDeque::new(),
            window: window.max(1),
        }
    }

    /// Record one invocation.
    pub fn record(&mut self, role: GeneratorRole) {
        self.roles.push_back(role);
        while self.roles.len() > self.window {
            self.roles.pop_front();
        }
    }

    /// Record several invocations in order.
    pub fn record_all(&mut self, roles: &[GeneratorRole]) {
        for role in roles {
            self.record(*role);
        }
    }

    /// Whether `role` is among the remembered invocations.
    pub fn contains(&self, role: GeneratorRole) -> bool {
        self.roles.contains(&role)
    }

    /// Remembered invocations, oldest first.
    pub fn roles(&self) -> impl Iterator<Item = GeneratorRole> + '_ {
        self.roles.iter().copied()
    }
}

/// The routing outcome for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Mode the turn was routed in.
    pub mode: RouteMode,
    /// Generators to invoke, in order. Includes the wildcard when chosen.
    pub generators: Vec<GeneratorRole>,
    /// Whether the wildcard was added.
    pub wildcard: bool,
}

impl RoutingDecision {
    /// A decision that invokes exactly one generator.
    pub fn single(mode: RouteMode, role: GeneratorRole) -> Self {
        Self {
            mode,
            generators: vec![role],
            wildcard: role == GeneratorRole::Wildcard,
        }
    }
}

/// Whether the action asks for mechanics (whole-word, case-insensitive).
pub fn has_mechanical_keyword(action: &str) -> bool {
    contains_any_word(action, MECHANICAL_KEYWORDS)
}

/// The probability half of the wildcard check.
pub fn wildcard_draw_passes(probability: f64, draw: f64) -> bool {
    draw < probability
}

/// The cooldown half of the wildcard check.
pub fn wildcard_on_cooldown(recent: &RecentGenerators) -> bool {
    recent.contains(GeneratorRole::Wildcard)
}

/// Decide the generators for a turn.
///
/// `draw` is a uniform value in `[0, 1)` supplied by the caller's roll
/// source.
pub fn route(
    action: &str,
    mode: RouteMode,
    recent: &RecentGenerators,
    odds: &WildcardOdds,
    draw: f64,
) -> RoutingDecision {
    let mut generators = match mode {
        RouteMode::Combat => vec![GeneratorRole::Mechanics, GeneratorRole::Narrator],
        RouteMode::Exploration | RouteMode::Dialogue => {
            let mut g = vec![GeneratorRole::Narrator];
            if has_mechanical_keyword(action) {
                g.push(GeneratorRole::Mechanics);
            }
            g
        }
    };

    let wildcard =
        wildcard_draw_passes(odds.for_mode(mode), draw) && !wildcard_on_cooldown(recent);
    if wildcard {
        generators.push(GeneratorRole::Wildcard);
    }

    tracing::debug!(%mode, ?generators, wildcard, "turn routed");
    RoutingDecision {
        mode,
        generators,
        wildcard,
    }
}

fn contains_any_word(text: &str, keywords: &[&str]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|w| keywords.iter().any(|k| w.eq_ignore_ascii_case(k)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use super::GeneratorRole::*;

    fn decide(action: &str, mode: RouteMode, draw: f64) -> RoutingDecision {
        route(action, mode, &RecentGenerators::default(), &WildcardOdds::default(), draw)
    }

    #[test]
    fn exploration_is_narrator_only() {
        let d = decide("look around", RouteMode::Exploration, 0.99);
        assert_eq!(d.generators, vec![Narrator]);
        assert!(!d.wildcard);
    }

    #[test]
    fn mechanical_keywords_add_mechanics() {
        let d = decide("I ROLL to climb", RouteMode::Exploration, 0.99);
        assert_eq!(d.generators, vec![Narrator, Mechanics]);
        let d = decide("ask about the castle", RouteMode::Dialogue, 0.99);
        assert_eq!(d.generators, vec![Narrator]);
    }

    #[test]
    fn keywords_match_whole_words() {
        assert!(has_mechanical_keyword("Attack!"));
        assert!(!has_mechanical_keyword("the castle broadcast"));
        assert!(!has_mechanical_keyword("an attacker"));
    }

    #[test]
    fn combat_puts_mechanics_first() {
        let d = decide("swing", RouteMode::Combat, 0.0);
        assert_eq!(d.generators, vec![Mechanics, Narrator]);
        assert!(!d.wildcard);
    }

    #[test]
    fn wildcard_by_mode_probability() {
        let odds = WildcardOdds::default();
        let recent = RecentGenerators::default();
        assert!(route("look", RouteMode::Exploration, &recent, &odds, 0.14).wildcard);
        assert!(!route("look", RouteMode::Exploration, &recent, &odds, 0.15).wildcard);
        assert!(route("say hi", RouteMode::Dialogue, &recent, &odds, 0.09).wildcard);
        assert!(!route("say hi", RouteMode::Dialogue, &recent, &odds, 0.12).wildcard);
    }

    #[test]
    fn wildcard_cooldown() {
        let odds = WildcardOdds::default();
        let mut recent = RecentGenerators::default();
        recent.record(Wildcard);
        assert!(!route("look", RouteMode::Exploration, &recent, &odds, 0.0).wildcard);
        recent.record_all(&[Narrator, Narrator]);
        assert!(!route("look", RouteMode::Exploration, &recent, &odds, 0.0).wildcard);
        recent.record(Narrator);
        assert!(route("look", RouteMode::Exploration, &recent, &odds, 0.0).wildcard);
    }

    #[test]
    fn detect_mode() {
        assert_eq!(RouteMode::detect(GamePhase::Combat, "talk"), RouteMode::Combat);
        assert_eq!(
            RouteMode::detect(GamePhase::Exploration, "Talk to the innkeeper"),
            RouteMode::Dialogue
        );
        assert_eq!(
            RouteMode::detect(GamePhase::Exploration, "open the door"),
            RouteMode::Exploration
        );
    }

    proptest! {
        #[test]
        fn wildcard_never_repeats_within_window(
            draws in proptest::collection::vec(0.0f64..1.0, 1..60),
        ) {
            let odds = WildcardOdds { exploration: 1.0, dialogue: 1.0 };
            let mut recent = RecentGenerators::new(3);
            for draw in draws {
                let cooling = recent.contains(Wildcard);
                let d = route("look", RouteMode::Exploration, &recent, &odds, draw);
                prop_assert!(!(cooling && d.wildcard));
                recent.record_all(&d.generators);
            }
        }
    }
}
