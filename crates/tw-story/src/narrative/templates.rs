//! Offline template narrator.
//!
//! Produces serviceable narration for every role without an external
//! model. Output is deterministic for a given request, so sessions driven
//! by a seeded roll source replay identically.

use async_trait::async_trait;

use super::{
    GenerationFailure, GenerationRequest, GeneratorOutput, MomentSignal, NarrativeGenerator,
    QuestOptionGenerator,
};
use crate::moments::MomentKind;
use crate::pacing::PacingPhase;
use crate::quest::{Quest, board};
use crate::router::{GeneratorRole, RouteMode};

/// Verbs that send the hero looking for something.
const SEEKING_VERBS: &[&str] = &[
    "search", "seek", "find", "recover", "retrieve", "rescue", "collect", "gather", "deliver",
    "destroy", "track", "hunt", "free", "return", "explore", "follow", "dig", "open",
];

const SCENERY: &[&str] = &[
    "Wind worries at the grass and carries the smell of rain.",
    "Somewhere out of sight, water drips with patient rhythm.",
    "A crooked signpost leans as if it has given up on directions.",
    "Birdsong stops, then starts again, a little warier.",
    "The light slants low and gold through the trees.",
];

const COMBAT_BEATS: &[&str] = &[
    "Steel rings, and both of you look for the next opening.",
    "You circle, boots scraping, each waiting for a mistake.",
    "Breath ragged, you press the fight.",
    "The clash echoes off every stone around you.",
];

const LISTENERS: &[&str] = &[
    "A weathered farmer",
    "The innkeeper",
    "A travelling tinker",
    "An old woman with sharp eyes",
];

const REPLIES: &[&str] = &[
    "Strange things stir out past the old road. Mind yourself.",
    "Ask around the well. People talk more than they should there.",
    "I've heard worse ideas. Not many, mind you.",
    "If you're going that way, go before dark.",
];

const WILDCARD_LINES: &[&str] = &[
    "A crow lands nearby, judges you openly, and leaves unimpressed.",
    "Somewhere, a bard is already getting this story wrong.",
    "Your left boot squeaks. Nobody mentions it. Everybody noticed.",
    "A goat watches from a hilltop with the calm of a creature that has seen it all.",
    "You are briefly certain you left the kettle on. You do not own a kettle.",
];

/// Offline narrator backed by fixed templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateNarrator;

impl TemplateNarrator {
    /// Create a template narrator.
    pub fn new() -> Self {
        Self
    }

    /// Narrate a free-form action.
    fn narrate(&self, request: &GenerationRequest) -> GeneratorOutput {
        let action = second_person(&request.action);
        let seed = variety(&request.action, request.context.len());
        let mut text = format!("{} ", pacing_lead(request.pacing));

        if request.mode == RouteMode::Combat {
            text.push_str(COMBAT_BEATS[seed % COMBAT_BEATS.len()]);
            return GeneratorOutput::text(text).with_choices(["Attack", "Defend", "Flee"]);
        }

        if request.mode == RouteMode::Dialogue {
            let listener = LISTENERS[seed % LISTENERS.len()];
            let reply = REPLIES[(seed / 7) % REPLIES.len()];
            text.push_str(&format!(
                "You {action}. {listener} considers you, then says: \"{reply}\""
            ));
            let mut output = GeneratorOutput::text(text)
                .with_choices(["Ask about the quest", "Thank them and move on"]);
            if seed % 4 == 0 {
                output = output.with_moment(MomentSignal::new(
                    MomentKind::Dialogue,
                    format!("{listener} shared a warning"),
                ));
            }
            return output;
        }

        if starts_with_any(&request.action, SEEKING_VERBS) {
            if seed % 3 == 0 {
                text.push_str(&format!(
                    "You {action}, but nothing turns up yet. {}",
                    SCENERY[seed % SCENERY.len()]
                ));
                return GeneratorOutput::text(text)
                    .with_choices(["Keep searching", "Look around", "Press onward"]);
            }
            text.push_str(&format!(
                "You {action}. It takes patience, but at last you found what you were after."
            ));
            return GeneratorOutput::text(text)
                .with_moment(MomentSignal::new(
                    MomentKind::Discovery,
                    format!("Found something while trying to {action}"),
                ))
                .with_choices(["Look around", "Press onward", "Rest a moment"]);
        }

        text.push_str(&format!("You {action}. {}", SCENERY[seed % SCENERY.len()]));
        GeneratorOutput::text(text).with_choices(["Look around", "Search the area", "Press onward"])
    }

    /// Restate the mechanical facts of the turn.
    fn explain_mechanics(&self, request: &GenerationRequest) -> GeneratorOutput {
        if request.facts.is_empty() {
            return GeneratorOutput::text("No dice were needed this time.");
        }
        GeneratorOutput::text(request.facts.join("\n"))
    }

    fn wildcard(&self, request: &GenerationRequest) -> GeneratorOutput {
        let seed = variety(&request.action, request.facts.len());
        GeneratorOutput::text(WILDCARD_LINES[seed % WILDCARD_LINES.len()])
    }

    fn epilogue(&self, request: &GenerationRequest) -> GeneratorOutput {
        let mut text = String::from("So the tale draws to its close.");
        if request.facts.is_empty() {
            text.push_str(" It was a quiet adventure, and that is its own kind of ending.");
        } else {
            text.push_str(" It will be remembered for:");
            for fact in &request.facts {
                text.push_str(&format!("\n  - {fact}"));
            }
        }
        GeneratorOutput::text(text)
    }
}

#[async_trait]
impl NarrativeGenerator for TemplateNarrator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratorOutput, GenerationFailure> {
        Ok(match request.role {
            GeneratorRole::Narrator => self.narrate(request),
            GeneratorRole::Mechanics => self.explain_mechanics(request),
            GeneratorRole::Wildcard => self.wildcard(request),
            GeneratorRole::Epilogue => self.epilogue(request),
        })
    }
}

#[async_trait]
impl QuestOptionGenerator for TemplateNarrator {
    async fn generate_options(
        &self,
        character_summary: &str,
        _history: &str,
    ) -> Result<Vec<Quest>, GenerationFailure> {
        let offset = variety(character_summary, 0);
        Ok(board::options(offset, 4))
    }
}

fn pacing_lead(pacing: PacingPhase) -> &'static str {
    match pacing {
        PacingPhase::Setup => "The world is still new around you.",
        PacingPhase::Rising => "The road grows less certain.",
        PacingPhase::MidPoint => "You sense you are halfway to something.",
        PacingPhase::Climax => "Everything is coming to a head.",
        PacingPhase::Denouement => "The end of the tale is near.",
    }
}

/// "I search the chest." becomes "search the chest".
fn second_person(action: &str) -> String {
    let trimmed = action.trim().trim_end_matches(['.', '!', '?']);
    let stripped = ["I'll ", "I will ", "I try to ", "I "]
        .iter()
        .find_map(|prefix| {
            trimmed
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &trimmed[prefix.len()..])
        })
        .unwrap_or(trimmed);
    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => "wait".to_string(),
    }
}

fn starts_with_any(action: &str, verbs: &[&str]) -> bool {
    second_person(action)
        .split_whitespace()
        .next()
        .is_some_and(|first| verbs.contains(&first))
}

/// Cheap deterministic spread over the input.
fn variety(text: &str, salt: usize) -> usize {
    text.bytes()
        .fold(salt.wrapping_mul(31).wrapping_add(7), |acc, b| {
            acc.wrapping_mul(31).wrapping_add(usize::from(b))
        })
}
