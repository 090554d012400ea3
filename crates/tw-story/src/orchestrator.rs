//! Turn orchestration: run the routed generators in order and stitch their
//! output into one narrative.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::narrative::{GenerationRequest, MomentSignal, NarrativeGenerator};
use crate::pacing::PacingPhase;
use crate::router::{GeneratorRole, RoutingDecision};

/// Text used in place of a generator that failed.
pub const FALLBACK_TEXT: &str =
    "The storyteller loses the thread for a moment. (Something went wrong; the tale goes on.)";

/// Most follow-on choices offered after a turn.
pub const MAX_CHOICES: usize = 4;

/// Everything the generators need to know about the session this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnContext {
    /// Adventure turn being played.
    pub turn: u32,
    /// One-line character summary.
    pub character: String,
    /// Active quest title and progress, if any.
    pub quest: Option<String>,
    /// Recent conversation transcript.
    pub history: String,
    /// Mechanical results and other facts to honor.
    pub facts: Vec<String>,
    /// Tone hint.
    pub pacing: PacingPhase,
    /// Tone hint in `[0, 1]`.
    pub urgency: f64,
}

impl TurnContext {
    /// Render the context as plain text for a generator prompt.
    pub fn render(&self) -> String {
        let mut out = format!("Turn {} ({})\nCharacter: {}", self.turn, self.pacing, self.character);
        if let Some(quest) = &self.quest {
            out.push_str(&format!("\nQuest: {quest}"));
        }
        if !self.history.is_empty() {
            out.push_str(&format!("\nRecent:\n{}", self.history));
        }
        out
    }
}

/// One generator's contribution to a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSegment {
    /// Who produced it.
    pub role: GeneratorRole,
    /// The text (the fallback text if the call failed).
    pub text: String,
    /// Whether the call failed.
    pub failed: bool,
}

/// The combined output of all generators for one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnNarrative {
    /// Segments in routing order.
    pub segments: Vec<NarrativeSegment>,
    /// Follow-on choices, de-duplicated, in routing order.
    pub choices: Vec<String>,
    /// Moments the generators asked to record.
    pub moments: Vec<MomentSignal>,
}

impl TurnNarrative {
    /// All segment texts joined by blank lines.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Roles that were invoked, in order.
    pub fn invoked(&self) -> Vec<GeneratorRole> {
        self.segments.iter().map(|s| s.role).collect()
    }

    /// Whether any generator failed.
    pub fn had_failures(&self) -> bool {
        self.segments.iter().any(|s| s.failed)
    }
}

/// Runs generators for a routed turn.
#[derive(Clone)]
pub struct TurnOrchestrator {
    generator: Arc<dyn NarrativeGenerator>,
}

impl std::fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOrchestrator").finish_non_exhaustive()
    }
}

impl TurnOrchestrator {
    /// Create an orchestrator over a generator.
    pub fn new(generator: Arc<dyn NarrativeGenerator>) -> Self {
        Self { generator }
    }

    /// Invoke each routed generator in order.
    ///
    /// Each call sees the rendered context plus the text of every earlier
    /// generator this turn. A failed call contributes [`FALLBACK_TEXT`] and
    /// the turn carries on.
    pub async fn execute(
        &self,
        action: &str,
        decision: &RoutingDecision,
        context: &TurnContext,
    ) -> TurnNarrative {
        let base = context.render();
        let mut narrative = TurnNarrative::default();

        for &role in &decision.generators {
            let mut prompt = base.clone();
            for earlier in &narrative.segments {
                prompt.push_str(&format!("\n[{}] {}", earlier.role, earlier.text));
            }
            let request = GenerationRequest {
                role,
                mode: decision.mode,
                action: action.to_string(),
                context: prompt,
                facts: context.facts.clone(),
                pacing: context.pacing,
                urgency: context.urgency,
            };

            match self.generator.generate(&request).await {
                Ok(output) => {
                    for choice in output.choices {
                        if narrative.choices.len() < MAX_CHOICES
                            && !narrative.choices.contains(&choice)
                        {
                            narrative.choices.push(choice);
                        }
                    }
                    narrative.moments.extend(output.moment);
                    narrative.segments.push(NarrativeSegment {
                        role,
                        text: output.text,
                        failed: false,
                    });
                }
                Err(err) => {
                    tracing::warn!(%role, error = %err, "generator failed, using fallback text");
                    narrative.segments.push(NarrativeSegment {
                        role,
                        text: FALLBACK_TEXT.to_string(),
                        failed: true,
                    });
                }
            }
        }
        narrative
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::moments::MomentKind;
    use crate::narrative::{GenerationFailure, GeneratorOutput};
    use crate::router::RouteMode;

    /// Echoes the role and records every request it sees.
    #[derive(Default)]
    struct EchoGenerator {
        fail_on: Option<GeneratorRole>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl NarrativeGenerator for EchoGenerator {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GeneratorOutput, GenerationFailure> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail_on == Some(request.role) {
                return Err(GenerationFailure::Timeout);
            }
            let mut out = GeneratorOutput::text(format!("{} speaks", request.role))
                .with_choices(["Look around", "Press onward"]);
            if request.role == GeneratorRole::Wildcard {
                out = out.with_moment(MomentSignal::new(MomentKind::TurningPoint, "odd omen"));
            }
            Ok(out)
        }
    }

    fn context() -> TurnContext {
        TurnContext {
            turn: 3,
            character: "Kael, a knight".to_string(),
            quest: Some("The Lost Amulet (0/1)".to_string()),
            history: "Player: look around".to_string(),
            facts: vec!["d20 [15]".to_string()],
            pacing: PacingPhase::Setup,
            urgency: 0.06,
        }
    }

    fn decision(generators: Vec<GeneratorRole>) -> RoutingDecision {
        RoutingDecision {
            mode: RouteMode::Exploration,
            wildcard: generators.contains(&GeneratorRole::Wildcard),
            generators,
        }
    }

    #[tokio::test]
    async fn concatenates_in_routing_order() {
        let generator = Arc::new(EchoGenerator::default());
        let orchestrator = TurnOrchestrator::new(generator.clone());
        let d = decision(vec![GeneratorRole::Narrator, GeneratorRole::Wildcard]);
        let narrative = orchestrator.execute("look", &d, &context()).await;

        assert_eq!(narrative.text(), "narrator speaks\n\nwildcard speaks");
        assert_eq!(narrative.invoked(), d.generators);
        assert_eq!(narrative.choices, vec!["Look around", "Press onward"]);
        assert_eq!(narrative.moments.len(), 1);
        assert!(!narrative.had_failures());
    }

    #[tokio::test]
    async fn later_generators_see_earlier_output() {
        let generator = Arc::new(EchoGenerator::default());
        let orchestrator = TurnOrchestrator::new(generator.clone());
        let d = decision(vec![GeneratorRole::Mechanics, GeneratorRole::Narrator]);
        orchestrator.execute("swing", &d, &context()).await;

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(!seen[0].context.contains("[mechanics]"));
        assert!(seen[1].context.contains("[mechanics] mechanics speaks"));
        assert!(seen[1].context.contains("Character: Kael, a knight"));
        assert_eq!(seen[1].facts, vec!["d20 [15]"]);
    }

    #[tokio::test]
    async fn failure_uses_fallback_and_continues() {
        let generator = Arc::new(EchoGenerator {
            fail_on: Some(GeneratorRole::Narrator),
            ..EchoGenerator::default()
        });
        let orchestrator = TurnOrchestrator::new(generator);
        let d = decision(vec![GeneratorRole::Narrator, GeneratorRole::Mechanics]);
        let narrative = orchestrator.execute("roll", &d, &context()).await;

        assert!(narrative.had_failures());
        assert_eq!(narrative.segments[0].text, FALLBACK_TEXT);
        assert_eq!(narrative.segments[1].text, "mechanics speaks");
    }

    #[test]
    fn render_includes_quest_and_history() {
        let text = context().render();
        assert!(text.starts_with("Turn 3 (setup)"));
        assert!(text.contains("Quest: The Lost Amulet (0/1)"));
        assert!(text.contains("Recent:\nPlayer: look around"));
    }
}
