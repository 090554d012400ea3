//! Keyword-based detection of objective completion.
//!
//! An objective counts as met when the combined action and narrative text
//! contains a completion verb and at least one content word from the
//! objective's description. Misses are acceptable; false positives are not.

use serde::{Deserialize, Serialize};

use super::{Quest, QuestStatus};

/// Verbs that signal something was finished.
pub const COMPLETION_VERBS: &[&str] = &[
    "found",
    "defeated",
    "recovered",
    "rescued",
    "retrieved",
    "delivered",
    "destroyed",
    "completed",
    "discovered",
    "obtained",
    "slain",
    "killed",
    "defeat",
    "escorted",
    "collected",
    "reached",
];

/// Long words too common to identify an objective.
const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "their", "there", "these", "those", "which", "where", "while",
    "would", "could", "should", "other", "before", "under",
];

/// What changed when a quest was advanced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    /// Objectives that received progress this turn.
    pub progressed: Vec<String>,
    /// Objectives that became complete this turn.
    pub newly_completed: Vec<String>,
    /// Whether the quest as a whole completed this turn.
    pub quest_completed: bool,
}

impl QuestProgress {
    /// True if nothing moved.
    pub fn is_empty(&self) -> bool {
        self.progressed.is_empty()
    }
}

/// Words of an objective description that can identify it in prose.
pub fn content_words(description: &str) -> Vec<String> {
    words(&description.to_lowercase())
        .filter(|w| w.chars().count() > 4 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Whether the texts indicate the objective was met.
///
/// Verbs must appear as whole words; content words may appear inside longer
/// words so that plurals still match.
pub fn detect_completion(objective_description: &str, action: &str, narrative: &str) -> bool {
    let combined = format!("{action} {narrative}").to_lowercase();
    let has_verb = words(&combined).any(|w| COMPLETION_VERBS.contains(&w));
    if !has_verb {
        return false;
    }
    content_words(objective_description)
        .iter()
        .any(|w| combined.contains(w.as_str()))
}

/// Check every open objective of an active quest against this turn's texts.
///
/// Counted objectives move one step per matching turn. When the last
/// objective completes the quest is marked completed.
pub fn advance(quest: &mut Quest, action: &str, narrative: &str) -> QuestProgress {
    let mut progress = QuestProgress::default();
    if quest.status != QuestStatus::Active {
        return progress;
    }

    for obj in quest.objectives.iter_mut().filter(|o| !o.completed) {
        if !detect_completion(&obj.description, action, narrative) {
            continue;
        }
        progress.progressed.push(obj.id.clone());
        if obj.record_progress() {
            progress.newly_completed.push(obj.id.clone());
        }
    }

    if quest.all_objectives_done() {
        quest.status = QuestStatus::Completed;
        progress.quest_completed = true;
        tracing::info!(quest = %quest.title, "quest completed");
    }
    progress
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amulet_quest() -> Quest {
        Quest::new("The Lost Amulet", "", "Widow Marra")
            .with_objective("Recover the silver amulet")
            .with_objective("Return to the village")
    }

    #[test]
    fn content_words_skip_short_and_common() {
        let words = content_words("Find the amulet which lies under their chapel");
        assert_eq!(words, vec!["amulet", "chapel"]);
    }

    #[test]
    fn verb_and_content_word_required() {
        let desc = "Recover the silver amulet";
        assert!(detect_completion(desc, "search", "You found the amulet!"));
        assert!(!detect_completion(desc, "search", "You see an amulet on the altar."));
        assert!(!detect_completion(desc, "search", "You found a rusty key."));
    }

    #[test]
    fn verbs_match_whole_words_only() {
        let desc = "Recover the silver amulet";
        assert!(!detect_completion(desc, "", "The amulet's foundation is cracked."));
    }

    #[test]
    fn content_words_match_plurals() {
        assert!(detect_completion(
            "Destroy the goblin totem",
            "",
            "Both totems are destroyed."
        ));
    }

    #[test]
    fn action_text_counts_too() {
        assert!(detect_completion(
            "Recover the silver amulet",
            "I have recovered it",
            "The silver gleams in your palm."
        ));
    }

    #[test]
    fn advance_marks_only_matching_objectives() {
        let mut quest = amulet_quest();
        let progress = advance(&mut quest, "search the altar", "You found the silver amulet.");
        assert_eq!(progress.newly_completed, vec!["obj-1"]);
        assert!(!progress.quest_completed);
        assert_eq!(quest.status, QuestStatus::Active);
    }

    #[test]
    fn advance_completes_quest() {
        let mut quest = amulet_quest();
        advance(&mut quest, "", "You found the silver amulet.");
        let progress = advance(&mut quest, "walk home", "At dusk you reached the village gate.");
        assert!(progress.quest_completed);
        assert!(quest.is_completed());
    }

    #[test]
    fn counted_objective_increments() {
        let mut quest =
            Quest::new("Wolf Cull", "", "Hunter").with_counted_objective("Slay three wolves", 3);
        let first = advance(&mut quest, "", "The wolves are slain.");
        assert_eq!(first.progressed, vec!["obj-1"]);
        assert!(first.newly_completed.is_empty());
        assert_eq!(quest.objectives[0].current_count, 1);
        advance(&mut quest, "", "More wolves slain.");
        let last = advance(&mut quest, "", "The final wolves are slain.");
        assert!(last.quest_completed);
    }

    #[test]
    fn inactive_quest_is_untouched() {
        let mut quest = amulet_quest();
        quest.status = QuestStatus::Abandoned;
        let progress = advance(&mut quest, "", "You found the silver amulet.");
        assert!(progress.is_empty());
        assert!(!quest.objectives[0].completed);
    }
}
