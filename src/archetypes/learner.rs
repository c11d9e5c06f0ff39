//! Conversation learner — post-turn distillation of successful dialogues
//! into new or updated archetypes.
//!
//! Runs as a detached task after the reply has gone out; its failures are
//! logged, never surfaced to the user.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::archetypes::ConversationArchetype;
use crate::archetypes::library::ArchetypeLibrary;
use crate::context::ConversationContext;
use crate::utilities::string_utils::{tokenize, word_count};

/// Ratings above this count as a success observation.
const SUCCESS_RATING_THRESHOLD: f64 = 0.6;
/// Maximum entry cues distilled from the opening user message.
const MAX_ENTRY_CUES: usize = 10;

/// Emotion labels detectable in user turns, with their marker words.
/// Mirrors the affect analyzer's emotion dimensions.
const ARC_EMOTIONS: &[(&str, &[&str])] = &[
    ("Overwhelm", &["overwhelmed", "overwhelming", "drowning", "too much"]),
    ("Anxiety", &["anxious", "anxiety", "nervous", "worried", "racing"]),
    ("Grief", &["grief", "mourning", "loss", "sad"]),
    ("Anger", &["angry", "frustrated", "rage", "furious"]),
    ("Relief", &["relief", "relieved", "lighter", "calmer", "better"]),
    ("Joy", &["happy", "joy", "excited", "grateful"]),
];

const STOPWORDS: &[&str] = &[
    "the", "and", "that", "this", "with", "have", "been", "just", "like", "about",
    "what", "when", "where", "really", "very", "feel", "feeling", "because",
];

/// Distills archetype candidates from recent dialogue.
pub struct ConversationLearner {
    library: Arc<ArchetypeLibrary>,
}

impl ConversationLearner {
    pub fn new(library: Arc<ArchetypeLibrary>) -> Self {
        Self { library }
    }

    /// Analyze the dialogue and fold the distilled candidate into the
    /// library. Returns the candidate's name when one was learned.
    pub fn analyze(
        &self,
        context: &ConversationContext,
        rating: Option<f64>,
    ) -> anyhow::Result<Option<String>> {
        let candidate = match self.extract_candidate(context) {
            Some(c) => c,
            None => return Ok(None),
        };
        let name = candidate.name.clone();
        let success = rating.map(|r| r > SUCCESS_RATING_THRESHOLD);
        self.library.upsert(candidate, success)?;
        Ok(Some(name))
    }

    /// Build an archetype candidate from the dialogue, or `None` when the
    /// dialogue shows no distinct emotional arc worth distilling.
    pub fn extract_candidate(
        &self,
        context: &ConversationContext,
    ) -> Option<ConversationArchetype> {
        let user_turns = context.user_turns();
        if user_turns.len() < 2 {
            return None;
        }

        let start = detect_emotion(&user_turns.first()?.text)?;
        let end = detect_emotion(&user_turns.last()?.text)?;
        if start == end {
            return None;
        }

        let mut archetype = ConversationArchetype::new(format!("{start}To{end}"));
        archetype.entry_cues = entry_cues(&user_turns.first()?.text);

        let assistant_turns = context.assistant_turns();
        archetype.response_principles = response_principles(&assistant_turns);
        archetype.continuity_bridges = continuity_bridges(&assistant_turns);
        archetype.tone_guidelines = tone_guidelines(context, &assistant_turns);

        Some(archetype)
    }
}

/// First detectable emotion label in `text`.
fn detect_emotion(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    ARC_EMOTIONS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| lowered.contains(m)))
        .map(|(label, _)| *label)
}

/// Up to ten unique cue keywords from the opening user message.
fn entry_cues(text: &str) -> BTreeSet<String> {
    let mut cues = BTreeSet::new();
    for token in tokenize(text) {
        if token.len() > 3 && !STOPWORDS.contains(&token.as_str()) {
            cues.insert(token);
            if cues.len() == MAX_ENTRY_CUES {
                break;
            }
        }
    }
    cues
}

/// Response principles inferred from patterns in assistant turns.
fn response_principles(assistant_turns: &[&crate::context::Turn]) -> Vec<String> {
    let mut principles = Vec::new();
    let mut add = |p: &str| {
        let p = p.to_string();
        if !principles.contains(&p) {
            principles.push(p);
        }
    };

    for turn in assistant_turns {
        let lowered = turn.text.to_lowercase();
        if ["that makes sense", "i hear", "that sounds", "of course you"]
            .iter()
            .any(|m| lowered.contains(m))
        {
            add("validate-first");
        }
        if ["both", "and also", "at the same time", "alongside"]
            .iter()
            .any(|m| lowered.contains(m))
        {
            add("balance-mixed");
        }
        if turn.text.trim_end().ends_with('?') {
            add("invite-elaboration");
        }
        if word_count(&turn.text) < 15 {
            add("create-space");
        }
    }
    principles
}

/// Continuity bridges inferred from cross-reference markers.
fn continuity_bridges(assistant_turns: &[&crate::context::Turn]) -> Vec<String> {
    let markers = ["earlier", "you mentioned", "you said", "before", "last time"];
    let references = assistant_turns
        .iter()
        .any(|t| markers.iter().any(|m| t.text.to_lowercase().contains(m)));
    if references {
        vec!["reference-prior-thread".to_string()]
    } else {
        Vec::new()
    }
}

/// Tone guidelines from style markers in assistant turns.
fn tone_guidelines(
    context: &ConversationContext,
    assistant_turns: &[&crate::context::Turn],
) -> Vec<String> {
    let mut guidelines = Vec::new();
    let assistant_text: String = assistant_turns
        .iter()
        .map(|t| t.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    if ["with you", "here with", "alongside", "right here"]
        .iter()
        .any(|m| assistant_text.contains(m))
    {
        guidelines.push("warm-language".to_string());
    }

    // Metaphor mirroring: assistant reuses a marked user phrase.
    let user_metaphors: Vec<String> = context
        .user_turns()
        .iter()
        .flat_map(|t| crate::generator::concepts::capture_metaphors(&t.text))
        .collect();
    if user_metaphors
        .iter()
        .any(|m| assistant_text.contains(&m.to_lowercase()))
    {
        guidelines.push("mirror-metaphor".to_string());
    }

    let total_words: usize = assistant_turns.iter().map(|t| word_count(&t.text)).sum();
    if !assistant_turns.is_empty() && total_words / assistant_turns.len() <= 25 {
        guidelines.push("gentle-pacing".to_string());
    }

    guidelines
}
