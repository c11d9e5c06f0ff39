//! Concept extraction and tone classification for response generation.
//!
//! A small taxonomy captures what the user is actually talking about; the
//! generator may only name these captured concepts, never introduce its
//! own. Metaphors are captured verbatim so they can be mirrored — and only
//! mirrored.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utilities::string_utils::token_set;

static METAPHOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:like|as if|as though)\s+([^,.!?\n]{3,60})").unwrap());

/// Emotional-state labels in the taxonomy.
pub const EMOTIONAL_STATES: &[(&str, &[&str])] = &[
    ("overwhelm", &["overwhelmed", "overwhelming", "drowning", "too", "much"]),
    ("stress", &["stressed", "stress", "pressure", "deadline", "exhausted"]),
    ("relief", &["relief", "relieved", "lighter", "calmer", "easier"]),
    ("meaning", &["meaning", "purpose", "point", "matters", "why"]),
    ("connection", &["connection", "connected", "belong", "close", "together"]),
];

const WORK_WORDS: &[&str] = &["work", "job", "boss", "career", "office", "deadline", "meeting", "coworker"];
const VALUES_WORDS: &[&str] = &["values", "believe", "identity", "who", "integrity", "myself", "authentic"];
const RELATIONSHIP_WORDS: &[&str] = &["partner", "friend", "family", "mother", "father", "relationship", "marriage", "lonely"];
const CREATIVE_WORDS: &[&str] = &["creative", "writing", "painting", "music", "art", "project", "dream", "different", "instead"];

/// Concepts extracted from one user utterance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConcepts {
    /// Matched emotional-state labels.
    pub emotional_states: BTreeSet<String>,
    pub work_related: bool,
    pub values_identity: bool,
    pub relationships_connection: bool,
    pub creative_alternative: bool,
    /// Verbatim metaphor phrases captured from the user's own words.
    pub metaphors: Vec<String>,
}

impl UserConcepts {
    pub fn is_empty(&self) -> bool {
        self.emotional_states.is_empty()
            && !self.work_related
            && !self.values_identity
            && !self.relationships_connection
            && !self.creative_alternative
            && self.metaphors.is_empty()
    }
}

/// Extract the concept taxonomy from `text`.
pub fn extract_concepts(text: &str) -> UserConcepts {
    let tokens = token_set(text);
    let has_any = |words: &[&str]| words.iter().any(|w| tokens.contains(*w));

    let emotional_states = EMOTIONAL_STATES
        .iter()
        .filter(|(_, words)| has_any(words))
        .map(|(label, _)| label.to_string())
        .collect();

    UserConcepts {
        emotional_states,
        work_related: has_any(WORK_WORDS),
        values_identity: has_any(VALUES_WORDS),
        relationships_connection: has_any(RELATIONSHIP_WORDS),
        creative_alternative: has_any(CREATIVE_WORDS),
        metaphors: capture_metaphors(text),
    }
}

/// Capture verbatim metaphor phrases: `(like|as if|as though) <phrase>`.
pub fn capture_metaphors(text: &str) -> Vec<String> {
    METAPHOR_PATTERN
        .captures_iter(text)
        .map(|cap| cap[1].trim().to_string())
        .collect()
}

/// Tone classes for pool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Overwhelm,
    Existential,
    Relief,
    Ambivalence,
    Neutral,
}

const TONE_CLUSTERS: &[(Tone, &[&str])] = &[
    (Tone::Overwhelm, &["overwhelmed", "overwhelming", "drowning", "anxious", "panic", "spinning", "racing", "crushing"]),
    (Tone::Existential, &["meaning", "purpose", "point", "pointless", "empty", "why", "death", "existence"]),
    (Tone::Relief, &["relief", "relieved", "lighter", "better", "calmer", "breathe", "easier"]),
    (Tone::Ambivalence, &["but", "torn", "unsure", "conflicted", "maybe", "both", "mixed"]),
];

/// Classify tone by keyword cluster scoring; ties (including the all-zero
/// case) default to neutral.
pub fn classify_tone(text: &str) -> Tone {
    let tokens = token_set(text);
    let mut best = Tone::Neutral;
    let mut best_score = 0usize;
    let mut tied = false;

    for (tone, words) in TONE_CLUSTERS {
        let score = words.iter().filter(|w| tokens.contains(**w)).count();
        if score > best_score {
            best = *tone;
            best_score = score;
            tied = false;
        } else if score == best_score && score > 0 {
            tied = true;
        }
    }

    if best_score == 0 || tied {
        Tone::Neutral
    } else {
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotional_state_detection() {
        let c = extract_concepts("I'm overwhelmed and stressed at work");
        assert!(c.emotional_states.contains("overwhelm"));
        assert!(c.emotional_states.contains("stress"));
        assert!(c.work_related);
    }

    #[test]
    fn test_metaphor_capture_variants() {
        assert_eq!(
            capture_metaphors("I feel like I'm drowning in grief"),
            vec!["I'm drowning in grief"]
        );
        assert_eq!(
            capture_metaphors("it's as if the walls are closing in, you know"),
            vec!["the walls are closing in"]
        );
        assert_eq!(
            capture_metaphors("as though everything went quiet"),
            vec!["everything went quiet"]
        );
        assert!(capture_metaphors("nothing figurative here").is_empty());
    }

    #[test]
    fn test_tone_classification() {
        assert_eq!(classify_tone("I'm overwhelmed and it's crushing me"), Tone::Overwhelm);
        assert_eq!(classify_tone("what's the point of any of this"), Tone::Existential);
        assert_eq!(classify_tone("I can finally breathe, such relief"), Tone::Relief);
        assert_eq!(classify_tone("the weather is fine today"), Tone::Neutral);
    }

    #[test]
    fn test_tone_tie_defaults_to_neutral() {
        // One overwhelm word and one relief word tie at 1.
        assert_eq!(classify_tone("anxious but lighter"), Tone::Neutral);
    }

    #[test]
    fn test_empty_concepts() {
        assert!(extract_concepts("hello there").is_empty());
        assert!(!extract_concepts("my painting project").is_empty());
    }
}
