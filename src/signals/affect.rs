//! Enhanced affect analysis — optional lexical enrichment for Phase 1.
//!
//! Combines a 10-dimension emotion lexicon (anger, anticipation, disgust,
//! fear, joy, sadness, surprise, trust, plus positive/negative sentiment)
//! with a lightweight polarity pass and syntactic cues: negation words,
//! intensifiers, and a sarcasm heuristic. The analyzer is a capability: when
//! absent, the parser runs on lexicon matches alone and the downstream
//! ranking boosts are simply zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::utilities::string_utils::{caps_ratio, tokenize};

/// The ten scored emotion dimensions, in canonical order.
pub const EMOTION_DIMENSIONS: [&str; 10] = [
    "anger",
    "anticipation",
    "disgust",
    "fear",
    "joy",
    "sadness",
    "surprise",
    "trust",
    "positive",
    "negative",
];

/// Per-utterance emotional analysis record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionalAnalysis {
    /// Highest-scoring emotion dimension (excluding positive/negative).
    pub primary_emotion: String,
    /// Valence in [-1, 1].
    pub valence: f64,
    /// Arousal in [0, 1].
    pub arousal: f64,
    /// Dominance in [0, 1].
    pub dominance: f64,
    /// Emotion-lexicon scores (hits / word_count) per dimension.
    pub nrc_scores: HashMap<String, f64>,
    pub negated: bool,
    pub intensified: bool,
    pub sarcasm_likely: bool,
    /// Overall confidence in [0, 1].
    pub overall_confidence: f64,
}

/// Syntactic cues surfaced for glyph-ranking boosts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyntacticCues {
    /// Emotional verb lemmas found in the text.
    pub verbs: Vec<String>,
    /// Emotional noun lemmas.
    pub nouns: Vec<String>,
    /// Emotional adjective lemmas.
    pub adjectives: Vec<String>,
}

// Compact word lists. These stand in for a full dependency parser; a richer
// analyzer can replace this capability without touching the pipeline.
const ANGER_WORDS: &[&str] = &["angry", "furious", "rage", "irritated", "frustrated", "resent", "mad"];
const ANTICIPATION_WORDS: &[&str] = &["hope", "hopeful", "expect", "eager", "awaiting", "looking", "soon"];
const DISGUST_WORDS: &[&str] = &["disgusted", "gross", "sickening", "revolting", "repulsed"];
const FEAR_WORDS: &[&str] = &["afraid", "scared", "anxious", "anxiety", "nervous", "worry", "worried", "dread", "panic", "terrified"];
const JOY_WORDS: &[&str] = &["happy", "joy", "joyful", "delighted", "glad", "excited", "grateful", "bliss"];
const SADNESS_WORDS: &[&str] = &["sad", "grief", "mourning", "loss", "lonely", "heartbroken", "despair", "crying", "empty", "hopeless"];
const SURPRISE_WORDS: &[&str] = &["surprised", "shocked", "sudden", "unexpected", "astonished"];
const TRUST_WORDS: &[&str] = &["trust", "safe", "reliable", "steady", "honest", "faith"];
const POSITIVE_WORDS: &[&str] = &["good", "great", "wonderful", "love", "calm", "relief", "relieved", "better", "peaceful", "warm"];
const NEGATIVE_WORDS: &[&str] = &["bad", "awful", "terrible", "hate", "worse", "hurt", "pain", "overwhelmed", "exhausted", "drowning"];

const NEGATION_WORDS: &[&str] = &["not", "no", "never", "don't", "doesn't", "didn't", "can't", "won't", "isn't", "wasn't", "hardly", "barely", "without"];
const INTENSIFIER_WORDS: &[&str] = &["very", "really", "so", "extremely", "incredibly", "completely", "totally", "utterly", "deeply"];
const SARCASM_MARKERS: &[&str] = &["yeah right", "sure", "oh great", "as if", "totally fine"];
const CAPS_SARCASM_THRESHOLD: f64 = 0.3;

// Emotional lemma lists for the syntactic-cue boosts.
const EMOTIONAL_VERBS: &[&str] = &["drowning", "spiraling", "aching", "racing", "breaking", "falling", "shaking", "crying", "struggling", "longing", "grieving"];
const EMOTIONAL_NOUNS: &[&str] = &["grief", "fear", "anger", "joy", "loss", "ache", "weight", "storm", "stillness", "longing", "panic"];
const EMOTIONAL_ADJECTIVES: &[&str] = &["anxious", "overwhelmed", "heavy", "numb", "restless", "tender", "fragile", "exhausted", "uncertain", "quiet"];

fn dimension_words(dim: &str) -> &'static [&'static str] {
    match dim {
        "anger" => ANGER_WORDS,
        "anticipation" => ANTICIPATION_WORDS,
        "disgust" => DISGUST_WORDS,
        "fear" => FEAR_WORDS,
        "joy" => JOY_WORDS,
        "sadness" => SADNESS_WORDS,
        "surprise" => SURPRISE_WORDS,
        "trust" => TRUST_WORDS,
        "positive" => POSITIVE_WORDS,
        "negative" => NEGATIVE_WORDS,
        _ => &[],
    }
}

/// Lexicon-and-heuristic affect analyzer.
#[derive(Debug, Clone, Default)]
pub struct AffectAnalyzer;

impl AffectAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze one utterance.
    pub fn analyze(&self, text: &str) -> EmotionalAnalysis {
        let tokens = tokenize(text);
        let word_count = tokens.len().max(1) as f64;
        let lowered = text.to_lowercase();

        let mut nrc_scores: HashMap<String, f64> = HashMap::new();
        for dim in EMOTION_DIMENSIONS {
            let hits = tokens
                .iter()
                .filter(|t| dimension_words(dim).contains(&t.as_str()))
                .count() as f64;
            nrc_scores.insert(dim.to_string(), (hits / word_count).clamp(0.0, 1.0));
        }

        let negated = tokens.iter().any(|t| NEGATION_WORDS.contains(&t.as_str()));
        let intensified = tokens
            .iter()
            .any(|t| INTENSIFIER_WORDS.contains(&t.as_str()));
        let sarcasm_likely = SARCASM_MARKERS.iter().any(|m| lowered.contains(m))
            && caps_ratio(text) >= CAPS_SARCASM_THRESHOLD;

        let polarity = self.polarity(&tokens);
        let pos = nrc_scores["positive"];
        let neg = nrc_scores["negative"];

        let mut valence = (pos - neg + polarity) / 2.0;
        if negated {
            valence /= 2.0;
        }
        let valence = valence.clamp(-1.0, 1.0);

        let mut arousal = (nrc_scores["anger"]
            + nrc_scores["fear"]
            + nrc_scores["joy"]
            + nrc_scores["surprise"])
            / 4.0;
        if intensified {
            arousal *= 1.3;
        }
        let arousal = arousal.clamp(0.0, 1.0);

        let dominance = (0.5 + (nrc_scores["trust"] + nrc_scores["anticipation"]) / 2.0
            - (nrc_scores["fear"] + nrc_scores["sadness"]) / 2.0)
            .clamp(0.0, 1.0);

        let (primary_emotion, primary_score) = nrc_scores
            .iter()
            .filter(|(dim, _)| *dim != "positive" && *dim != "negative")
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(dim, score)| (dim.clone(), *score))
            .unwrap_or_else(|| ("neutral".to_string(), 0.0));

        // Agreement between the emotion-lexicon valence and the polarity
        // pass: 1 when both methods land in the same place.
        let method_agreement = 1.0 - (valence - polarity).abs() / 2.0;
        let overall_confidence = ((primary_score + method_agreement) / 2.0).clamp(0.0, 1.0);

        EmotionalAnalysis {
            primary_emotion: if primary_score > 0.0 {
                primary_emotion
            } else {
                "neutral".to_string()
            },
            valence,
            arousal,
            dominance,
            nrc_scores,
            negated,
            intensified,
            sarcasm_likely,
            overall_confidence,
        }
    }

    /// Syntactic cues for the ranking boosts: emotional verb, noun, and
    /// adjective lemmas present in the text.
    pub fn syntactic_cues(&self, text: &str) -> SyntacticCues {
        let tokens = tokenize(text);
        let pick = |lemmas: &[&str]| -> Vec<String> {
            let mut found: Vec<String> = tokens
                .iter()
                .filter(|t| lemmas.contains(&t.as_str()))
                .cloned()
                .collect();
            found.dedup();
            found
        };
        SyntacticCues {
            verbs: pick(EMOTIONAL_VERBS),
            nouns: pick(EMOTIONAL_NOUNS),
            adjectives: pick(EMOTIONAL_ADJECTIVES),
        }
    }

    /// Simple polarity score in [-1, 1] from sentiment word hits.
    fn polarity(&self, tokens: &[String]) -> f64 {
        if tokens.is_empty() {
            return 0.0;
        }
        let pos = tokens
            .iter()
            .filter(|t| POSITIVE_WORDS.contains(&t.as_str()))
            .count() as f64;
        let neg = tokens
            .iter()
            .filter(|t| NEGATIVE_WORDS.contains(&t.as_str()))
            .count() as f64;
        ((pos - neg) / tokens.len() as f64 * 4.0).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fear_text_scores_fear_primary() {
        let analysis = AffectAnalyzer::new().analyze("I am anxious and worried all the time");
        assert_eq!(analysis.primary_emotion, "fear");
        assert!(analysis.nrc_scores["fear"] > 0.0);
        assert!(analysis.arousal > 0.0);
    }

    #[test]
    fn test_scores_are_hits_over_word_count() {
        let analysis = AffectAnalyzer::new().analyze("anxious anxious calm calm");
        // Two fear hits over four words.
        assert!((analysis.nrc_scores["fear"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_negation_halves_valence() {
        let analyzer = AffectAnalyzer::new();
        let plain = analyzer.analyze("I feel good and happy");
        let negated = analyzer.analyze("I do not feel good or happy");
        assert!(negated.negated);
        assert!(negated.valence < plain.valence);
    }

    #[test]
    fn test_intensifier_raises_arousal() {
        let analyzer = AffectAnalyzer::new();
        // Same word count, so the per-word dimension scores match and only
        // the intensifier multiplier separates the two.
        let plain = analyzer.analyze("I am quite scared");
        let intense = analyzer.analyze("I am really scared");
        assert!(!plain.intensified);
        assert!(intense.intensified);
        assert!(intense.arousal > plain.arousal);
    }

    #[test]
    fn test_sarcasm_needs_marker_and_caps() {
        let analyzer = AffectAnalyzer::new();
        assert!(analyzer.analyze("sure, EVERYTHING IS FINE").sarcasm_likely);
        assert!(!analyzer.analyze("sure, everything is fine").sarcasm_likely);
        assert!(!analyzer.analyze("EVERYTHING IS FINE").sarcasm_likely);
    }

    #[test]
    fn test_empty_text_is_neutral() {
        let analysis = AffectAnalyzer::new().analyze("");
        assert_eq!(analysis.primary_emotion, "neutral");
        assert_eq!(analysis.valence, 0.0);
        assert_eq!(analysis.arousal, 0.0);
    }

    #[test]
    fn test_dominance_stays_in_range() {
        let analysis = AffectAnalyzer::new().analyze("dread panic terrified grief loss despair");
        assert!(analysis.dominance >= 0.0 && analysis.dominance <= 1.0);
    }

    #[test]
    fn test_syntactic_cues_pick_lemma_classes() {
        let cues = AffectAnalyzer::new().syntactic_cues("I'm drowning in grief and feel anxious");
        assert_eq!(cues.verbs, vec!["drowning"]);
        assert_eq!(cues.nouns, vec!["grief"]);
        assert_eq!(cues.adjectives, vec!["anxious"]);
    }
}
