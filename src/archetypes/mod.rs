//! Conversation archetypes — learned patterns for responding across an
//! emotional arc.

pub mod learner;
pub mod library;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::utilities::string_utils::token_set;

/// EWMA smoothing factor for success-weight updates.
pub const SUCCESS_WEIGHT_ALPHA: f64 = 0.2;

/// A learned conversation pattern.
///
/// Invariant: `success_count <= usage_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationArchetype {
    pub name: String,
    /// Keywords whose presence in user text signals this pattern applies.
    pub entry_cues: BTreeSet<String>,
    pub response_principles: Vec<String>,
    pub continuity_bridges: Vec<String>,
    pub tone_guidelines: Vec<String>,
    /// Learned quality weight in [0, 1].
    pub success_weight: f64,
    pub usage_count: u64,
    pub success_count: u64,
}

impl ConversationArchetype {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_cues: BTreeSet::new(),
            response_principles: Vec::new(),
            continuity_bridges: Vec::new(),
            tone_guidelines: Vec::new(),
            success_weight: 0.5,
            usage_count: 0,
            success_count: 0,
        }
    }

    /// Base match score: fraction of entry cues present in the combined
    /// current + prior token set. Always in [0, 1].
    pub fn base_score(&self, current_text: &str, prior_text: &str) -> f64 {
        if self.entry_cues.is_empty() {
            return 0.0;
        }
        let mut tokens = token_set(current_text);
        tokens.extend(token_set(prior_text));
        let hits = self
            .entry_cues
            .iter()
            .filter(|cue| tokens.contains(cue.as_str()))
            .count();
        hits as f64 / self.entry_cues.len() as f64
    }

    /// Weighted score: base × success_weight. Always in [0, 1].
    pub fn match_score(&self, current_text: &str, prior_text: &str) -> f64 {
        (self.base_score(current_text, prior_text) * self.success_weight).clamp(0.0, 1.0)
    }

    /// Record one usage outcome: counters plus EWMA on the success weight.
    pub fn record_outcome(&mut self, success: bool) {
        self.usage_count += 1;
        if success {
            self.success_count += 1;
        }
        let observation = if success { 1.0 } else { 0.0 };
        self.success_weight = ((1.0 - SUCCESS_WEIGHT_ALPHA) * self.success_weight
            + SUCCESS_WEIGHT_ALPHA * observation)
            .clamp(0.0, 1.0);
    }

    /// Union another candidate's fields into this archetype (learner merge).
    pub fn absorb(&mut self, other: &ConversationArchetype) {
        self.entry_cues.extend(other.entry_cues.iter().cloned());
        for list in [
            (&mut self.response_principles, &other.response_principles),
            (&mut self.continuity_bridges, &other.continuity_bridges),
            (&mut self.tone_guidelines, &other.tone_guidelines),
        ] {
            let (dst, src) = list;
            for item in src {
                if !dst.contains(item) {
                    dst.push(item.clone());
                }
            }
        }
    }
}

/// One archetype match above threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeMatch {
    pub archetype: ConversationArchetype,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archetype() -> ConversationArchetype {
        let mut a = ConversationArchetype::new("OverwhelmToRelief");
        a.entry_cues = ["overwhelmed", "work", "tired", "pressure"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        a.success_weight = 0.8;
        a
    }

    #[test]
    fn test_base_score_is_cue_fraction() {
        let a = archetype();
        let score = a.base_score("I'm overwhelmed by work", "");
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_match_score_weighted_and_bounded() {
        let a = archetype();
        let score = a.match_score("overwhelmed work tired pressure", "");
        assert!((score - 0.8).abs() < 1e-9);
        assert!(score >= 0.0 && score <= 1.0);
    }

    #[test]
    fn test_prior_text_counts_toward_cues() {
        let a = archetype();
        let with_prior = a.base_score("still overwhelmed", "work has been so much pressure");
        let without = a.base_score("still overwhelmed", "");
        assert!(with_prior > without);
    }

    #[test]
    fn test_empty_cues_never_match() {
        let a = ConversationArchetype::new("Empty");
        assert_eq!(a.match_score("anything at all", ""), 0.0);
    }

    #[test]
    fn test_record_outcome_preserves_invariant() {
        let mut a = archetype();
        for success in [true, false, true, true, false, false, true] {
            a.record_outcome(success);
            assert!(a.success_count <= a.usage_count);
        }
        assert_eq!(a.usage_count, 7);
        assert_eq!(a.success_count, 4);
    }

    #[test]
    fn test_ewma_moves_toward_observation() {
        let mut a = archetype();
        let before = a.success_weight;
        a.record_outcome(true);
        assert!(a.success_weight > before);
        let after_success = a.success_weight;
        a.record_outcome(false);
        assert!(a.success_weight < after_success);
    }

    #[test]
    fn test_absorb_unions_without_duplicates() {
        let mut a = archetype();
        a.response_principles.push("validate-first".to_string());

        let mut b = ConversationArchetype::new("OverwhelmToRelief");
        b.entry_cues.insert("deadline".to_string());
        b.response_principles.push("validate-first".to_string());
        b.response_principles.push("create-space".to_string());

        a.absorb(&b);
        assert!(a.entry_cues.contains("deadline"));
        assert_eq!(
            a.response_principles,
            vec!["validate-first".to_string(), "create-space".to_string()]
        );
    }
}
