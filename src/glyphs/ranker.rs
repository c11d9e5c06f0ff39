//! Glyph ranking — scoring retained candidates against signals and cues.
//!
//! Scores are integers built from three sources:
//! - semantic cluster pair rules (signal keyword cluster × glyph name
//!   terms), taking the best matching rule per cluster;
//! - syntactic-cue boosts (+8 per emotional verb lemma found in the glyph
//!   text, +6 per noun, +4 per adjective) — zero when the affect analyzer
//!   capability is absent;
//! - a +5 accessibility bonus for names containing still/quiet/gentle/soft.
//!
//! Ties break on the summed confidence of signals whose keyword appears in
//! the glyph text, then on lexicographic glyph name.

use serde::{Deserialize, Serialize};

use crate::glyphs::Glyph;
use crate::signals::affect::SyntacticCues;
use crate::signals::Signal;

const VERB_BOOST: i64 = 8;
const NOUN_BOOST: i64 = 6;
const ADJECTIVE_BOOST: i64 = 4;
const ACCESSIBILITY_BONUS: i64 = 5;
const ACCESSIBILITY_TERMS: &[&str] = &["still", "quiet", "gentle", "soft"];

/// A glyph with its computed rank score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredGlyph {
    pub glyph: Glyph,
    pub score: i64,
}

/// Outcome of ranking one candidate set.
#[derive(Debug, Clone)]
pub struct RankOutcome {
    /// Retained glyphs, best first.
    pub ranked: Vec<ScoredGlyph>,
    /// Reason ranking produced nothing, when it did.
    pub fallback_reason: Option<String>,
}

impl RankOutcome {
    pub fn best(&self) -> Option<&ScoredGlyph> {
        self.ranked.first()
    }
}

/// One semantic cluster: trigger keywords in the user's signals, and name
/// rules tried best-bonus-first.
struct ClusterRule {
    triggers: &'static [&'static str],
    /// `(required name terms, bonus)` — all terms must appear in the name.
    name_rules: &'static [(&'static [&'static str], i64)],
    /// Name terms that veto a rule (e.g. "still" rules skip grief glyphs).
    veto: &'static [(&'static [&'static str], &'static str)],
}

const OVERWHELM_CLUSTER: ClusterRule = ClusterRule {
    triggers: &["overwhelmed", "overwhelming", "changes", "shifting", "uncertain"],
    name_rules: &[
        (&["spiral", "containment"], 15),
        (&["containment"], 12),
        (&["boundary"], 12),
        (&["still", "ache"], 10),
        (&["clarity"], 8),
        (&["insight"], 8),
    ],
    veto: &[],
};

const ANXIETY_CLUSTER: ClusterRule = ClusterRule {
    triggers: &["anxious", "anxiety", "nervous", "worry", "stressed", "racing"],
    name_rules: &[
        (&["still", "insight"], 15),
        (&["clarity"], 12),
        (&["insight"], 12),
        (&["still"], 10),
        (&["containment"], 8),
        (&["boundary"], 8),
    ],
    // A bare "still" match must not pull grief glyphs toward anxiety.
    veto: &[(&["still"], "grief")],
};

const GRIEF_CLUSTER: ClusterRule = ClusterRule {
    triggers: &["sad", "grief", "mourning", "loss"],
    name_rules: &[(&["grief"], 10), (&["mourning"], 10)],
    veto: &[],
};

const ANGER_CLUSTER: ClusterRule = ClusterRule {
    triggers: &["angry", "frustrated", "rage"],
    name_rules: &[(&["ache"], 10), (&["longing"], 10)],
    veto: &[],
};

const JOY_CLUSTER: ClusterRule = ClusterRule {
    triggers: &["happy", "joy", "excited"],
    name_rules: &[(&["joy"], 10), (&["bliss"], 10)],
    veto: &[],
};

const CLUSTERS: [&ClusterRule; 5] = [
    &OVERWHELM_CLUSTER,
    &ANXIETY_CLUSTER,
    &GRIEF_CLUSTER,
    &ANGER_CLUSTER,
    &JOY_CLUSTER,
];

/// Rank a pruned candidate set.
pub fn rank(candidates: Vec<Glyph>, signals: &[Signal], cues: Option<&SyntacticCues>) -> RankOutcome {
    if candidates.is_empty() {
        return RankOutcome {
            ranked: Vec::new(),
            fallback_reason: Some("no glyph candidates after retrieval and pruning".to_string()),
        };
    }

    let mut scored: Vec<(ScoredGlyph, f64)> = candidates
        .into_iter()
        .map(|glyph| {
            let score = score_glyph(&glyph, signals, cues);
            let confidence_sum = tiebreak_confidence(&glyph, signals);
            (ScoredGlyph { glyph, score }, confidence_sum)
        })
        .collect();

    scored.sort_by(|(a, conf_a), (b, conf_b)| {
        b.score
            .cmp(&a.score)
            .then_with(|| conf_b.partial_cmp(conf_a).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.glyph.glyph_name.cmp(&b.glyph.glyph_name))
    });

    RankOutcome {
        ranked: scored.into_iter().map(|(sg, _)| sg).collect(),
        fallback_reason: None,
    }
}

/// Integer score for one glyph.
pub fn score_glyph(glyph: &Glyph, signals: &[Signal], cues: Option<&SyntacticCues>) -> i64 {
    let name = glyph.glyph_name.to_lowercase();
    let text = glyph.search_text();
    let mut score = 0;

    for cluster in CLUSTERS {
        if !cluster
            .triggers
            .iter()
            .any(|t| signals.iter().any(|s| s.keyword == *t))
        {
            continue;
        }
        // Best matching rule per triggered cluster.
        for (terms, bonus) in cluster.name_rules {
            if !terms.iter().all(|t| name.contains(t)) {
                continue;
            }
            let vetoed = cluster
                .veto
                .iter()
                .any(|(rule_terms, blocked)| *rule_terms == *terms && name.contains(blocked));
            if vetoed {
                continue;
            }
            score += bonus;
            break;
        }
    }

    if let Some(cues) = cues {
        score += VERB_BOOST * cues.verbs.iter().filter(|v| text.contains(v.as_str())).count() as i64;
        score += NOUN_BOOST * cues.nouns.iter().filter(|n| text.contains(n.as_str())).count() as i64;
        score += ADJECTIVE_BOOST
            * cues
                .adjectives
                .iter()
                .filter(|a| text.contains(a.as_str()))
                .count() as i64;
    }

    if ACCESSIBILITY_TERMS.iter().any(|t| name.contains(t)) {
        score += ACCESSIBILITY_BONUS;
    }

    score
}

/// Summed confidence of signals whose keyword appears in the glyph text.
fn tiebreak_confidence(glyph: &Glyph, signals: &[Signal]) -> f64 {
    let text = glyph.search_text();
    signals
        .iter()
        .filter(|s| text.contains(&s.keyword))
        .map(|s| s.confidence)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{SignalSource, VoltageBand};

    fn signal(keyword: &str) -> Signal {
        Signal::new(keyword, "θ", VoltageBand::High, "unknown", 0.9, SignalSource::Lexicon)
    }

    fn glyph(id: i64, name: &str, description: &str) -> Glyph {
        Glyph {
            glyph_id: id,
            glyph_name: name.to_string(),
            description: description.to_string(),
            gate: "Gate 2".to_string(),
            emotional_signal: None,
        }
    }

    #[test]
    fn test_anxiety_prefers_still_insight() {
        let candidates = vec![
            glyph(1, "Spiral Containment", "Holding the spin."),
            glyph(2, "Still Insight", "Clarity inside quiet."),
            glyph(3, "Grief Door", "What loss opens."),
        ];
        let outcome = rank(candidates, &[signal("anxious")], None);
        assert_eq!(outcome.best().unwrap().glyph.glyph_name, "Still Insight");
        // 15 (still+insight) + 5 (accessibility).
        assert_eq!(outcome.best().unwrap().score, 20);
    }

    #[test]
    fn test_overwhelm_prefers_spiral_containment() {
        let candidates = vec![
            glyph(1, "Spiral Containment", "Holding the spin."),
            glyph(2, "Open Meadow", "Wide and light."),
        ];
        let outcome = rank(candidates, &[signal("overwhelmed")], None);
        assert_eq!(outcome.best().unwrap().glyph.glyph_name, "Spiral Containment");
        assert_eq!(outcome.best().unwrap().score, 15);
    }

    #[test]
    fn test_still_rule_vetoed_for_grief_glyphs() {
        let with_grief = glyph(1, "Still Grief", "Quiet sorrow.");
        let without = glyph(2, "Still Water", "Quiet surface.");
        // Bare-"still" bonus applies only to the non-grief name.
        let s = [signal("anxious")];
        assert_eq!(score_glyph(&without, &s, None), 10 + 5);
        assert_eq!(score_glyph(&with_grief, &s, None), 5);
    }

    #[test]
    fn test_grief_anger_joy_clusters() {
        assert_eq!(
            score_glyph(&glyph(1, "Grief Door", "loss"), &[signal("mourning")], None),
            10
        );
        assert_eq!(
            score_glyph(&glyph(2, "Ache of Longing", "want"), &[signal("angry")], None),
            10
        );
        assert_eq!(
            score_glyph(&glyph(3, "Joy Spill", "light"), &[signal("happy")], None),
            10
        );
    }

    #[test]
    fn test_syntactic_cue_boosts() {
        let cues = SyntacticCues {
            verbs: vec!["drowning".to_string()],
            nouns: vec!["grief".to_string()],
            adjectives: vec!["heavy".to_string()],
        };
        let g = glyph(1, "Grief Tide", "The heavy pull of drowning sorrow.");
        // grief cluster not triggered (no grief signal); boosts only:
        // verb 8 + noun 6 + adjective 4.
        assert_eq!(score_glyph(&g, &[], Some(&cues)), 18);
        // Without the capability the boosts are zero.
        assert_eq!(score_glyph(&g, &[], None), 0);
    }

    #[test]
    fn test_tie_breaks_on_confidence_then_name() {
        let a = glyph(1, "Beta Calm", "irrelevant");
        let b = glyph(2, "Alpha Calm", "mentions anxious directly");
        let s = [Signal::new("anxious", "θ", VoltageBand::High, "fear", 0.9, SignalSource::Lexicon)];
        // Equal scores (no cluster name rules hit, no cues); b wins the
        // confidence tiebreak because its text contains the keyword.
        let outcome = rank(vec![a.clone(), b.clone()], &s, None);
        assert_eq!(outcome.best().unwrap().glyph.glyph_name, "Alpha Calm");

        // With no keyword hits anywhere, lexicographic name decides.
        let outcome = rank(vec![a, glyph(3, "Aard Calm", "nothing")], &[], None);
        assert_eq!(outcome.best().unwrap().glyph.glyph_name, "Aard Calm");
    }

    #[test]
    fn test_empty_candidates_reports_fallback_reason() {
        let outcome = rank(Vec::new(), &[signal("anxious")], None);
        assert!(outcome.best().is_none());
        assert!(outcome.fallback_reason.is_some());
    }
}
