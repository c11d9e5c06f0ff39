//! Phase 1 — the signal parser.
//!
//! Merges direct lexicon keyword matches with signals contributed by the
//! optional affect analyzer. On keyword collision the higher-confidence
//! signal wins. Output order is deterministic (sorted by keyword).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lexicon::LexiconStore;
use crate::signals::affect::{AffectAnalyzer, EmotionalAnalysis, SyntacticCues};
use crate::signals::{Signal, SignalSource};

/// Everything Phase 1 produces for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedSignals {
    pub signals: Vec<Signal>,
    /// Present when the affect analyzer capability is available.
    pub analysis: Option<EmotionalAnalysis>,
    pub cues: Option<SyntacticCues>,
}

impl ParsedSignals {
    pub fn empty() -> Self {
        Self {
            signals: Vec::new(),
            analysis: None,
            cues: None,
        }
    }

    /// Matched keywords, for ranking and composition.
    pub fn keywords(&self) -> Vec<&str> {
        self.signals.iter().map(|s| s.keyword.as_str()).collect()
    }
}

/// Extracts signal tokens from text via lexicon match plus optional
/// enrichment.
pub struct SignalParser {
    lexicon: Arc<LexiconStore>,
    /// Capability set: present analyzers enrich Phase 1 output.
    affect: Option<AffectAnalyzer>,
}

impl SignalParser {
    pub fn new(lexicon: Arc<LexiconStore>, affect: Option<AffectAnalyzer>) -> Self {
        Self { lexicon, affect }
    }

    /// Parse one utterance into its signal set.
    pub fn parse(&self, text: &str) -> ParsedSignals {
        let mut merged: BTreeMap<String, Signal> = self
            .lexicon
            .lookup_tokens(text)
            .into_iter()
            .map(|s| (s.keyword.clone(), s))
            .collect();

        let (analysis, cues) = match &self.affect {
            Some(analyzer) => {
                let analysis = analyzer.analyze(text);
                let cues = analyzer.syntactic_cues(text);
                for signal in self.enhanced_signals(&cues, &analysis) {
                    match merged.get(&signal.keyword) {
                        Some(existing) if existing.confidence >= signal.confidence => {}
                        _ => {
                            merged.insert(signal.keyword.clone(), signal);
                        }
                    }
                }
                (Some(analysis), Some(cues))
            }
            None => (None, None),
        };

        ParsedSignals {
            signals: merged.into_values().collect(),
            analysis,
            cues,
        }
    }

    /// Signals derived from affect analysis.
    ///
    /// The signal alphabet is lexicon-defined, so enrichment only emits
    /// signals for emotional lemmas the lexicon actually knows; for those,
    /// it re-scores confidence from the analysis. Lemmas outside the
    /// lexicon still inform ranking through the cue lists.
    fn enhanced_signals(
        &self,
        cues: &SyntacticCues,
        analysis: &EmotionalAnalysis,
    ) -> Vec<Signal> {
        let mut out = Vec::new();
        let lemmas = cues
            .verbs
            .iter()
            .chain(cues.nouns.iter())
            .chain(cues.adjectives.iter());
        for lemma in lemmas {
            if let Some(entry) = self.lexicon.get(lemma) {
                out.push(Signal::new(
                    lemma.clone(),
                    entry.signal,
                    entry.voltage,
                    entry.tone,
                    analysis.overall_confidence,
                    SignalSource::Enhanced,
                ));
            }
        }
        out
    }
}
