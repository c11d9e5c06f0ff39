//! Emotional signals — the discrete tokens extracted from user text.
//!
//! A signal carries the matched keyword, an opaque signal code drawn from
//! the closed set the lexicon defines at load time, a coarse voltage band,
//! a tone label, and a confidence. Signal codes look like Greek letters in
//! the canonical lexicon, but the core treats them as opaque strings.

pub mod affect;
pub mod parser;

use serde::{Deserialize, Serialize};

/// Coarse intensity band attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoltageBand {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for VoltageBand {
    fn default() -> Self {
        VoltageBand::Medium
    }
}

impl VoltageBand {
    /// Parse a lexicon voltage string; unknown values fall back to medium.
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "low" => VoltageBand::Low,
            "high" => VoltageBand::High,
            "critical" => VoltageBand::Critical,
            _ => VoltageBand::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoltageBand::Low => "low",
            VoltageBand::Medium => "medium",
            VoltageBand::High => "high",
            VoltageBand::Critical => "critical",
        }
    }
}

/// Which analyzer produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    /// Direct lexicon keyword match.
    Lexicon,
    /// Enhanced affect analyzer enrichment.
    Enhanced,
}

/// A discrete emotional token extracted from text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// The keyword that matched in the user's text.
    pub keyword: String,
    /// Opaque symbolic code from the lexicon-defined closed set.
    pub signal_code: String,
    /// Coarse intensity band.
    pub voltage: VoltageBand,
    /// Tone label from the lexicon ("unknown" when unspecified).
    pub tone: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Producing analyzer.
    pub source: SignalSource,
}

impl Signal {
    pub fn new(
        keyword: impl Into<String>,
        signal_code: impl Into<String>,
        voltage: VoltageBand,
        tone: impl Into<String>,
        confidence: f64,
        source: SignalSource,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            signal_code: signal_code.into(),
            voltage,
            tone: tone.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltage_from_label() {
        assert_eq!(VoltageBand::from_label("LOW"), VoltageBand::Low);
        assert_eq!(VoltageBand::from_label("critical"), VoltageBand::Critical);
        assert_eq!(VoltageBand::from_label("???"), VoltageBand::Medium);
    }

    #[test]
    fn test_signal_confidence_is_clamped() {
        let s = Signal::new("anxious", "θ", VoltageBand::High, "fear", 1.7, SignalSource::Lexicon);
        assert_eq!(s.confidence, 1.0);
        let s = Signal::new("calm", "λ", VoltageBand::Low, "peace", -0.2, SignalSource::Lexicon);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn test_serde_uses_lowercase_labels() {
        let s = Signal::new("sad", "δ", VoltageBand::High, "grief", 0.9, SignalSource::Enhanced);
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"high\""));
        assert!(json.contains("\"enhanced\""));
    }
}
