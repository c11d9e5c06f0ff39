//! Gate evaluation — mapping a signal set to activated symbolic gates.
//!
//! The gate table is static configuration: an ordered list of
//! `(gate label, required signal codes)`. A gate activates iff at least one
//! parsed signal code is in its required set. Evaluation is pure and
//! deterministic; output order is the table's insertion order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::signals::Signal;

/// One gate table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateRow {
    pub gate: String,
    pub required: Vec<String>,
}

/// Ordered gate table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateTable {
    rows: Vec<GateRow>,
}

impl Default for GateTable {
    fn default() -> Self {
        Self::canonical()
    }
}

impl GateTable {
    /// The canonical default table. Signal codes are opaque strings from
    /// the lexicon-defined closed set; the Greek letters are incidental.
    pub fn canonical() -> Self {
        let rows = [
            ("Gate 2", vec!["β", "θ"]),
            ("Gate 4", vec!["γ", "θ"]),
            ("Gate 5", vec!["λ", "ε", "δ"]),
            ("Gate 6", vec!["α", "Ω", "ε"]),
            ("Gate 9", vec!["α", "β", "γ", "δ", "ε", "Ω", "θ"]),
            ("Gate 10", vec!["θ"]),
        ]
        .into_iter()
        .map(|(gate, required)| GateRow {
            gate: gate.to_string(),
            required: required.into_iter().map(String::from).collect(),
        })
        .collect();
        Self { rows }
    }

    /// Build a table from a JSON object `{gate: [codes...]}`, preserving
    /// the source order of a `serde_json::Map`.
    pub fn from_config(config: &Value) -> Option<Self> {
        let map = config.as_object()?;
        let mut rows = Vec::with_capacity(map.len());
        for (gate, codes) in map {
            let required: Vec<String> = codes
                .as_array()?
                .iter()
                .filter_map(|c| c.as_str().map(String::from))
                .collect();
            rows.push(GateRow {
                gate: gate.clone(),
                required,
            });
        }
        Some(Self { rows })
    }

    pub fn rows(&self) -> &[GateRow] {
        &self.rows
    }

    /// Activated gates for the parsed signal set, in table order.
    pub fn evaluate(&self, signals: &[Signal]) -> Vec<String> {
        if signals.is_empty() {
            return Vec::new();
        }
        self.rows
            .iter()
            .filter(|row| {
                signals
                    .iter()
                    .any(|s| row.required.iter().any(|code| *code == s.signal_code))
            })
            .map(|row| row.gate.clone())
            .collect()
    }
}
