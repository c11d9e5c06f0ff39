//! Glyphs — archetypal emotional pattern records.
//!
//! Glyphs are immutable rows in the indexed store, keyed by gate. The
//! salvaged glyph tables in the wild contain export debris (markdown dumps,
//! bracketed tool prefixes, URL-bearing rows); [`is_artifact`] filters those
//! at retrieval time so they never reach ranking or callers.

pub mod ranker;
pub mod store;

use serde::{Deserialize, Serialize};

/// One glyph record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Glyph {
    pub glyph_id: i64,
    pub glyph_name: String,
    pub description: String,
    pub gate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_signal: Option<String>,
}

impl Glyph {
    /// Name and description concatenated, lowercased, for keyword scoring.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.glyph_name, self.description).to_lowercase()
    }
}

/// Maximum tolerated description length before a row is treated as debris.
const MAX_DESCRIPTION_LEN: usize = 800;
/// Maximum tolerated newlines in a description.
const MAX_DESCRIPTION_NEWLINES: usize = 8;

/// Export/archive/debris markers. This list is a calibrated floor, not an
/// exhaustive taxonomy; extensions must be additive and test-covered.
const ARTIFACT_MARKERS: &[&str] = &[
    "markdown",
    "json",
    "export",
    "archive",
    "backup",
    "http://",
    "https://",
    "```",
    "###",
    "📜",
    "📖",
    "📚",
    "📁",
    "🗂",
];

/// Whether a glyph row is export debris that must be excluded.
pub fn is_artifact(glyph: &Glyph) -> bool {
    let name = glyph.glyph_name.to_lowercase();
    let description = glyph.description.to_lowercase();

    if glyph.glyph_name.contains('[')
        || glyph.glyph_name.contains(']')
        || glyph.glyph_name.contains('\t')
    {
        return true;
    }
    if glyph.description.len() > MAX_DESCRIPTION_LEN {
        return true;
    }
    if glyph.description.matches('\n').count() > MAX_DESCRIPTION_NEWLINES {
        return true;
    }
    ARTIFACT_MARKERS
        .iter()
        .any(|marker| name.contains(marker) || description.contains(marker))
}
