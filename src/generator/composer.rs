//! Glyph-informed fallback composition.
//!
//! The simpler path taken when no archetype matches and the concept
//! taxonomy has nothing to anchor: one validating sentence built from the
//! top glyph's description and the user's own signal keywords, plus a
//! gentle open question. When even the glyph is absent, the fixed empathic
//! fallback message is all that remains.

use crate::glyphs::Glyph;
use crate::signals::Signal;

/// The terminal fallback. Also used when the pipeline degrades entirely.
pub const FALLBACK_MESSAGE: &str =
    "I'm here with you. Tell me more about what you're experiencing.";

/// Compose a reply from the top-ranked glyph and the parsed signals.
///
/// Returns `None` when there is no glyph to ground the reply.
pub fn compose_from_glyph(glyph: Option<&Glyph>, signals: &[Signal]) -> Option<String> {
    let glyph = glyph?;

    let named = named_keywords(signals);
    let validation = match named {
        Some(named) => format!(
            "What you're naming — {} — has a recognizable shape. {}",
            named,
            first_sentence(&glyph.description)
        ),
        None => format!(
            "What you're describing has a recognizable shape. {}",
            first_sentence(&glyph.description)
        ),
    };

    Some(format!(
        "{} What feels most present in it right now?",
        validation.trim_end()
    ))
}

/// Optional short follow-up offering the glyph as something to sit with.
pub fn ritual_prompt(glyph: Option<&Glyph>) -> String {
    match glyph {
        Some(glyph) => format!(
            "If it helps, take one slow breath with the idea of \"{}\".",
            glyph.glyph_name
        ),
        None => String::new(),
    }
}

/// The user's matched keywords, joined for naming back. At most three, in
/// signal order, so the sentence stays a sentence.
fn named_keywords(signals: &[Signal]) -> Option<String> {
    if signals.is_empty() {
        return None;
    }
    let keywords: Vec<&str> = signals.iter().take(3).map(|s| s.keyword.as_str()).collect();
    Some(keywords.join(", "))
}

/// First sentence of a description, with a period restored.
fn first_sentence(description: &str) -> String {
    let trimmed = description.trim();
    match trimmed.find(['.', '!', '?']) {
        Some(idx) => trimmed[..=idx].to_string(),
        None if trimmed.is_empty() => String::new(),
        None => format!("{}.", trimmed),
    }
}
