//! Phase 3 — response generation.
//!
//! A generated turn is three composable parts: opening · bridge · closing.
//! Openings lean on "withness" language and name the user's actual
//! experience; bridges appear only when prior context and specific concept
//! pairs co-occur; closings alternate response type on a fixed 4-cycle per
//! user (question, reflection, question, affirmation) and never repeat
//! either of the two most recent closings.
//!
//! The generator never fabricates metaphors. It may mirror a metaphor the
//! user used, verbatim, and nothing else.

pub mod composer;
pub mod concepts;

use std::collections::VecDeque;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::archetypes::ConversationArchetype;
use crate::context::ConversationContext;
use crate::generator::concepts::{classify_tone, extract_concepts, Tone, UserConcepts};
use crate::utilities::string_utils::trailing_key;

/// Characters of a closing used as its repetition key.
const CLOSING_KEY_LEN: usize = 20;
/// How many recent closings are held against repetition.
const RECENT_CLOSINGS: usize = 2;

/// The closing type for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Question,
    Reflection,
    Affirmation,
}

/// Fixed per-user alternation cycle, indexed by turn counter modulo 4.
pub const RESPONSE_CYCLE: [ResponseType; 4] = [
    ResponseType::Question,
    ResponseType::Reflection,
    ResponseType::Question,
    ResponseType::Affirmation,
];

/// One generated reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTurn {
    pub text: String,
    pub response_type: ResponseType,
}

/// Per-user generation state. Not shared across users.
#[derive(Debug, Default)]
struct UserGenState {
    turn_count: u64,
    recent_closing_keys: VecDeque<String>,
}

/// Composes replies guided by learned archetypes and the concept taxonomy.
pub struct ResponseGenerator {
    states: DashMap<String, UserGenState>,
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseGenerator {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
        }
    }

    /// Start a turn for `user_id`: advance the per-user counter and return
    /// `(turn_index, response_type)` for this turn.
    pub fn begin_turn(&self, user_id: &str) -> (u64, ResponseType) {
        let mut state = self.states.entry(user_id.to_string()).or_default();
        let index = state.turn_count;
        state.turn_count += 1;
        (index, RESPONSE_CYCLE[(index % 4) as usize])
    }

    /// Compose a full turn, or `None` when there is nothing to anchor a
    /// composed reply (neutral tone, no concepts, no archetype) — the
    /// orchestrator then falls through to glyph-informed composition.
    pub fn compose(
        &self,
        user_id: &str,
        turn_index: u64,
        response_type: ResponseType,
        text: &str,
        context: Option<&ConversationContext>,
        archetype: Option<&ConversationArchetype>,
    ) -> Option<GeneratedTurn> {
        let concepts = extract_concepts(text);
        let tone = classify_tone(text);

        if archetype.is_none() && tone == Tone::Neutral && concepts.is_empty() {
            return None;
        }

        let opening = opening_line(tone, &concepts);
        let bridge = bridge_line(&concepts, context, archetype);
        let closing = self.pick_closing(user_id, turn_index, response_type, tone, &concepts);

        let mut parts = vec![opening];
        if !bridge.is_empty() {
            parts.push(bridge);
        }
        parts.push(closing);

        Some(GeneratedTurn {
            text: parts.join(" "),
            response_type,
        })
    }

    /// Select a closing for the tone and response type, skipping any
    /// candidate that collides with one of the two most recent closings.
    fn pick_closing(
        &self,
        user_id: &str,
        turn_index: u64,
        response_type: ResponseType,
        tone: Tone,
        concepts: &UserConcepts,
    ) -> String {
        // A mirrored metaphor reflection takes priority; it is unique to
        // the user's words and cannot collide with pool entries.
        if response_type == ResponseType::Reflection {
            if let Some(metaphor) = concepts.metaphors.first() {
                let closing = format!("When you say it's like {}, I take that seriously.", metaphor);
                self.remember_closing(user_id, &closing);
                return closing;
            }
        }

        let pool = closing_pool(tone, response_type);
        let mut state = self.states.entry(user_id.to_string()).or_default();
        let start = (turn_index as usize) % pool.len();
        let chosen = (0..pool.len())
            .map(|offset| pool[(start + offset) % pool.len()])
            .find(|candidate| {
                let key = trailing_key(candidate, CLOSING_KEY_LEN);
                !state.recent_closing_keys.contains(&key)
            })
            .unwrap_or(pool[start]);

        Self::push_recent(&mut state, chosen);
        chosen.to_string()
    }

    fn remember_closing(&self, user_id: &str, closing: &str) {
        let mut state = self.states.entry(user_id.to_string()).or_default();
        Self::push_recent(&mut state, closing);
    }

    fn push_recent(state: &mut UserGenState, closing: &str) {
        if state.recent_closing_keys.len() == RECENT_CLOSINGS {
            state.recent_closing_keys.pop_front();
        }
        state
            .recent_closing_keys
            .push_back(trailing_key(closing, CLOSING_KEY_LEN));
    }
}

/// Tone-indexed opening, naming the user's experience where one was
/// captured. Withness language only; no content the user hasn't raised.
fn opening_line(tone: Tone, concepts: &UserConcepts) -> String {
    if let Some(state) = concepts.emotional_states.iter().next() {
        return match state.as_str() {
            "overwhelm" => "I'm right here with you in how much this is.".to_string(),
            "stress" => "I can hear how much pressure you're holding right now.".to_string(),
            "relief" => "I'm glad to be here with you as something loosens.".to_string(),
            "meaning" => "I'm with you in this question of what it all comes to.".to_string(),
            "connection" => "I'm here with you in this reaching toward others.".to_string(),
            _ => "I'm here with you in this.".to_string(),
        };
    }
    match tone {
        Tone::Overwhelm => "I'm here with you while everything feels this loud.".to_string(),
        Tone::Existential => "I'm with you in the weight of this question.".to_string(),
        Tone::Relief => "I'm here with you in this easing.".to_string(),
        Tone::Ambivalence => "I'm with you in holding more than one thing at once.".to_string(),
        Tone::Neutral => "I'm here with you.".to_string(),
    }
}

/// Bridge line — only when prior context exists and specific concept pairs
/// co-occur.
fn bridge_line(
    concepts: &UserConcepts,
    context: Option<&ConversationContext>,
    archetype: Option<&ConversationArchetype>,
) -> String {
    let has_prior = context.map(|c| !c.is_empty()).unwrap_or(false);
    if !has_prior {
        return String::new();
    }

    if concepts.creative_alternative && concepts.work_related {
        return "I'm also holding what you've said about work alongside this creative pull."
            .to_string();
    }
    if concepts.relationships_connection
        && (concepts.emotional_states.contains("overwhelm")
            || concepts.emotional_states.contains("stress"))
    {
        return "The strain you've described and the people in it seem woven together.".to_string();
    }
    if concepts.values_identity && concepts.work_related {
        return "What you've said about who you are keeps surfacing next to the work question."
            .to_string();
    }

    // A learned archetype can supply its own bridge when the taxonomy pairs
    // are silent.
    if let Some(archetype) = archetype {
        if archetype
            .continuity_bridges
            .iter()
            .any(|b| b == "reference-prior-thread")
        {
            return "This connects to what you were carrying earlier.".to_string();
        }
    }

    String::new()
}

/// Closing pools per tone × response type. Questions end with `?`;
/// reflections are short statements; affirmations are micro-acknowledgments.
fn closing_pool(tone: Tone, response_type: ResponseType) -> &'static [&'static str] {
    match (tone, response_type) {
        (Tone::Overwhelm, ResponseType::Question) => &[
            "What part of this feels heaviest right now?",
            "Where does the pressure sit most in your day?",
            "What would one small piece of room look like?",
        ],
        (Tone::Overwhelm, ResponseType::Reflection) => &[
            "There is a lot landing on you at once, and you're still here.",
            "You're carrying more than one person's share right now.",
            "This much, all at once, would press on anyone.",
        ],
        (Tone::Overwhelm, ResponseType::Affirmation) => &[
            "You're not alone in this.",
            "I'm staying right here.",
            "That took something to say.",
        ],
        (Tone::Existential, ResponseType::Question) => &[
            "What did meaning feel like when it was closer?",
            "What still holds even a little weight for you?",
            "Where does this question visit you most?",
        ],
        (Tone::Existential, ResponseType::Reflection) => &[
            "Asking this at all means something in you is still reaching.",
            "The question itself is a kind of honesty.",
            "You're sitting with something most people walk past.",
        ],
        (Tone::Existential, ResponseType::Affirmation) => &[
            "The question matters.",
            "I hear its weight.",
            "You're asking honestly.",
        ],
        (Tone::Relief, ResponseType::Question) => &[
            "What helped this ease arrive?",
            "What feels different in your body now?",
            "What would help this stay a while?",
        ],
        (Tone::Relief, ResponseType::Reflection) => &[
            "Something in you found room to breathe again.",
            "The loosening you describe is yours, you made space for it.",
            "Ease after strain is worth marking.",
        ],
        (Tone::Relief, ResponseType::Affirmation) => &[
            "I'm glad it's lighter.",
            "That ease is earned.",
            "Worth savoring.",
        ],
        (Tone::Ambivalence, ResponseType::Question) => &[
            "Which side of this feels truer today?",
            "What would it mean if both parts were right?",
            "Where do the two pulls meet in you?",
        ],
        (Tone::Ambivalence, ResponseType::Reflection) => &[
            "Both things are true at once for you, and that's not a failure.",
            "You're holding two directions without dropping either.",
            "The pull in both directions shows how much this matters.",
        ],
        (Tone::Ambivalence, ResponseType::Affirmation) => &[
            "Both can be true.",
            "The tension makes sense.",
            "You're allowed both.",
        ],
        (Tone::Neutral, ResponseType::Question) => &[
            "What feels most present for you right now?",
            "What would be useful to put words to?",
            "Where would you like to start?",
        ],
        (Tone::Neutral, ResponseType::Reflection) => &[
            "You're taking the time to notice what's going on in you.",
            "Putting this into words is already movement.",
            "What you're describing deserves attention.",
        ],
        (Tone::Neutral, ResponseType::Affirmation) => &[
            "I'm listening.",
            "Take your time.",
            "I'm here.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_follows_question_reflection_question_affirmation() {
        let generator = ResponseGenerator::new();
        let types: Vec<ResponseType> = (0..8).map(|_| generator.begin_turn("u1").1).collect();
        assert_eq!(
            types,
            vec![
                ResponseType::Question,
                ResponseType::Reflection,
                ResponseType::Question,
                ResponseType::Affirmation,
                ResponseType::Question,
                ResponseType::Reflection,
                ResponseType::Question,
                ResponseType::Affirmation,
            ]
        );
    }

    #[test]
    fn test_counters_are_per_user() {
        let generator = ResponseGenerator::new();
        generator.begin_turn("a");
        generator.begin_turn("a");
        let (index_b, rtype_b) = generator.begin_turn("b");
        assert_eq!(index_b, 0);
        assert_eq!(rtype_b, ResponseType::Question);
    }

    #[test]
    fn test_question_closings_end_with_question_mark() {
        let generator = ResponseGenerator::new();
        let (index, rtype) = generator.begin_turn("u");
        let turn = generator
            .compose("u", index, rtype, "I'm so overwhelmed by everything", None, None)
            .unwrap();
        assert_eq!(turn.response_type, ResponseType::Question);
        assert!(turn.text.trim_end().ends_with('?'));
    }

    #[test]
    fn test_no_closing_repeats_within_two_turns() {
        let generator = ResponseGenerator::new();
        let mut closings = Vec::new();
        for _ in 0..6 {
            let (index, _) = generator.begin_turn("u");
            // Force the question pool every time by composing with the
            // cycle type replaced; repetition must still be dodged.
            let turn = generator
                .compose(
                    "u",
                    index,
                    ResponseType::Question,
                    "I'm so overwhelmed by everything",
                    None,
                    None,
                )
                .unwrap();
            closings.push(trailing_key(&turn.text, CLOSING_KEY_LEN));
        }
        for window in closings.windows(3) {
            assert_ne!(window[0], window[2]);
            assert_ne!(window[1], window[2]);
        }
    }

    #[test]
    fn test_reflection_mirrors_user_metaphor_only() {
        let generator = ResponseGenerator::new();
        generator.begin_turn("u");
        let (index, _) = generator.begin_turn("u");
        let turn = generator
            .compose(
                "u",
                index,
                ResponseType::Reflection,
                "I feel like I'm drowning in grief",
                None,
                None,
            )
            .unwrap();
        assert!(turn.text.contains("drowning in grief"));
        // No metaphors the user didn't use.
        for invented in ["fire", "mountain", "storm", "ocean"] {
            assert!(!turn.text.to_lowercase().contains(invented));
        }
    }

    #[test]
    fn test_neutral_no_concepts_no_archetype_returns_none() {
        let generator = ResponseGenerator::new();
        let (index, rtype) = generator.begin_turn("u");
        assert!(generator
            .compose("u", index, rtype, "the bus was on time", None, None)
            .is_none());
    }

    #[test]
    fn test_bridge_requires_prior_context_and_pair() {
        let generator = ResponseGenerator::new();
        let text = "work is grinding me down but my painting project keeps calling";

        let (i1, t1) = generator.begin_turn("u");
        let without_ctx = generator.compose("u", i1, t1, text, None, None).unwrap();
        assert!(!without_ctx.text.contains("creative pull"));

        let mut ctx = ConversationContext::default();
        ctx.push(crate::context::Turn::new(crate::context::Role::User, "hi"));
        let (i2, t2) = generator.begin_turn("u");
        let with_ctx = generator.compose("u", i2, t2, text, Some(&ctx), None).unwrap();
        assert!(with_ctx.text.contains("creative pull"));
    }

    #[test]
    fn test_affirmations_are_short() {
        for tone in [Tone::Overwhelm, Tone::Existential, Tone::Relief, Tone::Ambivalence, Tone::Neutral] {
            for closing in closing_pool(tone, ResponseType::Affirmation) {
                assert!(closing.split_whitespace().count() <= 8, "too long: {closing}");
            }
            for closing in closing_pool(tone, ResponseType::Reflection) {
                assert!(closing.split_whitespace().count() <= 20, "too long: {closing}");
            }
            for closing in closing_pool(tone, ResponseType::Question) {
                assert!(closing.ends_with('?'), "not a question: {closing}");
            }
        }
    }
}
