//! # Solace — Signal-to-Response Pipeline
//!
//! A conversational emotional-support engine core. Free-form natural-language
//! messages go in; context-sensitive reflective responses come out, grounded
//! in an indexed library of emotional glyphs (archetypal emotional patterns).
//!
//! The pipeline is a three-phase dataflow:
//!
//! 1. **Parse** — extract emotional signals from text via lexicon match plus
//!    optional affect enrichment.
//! 2. **Interpret** — map signals to symbolic gates, retrieve and rank
//!    candidate glyphs, match learned conversation archetypes.
//! 3. **Generate** — compose an opening/bridge/closing turn, or fall through
//!    to glyph-informed composition.
//!
//! A consent-based suicidality protocol runs as a gate between Parse and
//! Interpret and bypasses the normal pipeline entirely when it triggers.
//!
//! The chat UI, authentication, history persistence, and voice layers are
//! external collaborators: this crate consumes only text and produces text
//! plus metadata.

pub mod archetypes;
pub mod context;
pub mod gates;
pub mod generator;
pub mod glyphs;
pub mod lexicon;
pub mod pipeline;
pub mod safety;
pub mod signals;
pub mod utilities;

pub use archetypes::library::ArchetypeLibrary;
pub use archetypes::ConversationArchetype;
pub use context::{ConversationContext, Role, Turn};
pub use gates::GateTable;
pub use glyphs::store::GlyphStore;
pub use glyphs::Glyph;
pub use lexicon::LexiconStore;
pub use pipeline::{parse_input, Orchestrator, ParseOutcome, ResponseSource};
pub use safety::protocol::SuicidalityProtocol;
pub use signals::{Signal, SignalSource, VoltageBand};

/// Library version.
pub const VERSION: &str = "0.1.0";
