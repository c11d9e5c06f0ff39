//! The per-turn orchestrator.
//!
//! One deterministic sequence per user turn: parse signals, check for a
//! suicidality disclosure (which short-circuits everything else), evaluate
//! gates, retrieve and rank glyphs, generate a reply, and hand the finished
//! exchange to the learner in the background.
//!
//! The orchestrator never returns an error to callers. Components that
//! fail degrade to sentinel values and the turn still produces a
//! well-formed [`ParseOutcome`]; the terminal fallback is a fixed empathic
//! message with `response_source = "fallback_message"`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::archetypes::learner::ConversationLearner;
use crate::archetypes::library::{ArchetypeLibrary, DEFAULT_MATCH_THRESHOLD};
use crate::context::{ConversationContext, Role, Turn};
use crate::gates::GateTable;
use crate::generator::composer::{self, FALLBACK_MESSAGE};
use crate::generator::ResponseGenerator;
use crate::glyphs::ranker::{self, RankOutcome};
use crate::glyphs::store::GlyphStore;
use crate::glyphs::Glyph;
use crate::lexicon::LexiconStore;
use crate::safety::protocol::SuicidalityProtocol;
use crate::safety::ProtocolConfig;
use crate::signals::affect::AffectAnalyzer;
use crate::signals::parser::{ParsedSignals, SignalParser};
use crate::signals::Signal;
use crate::utilities::errors::PipelineError;
use crate::utilities::paths;

// ============================================================================
// Constants
// ============================================================================

/// Ranked glyphs surfaced per turn.
const TOP_K_GLYPHS: usize = 5;

/// Soft per-phase time budget. Exceeding it logs a warning, nothing more.
const SOFT_PHASE_BUDGET: Duration = Duration::from_millis(50);

// ============================================================================
// Result types
// ============================================================================

/// Which path produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Archetype,
    DynamicComposer,
    GlyphFallback,
    Suicidality,
    FallbackMessage,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archetype => "archetype",
            Self::DynamicComposer => "dynamic_composer",
            Self::GlyphFallback => "glyph_fallback",
            Self::Suicidality => "suicidality",
            Self::FallbackMessage => "fallback_message",
        }
    }
}

/// Per-turn telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDiagnostics {
    pub turn_id: Uuid,
    /// Phase label and elapsed milliseconds, in execution order.
    pub phase_ms: Vec<(String, u64)>,
    /// Candidate glyph rows before artifact pruning.
    pub glyph_candidates: usize,
    /// Why a phase fell back, when one did.
    pub fallback_reason: Option<String>,
}

impl TurnDiagnostics {
    fn new() -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            phase_ms: Vec::new(),
            glyph_candidates: 0,
            fallback_reason: None,
        }
    }
}

/// Learning hooks carried back to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feedback {
    /// Name of the archetype that shaped the reply, if one did. Pass it to
    /// [`ArchetypeLibrary::record_usage`] with the user's verdict.
    pub archetype_used: Option<String>,
}

/// The complete result of one turn.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    pub timestamp: DateTime<Utc>,
    pub input: String,
    pub signals: Vec<Signal>,
    pub gates: Vec<String>,
    /// Top-ranked glyphs, best first, at most [`TOP_K_GLYPHS`].
    pub glyphs: Vec<Glyph>,
    pub best_glyph: Option<Glyph>,
    /// The generated reply.
    pub voltage_response: String,
    /// Optional short follow-up; empty when there is none.
    pub ritual_prompt: String,
    pub response_source: ResponseSource,
    /// Opaque diagnostic describing the retrieval query shape.
    pub debug_sql: String,
    pub feedback: Feedback,
    pub diagnostics: TurnDiagnostics,
}

// ============================================================================
// Configuration
// ============================================================================

/// Where the orchestrator finds its stores and config.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub lexicon_path: PathBuf,
    pub learned_lexicon_path: PathBuf,
    pub glyph_db_path: PathBuf,
    pub archetype_library_path: PathBuf,
    /// Protocol config file; `None` uses the embedded default.
    pub protocol_config_path: Option<PathBuf>,
    /// Gate table override; `None` uses the canonical table.
    pub gate_table: Option<GateTable>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            lexicon_path: paths::storage_dir().join("lexicon.json"),
            learned_lexicon_path: paths::default_learned_lexicon_path(),
            glyph_db_path: paths::default_glyph_db_path(),
            archetype_library_path: paths::default_archetype_library_path(),
            protocol_config_path: None,
            gate_table: None,
        }
    }
}

fn remote_ai_allowed() -> bool {
    std::env::var("ALLOW_REMOTE_AI")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Owns every pipeline component and runs the per-turn sequence.
pub struct Orchestrator {
    lexicon: Option<Arc<LexiconStore>>,
    parser: Option<SignalParser>,
    gate_table: GateTable,
    glyphs: Option<GlyphStore>,
    archetypes: Arc<ArchetypeLibrary>,
    generator: ResponseGenerator,
    protocol: SuicidalityProtocol,
    learner: Arc<ConversationLearner>,
}

impl Orchestrator {
    /// Build the pipeline. The only fatal condition is a missing or
    /// unusable suicidality protocol config; every other component
    /// degrades and the pipeline runs without it.
    pub fn new(config: OrchestratorConfig) -> Result<Self, PipelineError> {
        let protocol_config = match &config.protocol_config_path {
            Some(path) => ProtocolConfig::load(path)?,
            None => ProtocolConfig::embedded(),
        };
        let protocol = SuicidalityProtocol::new(protocol_config);

        let lexicon = match LexiconStore::open(&config.lexicon_path, &config.learned_lexicon_path)
        {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                log::warn!("lexicon unavailable, parsing disabled: {}", e);
                None
            }
        };
        let parser = lexicon
            .as_ref()
            .map(|lex| SignalParser::new(lex.clone(), Some(AffectAnalyzer::new())));

        let glyphs = match GlyphStore::open(&config.glyph_db_path) {
            Ok(store) => Some(store),
            Err(e) => {
                log::warn!("glyph store unavailable, retrieval disabled: {}", e);
                None
            }
        };

        let archetypes = Arc::new(ArchetypeLibrary::open(&config.archetype_library_path));
        let learner = Arc::new(ConversationLearner::new(archetypes.clone()));

        if remote_ai_allowed() {
            log::info!("ALLOW_REMOTE_AI is set; no remote augmentation is configured");
        }

        Ok(Self {
            lexicon,
            parser,
            gate_table: config.gate_table.unwrap_or_else(GateTable::canonical),
            glyphs,
            archetypes,
            generator: ResponseGenerator::new(),
            protocol,
            learner,
        })
    }

    pub fn lexicon(&self) -> Option<&Arc<LexiconStore>> {
        self.lexicon.as_ref()
    }

    pub fn archetypes(&self) -> &Arc<ArchetypeLibrary> {
        &self.archetypes
    }

    pub fn protocol(&self) -> &SuicidalityProtocol {
        &self.protocol
    }

    /// Run one turn. Never fails; see the module docs for the degradation
    /// ladder.
    pub fn parse(
        &self,
        text: &str,
        context: Option<&ConversationContext>,
        user_id: Option<&str>,
    ) -> ParseOutcome {
        let user_id = user_id.unwrap_or("anonymous");
        let mut diag = TurnDiagnostics::new();

        // Phase 1: signal extraction.
        let parsed = self.timed(&mut diag, "parse_signals", || match &self.parser {
            Some(parser) => parser.parse(text),
            None => ParsedSignals::empty(),
        });

        // Disclosure check precedes everything else, and an active protocol
        // state keeps routing the user here until it resolves.
        if self.protocol.detect(text) || self.protocol.has_active_state(user_id) {
            let reply = self.timed(&mut diag, "protocol", || self.protocol.step(user_id, text));
            return ParseOutcome {
                timestamp: Utc::now(),
                input: text.to_string(),
                signals: parsed.signals,
                gates: Vec::new(),
                glyphs: Vec::new(),
                best_glyph: None,
                voltage_response: reply.text,
                ritual_prompt: String::new(),
                response_source: ResponseSource::Suicidality,
                debug_sql: String::new(),
                feedback: Feedback::default(),
                diagnostics: diag,
            };
        }

        // Phase 2: interpretation.
        let gates = self.timed(&mut diag, "gates", || {
            self.gate_table.evaluate(&parsed.signals)
        });
        let (rank_outcome, debug_sql, candidates) = self.timed(&mut diag, "glyphs", || {
            self.retrieve_and_rank(&gates, &parsed)
        });
        diag.glyph_candidates = candidates;
        if let Some(reason) = &rank_outcome.fallback_reason {
            diag.fallback_reason = Some(reason.clone());
        }

        let glyphs: Vec<Glyph> = rank_outcome
            .ranked
            .iter()
            .take(TOP_K_GLYPHS)
            .map(|s| s.glyph.clone())
            .collect();
        let best_glyph = glyphs.first().cloned();

        // Phase 3: generation.
        let (voltage_response, response_source, feedback) =
            self.timed(&mut diag, "generate", || {
                self.generate(text, context, user_id, &parsed.signals, best_glyph.as_ref())
            });
        let ritual_prompt = match response_source {
            ResponseSource::GlyphFallback => composer::ritual_prompt(best_glyph.as_ref()),
            _ => String::new(),
        };

        // Phase 4: hand the finished exchange to the learner, detached.
        self.spawn_learner(text, &voltage_response, context);

        ParseOutcome {
            timestamp: Utc::now(),
            input: text.to_string(),
            signals: parsed.signals,
            gates,
            glyphs,
            best_glyph,
            voltage_response,
            ritual_prompt,
            response_source,
            debug_sql,
            feedback,
            diagnostics: diag,
        }
    }

    /// Async wrapper over [`parse`] for callers on a tokio runtime.
    ///
    /// [`parse`]: Orchestrator::parse
    pub async fn aparse_input(
        self: &Arc<Self>,
        text: String,
        context: Option<ConversationContext>,
        user_id: Option<String>,
    ) -> ParseOutcome {
        let this = self.clone();
        let input = text.clone();
        match tokio::task::spawn_blocking(move || {
            this.parse(&text, context.as_ref(), user_id.as_deref())
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("turn task failed: {}", e);
                fallback_outcome(&input)
            }
        }
    }

    fn retrieve_and_rank(
        &self,
        gates: &[String],
        parsed: &ParsedSignals,
    ) -> (RankOutcome, String, usize) {
        let store = match &self.glyphs {
            Some(store) => store,
            None => {
                return (
                    RankOutcome {
                        ranked: Vec::new(),
                        fallback_reason: Some("glyph store unavailable".to_string()),
                    },
                    String::new(),
                    0,
                )
            }
        };
        match store.fetch(gates) {
            Ok(fetched) => {
                let candidates = fetched.candidates;
                let outcome =
                    ranker::rank(fetched.glyphs, &parsed.signals, parsed.cues.as_ref());
                (outcome, fetched.query_shape, candidates)
            }
            Err(e) => {
                log::warn!("glyph retrieval failed: {}", e);
                (
                    RankOutcome {
                        ranked: Vec::new(),
                        fallback_reason: Some(format!("retrieval error: {}", e)),
                    },
                    String::new(),
                    0,
                )
            }
        }
    }

    fn generate(
        &self,
        text: &str,
        context: Option<&ConversationContext>,
        user_id: &str,
        signals: &[Signal],
        best_glyph: Option<&Glyph>,
    ) -> (String, ResponseSource, Feedback) {
        let (turn_index, response_type) = self.generator.begin_turn(user_id);

        let prior_text = context.map(|c| c.prior_user_text()).unwrap_or_default();
        let matched = self
            .archetypes
            .best_match(text, &prior_text, DEFAULT_MATCH_THRESHOLD);
        let archetype = matched.as_ref().map(|m| &m.archetype);

        if let Some(turn) = self.generator.compose(
            user_id,
            turn_index,
            response_type,
            text,
            context,
            archetype,
        ) {
            let source = if matched.is_some() {
                ResponseSource::Archetype
            } else {
                ResponseSource::DynamicComposer
            };
            let feedback = Feedback {
                archetype_used: matched.map(|m| m.archetype.name),
            };
            return (turn.text, source, feedback);
        }

        if let Some(reply) = composer::compose_from_glyph(best_glyph, signals) {
            return (reply, ResponseSource::GlyphFallback, Feedback::default());
        }

        (
            FALLBACK_MESSAGE.to_string(),
            ResponseSource::FallbackMessage,
            Feedback::default(),
        )
    }

    /// Fold this exchange into the archetype library off the turn path.
    fn spawn_learner(
        &self,
        user_text: &str,
        reply: &str,
        context: Option<&ConversationContext>,
    ) {
        let mut dialogue = context.cloned().unwrap_or_default();
        dialogue.push(Turn::new(Role::User, user_text));
        dialogue.push(Turn::new(Role::Assistant, reply));

        let learner = self.learner.clone();
        let analyze = move || {
            if let Err(e) = learner.analyze(&dialogue, None) {
                log::warn!("learner update dropped: {}", e);
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(analyze);
            }
            Err(_) => {
                std::thread::spawn(analyze);
            }
        }
    }

    fn timed<T>(&self, diag: &mut TurnDiagnostics, label: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        let elapsed = start.elapsed();
        if elapsed > SOFT_PHASE_BUDGET {
            log::warn!("{} took {}ms", label, elapsed.as_millis());
        }
        diag.phase_ms
            .push((label.to_string(), elapsed.as_millis() as u64));
        out
    }
}

fn fallback_outcome(text: &str) -> ParseOutcome {
    ParseOutcome {
        timestamp: Utc::now(),
        input: text.to_string(),
        signals: Vec::new(),
        gates: Vec::new(),
        glyphs: Vec::new(),
        best_glyph: None,
        voltage_response: FALLBACK_MESSAGE.to_string(),
        ritual_prompt: String::new(),
        response_source: ResponseSource::FallbackMessage,
        debug_sql: String::new(),
        feedback: Feedback::default(),
        diagnostics: TurnDiagnostics::new(),
    }
}

// ============================================================================
// Free-function surface
// ============================================================================

/// One-shot entry point: build the pipeline over the given stores and run
/// a single turn. Never fails; a pipeline that cannot even start yields
/// the fixed fallback reply.
pub fn parse_input(
    text: &str,
    lexicon_path: &Path,
    db_path: &Path,
    context: Option<&ConversationContext>,
    user_id: Option<&str>,
) -> ParseOutcome {
    let config = OrchestratorConfig {
        lexicon_path: lexicon_path.to_path_buf(),
        learned_lexicon_path: paths::default_learned_lexicon_path(),
        glyph_db_path: db_path.to_path_buf(),
        ..OrchestratorConfig::default()
    };
    match Orchestrator::new(config) {
        Ok(orchestrator) => orchestrator.parse(text, context, user_id),
        Err(e) => {
            log::error!("pipeline unavailable: {}", e);
            fallback_outcome(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::store::GlyphTable;
    use std::fs;
    use tempfile::TempDir;

    const BLOCKED: &[&str] = &[
        "you have so much to live for",
        "think of those who love you",
        "everything will be fine",
        "stay positive",
    ];

    fn assert_no_blocked(text: &str) {
        let lower = text.to_lowercase();
        for phrase in BLOCKED {
            assert!(!lower.contains(phrase), "blocked phrase in {:?}", text);
        }
    }

    struct Fixture {
        _dir: TempDir,
        orchestrator: Orchestrator,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let lexicon_path = dir.path().join("lexicon.json");
        fs::write(
            &lexicon_path,
            serde_json::json!({
                "anxious":     { "signal": "θ", "voltage": "high",   "tone": "anxious" },
                "overwhelmed": { "signal": "α", "voltage": "high",   "tone": "pressed" },
                "grief":       { "signal": "γ", "voltage": "medium", "tone": "grieving" },
                "sad":         { "signal": "γ", "voltage": "medium", "tone": "grieving" },
                "angry":       { "signal": "δ", "voltage": "high",   "tone": "heated" }
            })
            .to_string(),
        )
        .unwrap();

        let config = OrchestratorConfig {
            lexicon_path,
            learned_lexicon_path: dir.path().join("learned.json"),
            glyph_db_path: dir.path().join("glyphs.db"),
            archetype_library_path: dir.path().join("archetypes.json"),
            protocol_config_path: None,
            gate_table: None,
        };
        let orchestrator = Orchestrator::new(config).unwrap();
        Fixture {
            _dir: dir,
            orchestrator,
        }
    }

    fn seed_glyph(store: &GlyphStore, id: i64, name: &str, description: &str, gate: &str) {
        store
            .insert(
                GlyphTable::Primary,
                &Glyph {
                    glyph_id: id,
                    glyph_name: name.to_string(),
                    description: description.to_string(),
                    gate: gate.to_string(),
                    emotional_signal: None,
                },
            )
            .unwrap();
    }

    #[test]
    fn test_scenario_a_anxiety_selects_still_insight() {
        let f = fixture();
        let store = f.orchestrator.glyphs.as_ref().unwrap();
        // θ activates Gates 2, 4, 9, 10; seed plausible rivals on Gate 2.
        seed_glyph(store, 1, "Still Insight", "Clarity arriving without force.", "Gate 2");
        seed_glyph(store, 2, "Spiral Containment", "Holding the spin gently.", "Gate 2");
        seed_glyph(store, 3, "Open Door", "A threshold waiting.", "Gate 2");

        let outcome = f
            .orchestrator
            .parse("I feel anxious and overwhelmed", None, Some("u1"));

        assert!(outcome.signals.iter().any(|s| s.keyword == "anxious"));
        assert!(!outcome.gates.is_empty());
        let best = outcome.best_glyph.as_ref().unwrap();
        assert_eq!(best.glyph_name, "Still Insight");
        assert!(matches!(
            outcome.response_source,
            ResponseSource::Archetype
                | ResponseSource::DynamicComposer
                | ResponseSource::GlyphFallback
        ));
        assert_no_blocked(&outcome.voltage_response);
    }

    #[test]
    fn test_scenario_b_artifacts_never_surface() {
        let f = fixture();
        let store = f.orchestrator.glyphs.as_ref().unwrap();
        seed_glyph(store, 1, "[DEPRECATED] Old Entry", "...", "Gate 2");
        seed_glyph(
            store,
            2,
            "📜 Markdown Export",
            "### header\ncontent",
            "Gate 2",
        );
        seed_glyph(
            store,
            3,
            "Still Recognition",
            "Being seen without reaction.",
            "Gate 2",
        );

        let outcome = f.orchestrator.parse("I feel anxious", None, Some("u1"));

        assert_eq!(
            outcome.best_glyph.as_ref().unwrap().glyph_name,
            "Still Recognition"
        );
        assert_eq!(outcome.glyphs.len(), 1);
    }

    #[test]
    fn test_scenario_c_disclosure_routes_to_protocol() {
        let f = fixture();
        let outcome = f.orchestrator.parse(
            "I have thoughts of suicide and I don't know how to keep going",
            None,
            Some("u1"),
        );

        assert_eq!(outcome.response_source, ResponseSource::Suicidality);
        assert!(outcome.voltage_response.to_lowercase().contains("not a substitute")
            || outcome.voltage_response.to_lowercase().contains("can't replace"));
        assert_no_blocked(&outcome.voltage_response);

        let state = f.orchestrator.protocol().state_of("u1").unwrap();
        assert!(state.consent.discussion_opt_in);
        assert_eq!(
            state.current,
            crate::safety::protocol::ProtocolState::Explore
        );
    }

    #[test]
    fn test_scenario_d_decline_resources_without_numbers() {
        let f = fixture();
        f.orchestrator.parse(
            "I have thoughts of suicide and I don't know how to keep going",
            None,
            Some("u1"),
        );

        // Still in Explore: no resource interest in this turn.
        let outcome = f.orchestrator.parse("what more?", None, Some("u1"));
        assert_eq!(outcome.response_source, ResponseSource::Suicidality);
        assert_eq!(
            f.orchestrator.protocol().state_of("u1").unwrap().current,
            crate::safety::protocol::ProtocolState::Explore
        );

        let outcome =
            f.orchestrator
                .parse("No, I don't want crisis information", None, Some("u1"));
        assert_eq!(outcome.response_source, ResponseSource::Suicidality);
        assert!(!outcome.voltage_response.contains("988"));
        assert!(!outcome.voltage_response.contains("741741"));
        assert_eq!(
            f.orchestrator.protocol().state_of("u1").unwrap().current,
            crate::safety::protocol::ProtocolState::ContinueSupport
        );
    }

    #[test]
    fn test_scenario_e_closing_alternation() {
        let f = fixture();
        let inputs = [
            "I feel overwhelmed by work",
            "Everything at my job keeps piling up",
            "I am overwhelmed again today",
            "The pressure at work will not let up",
            "I feel overwhelmed by all the changes",
            "My job keeps me stretched too thin",
            "Still overwhelmed, still at my desk",
            "Work swallowed the whole week",
        ];
        for (i, input) in inputs.iter().enumerate() {
            let outcome = f.orchestrator.parse(input, None, Some("cycle-user"));
            let ends_question = outcome.voltage_response.trim_end().ends_with('?');
            if i % 2 == 0 {
                assert!(ends_question, "turn {} should end with ?: {:?}", i + 1, outcome.voltage_response);
            } else {
                assert!(!ends_question, "turn {} should not end with ?: {:?}", i + 1, outcome.voltage_response);
            }
            assert_no_blocked(&outcome.voltage_response);
        }
    }

    #[test]
    fn test_scenario_f_no_invented_metaphors() {
        let f = fixture();
        let outcome =
            f.orchestrator
                .parse("I feel like I'm drowning in grief", None, Some("u1"));
        let lower = outcome.voltage_response.to_lowercase();
        assert!(!lower.contains("fire"));
        assert!(!lower.contains("mountain"));
    }

    #[test]
    fn test_degraded_pipeline_yields_fallback_message() {
        let dir = TempDir::new().unwrap();
        let config = OrchestratorConfig {
            lexicon_path: dir.path().join("missing.json"),
            learned_lexicon_path: dir.path().join("also-missing.json"),
            glyph_db_path: dir.path().join("glyphs.db"),
            archetype_library_path: dir.path().join("archetypes.json"),
            protocol_config_path: None,
            gate_table: None,
        };
        let orchestrator = Orchestrator::new(config).unwrap();

        let outcome = orchestrator.parse("zzz qqq", None, None);
        assert_eq!(outcome.voltage_response, FALLBACK_MESSAGE);
        assert_eq!(outcome.response_source, ResponseSource::FallbackMessage);
        assert!(outcome.signals.is_empty());
        assert!(outcome.gates.is_empty());
    }

    #[test]
    fn test_missing_protocol_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = OrchestratorConfig {
            protocol_config_path: Some(dir.path().join("nope.json")),
            ..OrchestratorConfig::default()
        };
        assert!(matches!(
            Orchestrator::new(config),
            Err(PipelineError::SuicidalityConfigMissing { .. })
        ));
    }

    #[test]
    fn test_empty_gates_skip_retrieval() {
        let f = fixture();
        let outcome = f.orchestrator.parse("completely unrelated words", None, Some("u1"));
        assert!(outcome.gates.is_empty());
        assert!(outcome.glyphs.is_empty());
        assert!(outcome.best_glyph.is_none());
    }

    #[test]
    fn test_fallback_outcome_echoes_input() {
        let outcome = fallback_outcome("I feel anxious");
        assert_eq!(outcome.input, "I feel anxious");
        assert_eq!(outcome.voltage_response, FALLBACK_MESSAGE);
        assert_eq!(outcome.response_source, ResponseSource::FallbackMessage);
    }

    #[test]
    fn test_response_source_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ResponseSource::FallbackMessage).unwrap(),
            "\"fallback_message\""
        );
        assert_eq!(ResponseSource::DynamicComposer.as_str(), "dynamic_composer");
    }

    #[test]
    fn test_free_function_surface() {
        let dir = TempDir::new().unwrap();
        let lexicon_path = dir.path().join("lexicon.json");
        fs::write(
            &lexicon_path,
            r#"{ "anxious": { "signal": "θ", "voltage": "high", "tone": "anxious" } }"#,
        )
        .unwrap();
        let db_path = dir.path().join("glyphs.db");

        let outcome = parse_input("I feel anxious", &lexicon_path, &db_path, None, Some("u1"));
        assert!(!outcome.voltage_response.is_empty());
        assert!(outcome.signals.iter().any(|s| s.keyword == "anxious"));
    }

    #[test]
    fn test_async_wrapper() {
        let f = fixture();
        let orchestrator = Arc::new(f.orchestrator);
        let outcome = tokio_test::block_on(orchestrator.aparse_input(
            "I feel anxious".to_string(),
            None,
            Some("u1".to_string()),
        ));
        assert!(!outcome.voltage_response.is_empty());
    }
}
