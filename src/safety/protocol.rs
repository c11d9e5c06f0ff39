//! The consent-based suicidality state machine.
//!
//! Per-user state lives in a concurrent map with a per-user lock; turns for
//! one user serialize, turns across users do not. The protocol never forces
//! resources and never compels: every offer is an invitation the user can
//! decline, and a decline is acknowledged as a boundary.
//!
//! Detection runs before all other pipeline phases. Once a user has an
//! active protocol state, their turns keep routing here so continuity and
//! check-ins can happen.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::safety::ProtocolConfig;

/// Protocol states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolState {
    DisclosureDetected,
    Explore,
    OfferResources,
    ContinueSupport,
    CheckInInvite,
    AwaitReturn,
    ReturnDetected,
}

/// Consent the user has (or has not) given.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConsentFlags {
    pub discussion_opt_in: bool,
    pub resources_opt_in: bool,
    pub check_in_invited: bool,
}

/// One recorded disclosure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisclosureRecord {
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub state: ProtocolState,
}

/// Per-user protocol state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProtocolState {
    pub current: ProtocolState,
    pub consent: ConsentFlags,
    pub disclosure_history: Vec<DisclosureRecord>,
    pub first_disclosure_time: DateTime<Utc>,
    pub last_check_in_time: Option<DateTime<Utc>>,
    pub check_in_count: u32,
}

impl UserProtocolState {
    fn new() -> Self {
        Self {
            current: ProtocolState::DisclosureDetected,
            consent: ConsentFlags::default(),
            disclosure_history: Vec::new(),
            first_disclosure_time: Utc::now(),
            last_check_in_time: None,
            check_in_count: 0,
        }
    }
}

/// One protocol reply plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolReply {
    pub text: String,
    pub state_after: ProtocolState,
    pub consent: ConsentFlags,
    pub check_in_count: u32,
}

const RESOURCE_INTEREST_WORDS: &[&str] = &[
    "resource", "resources", "hotline", "helpline", "line", "number", "information", "crisis", "help",
];
const AFFIRMATIVE_WORDS: &[&str] = &["yes", "please", "sure", "okay", "helpful"];
const NEGATIVE_WORDS: &[&str] = &["no", "don't", "not", "decline"];

/// The per-user consent-based state machine.
pub struct SuicidalityProtocol {
    config: ProtocolConfig,
    states: DashMap<String, Arc<Mutex<UserProtocolState>>>,
}

impl SuicidalityProtocol {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            states: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Whether `text` contains a direct disclosure term.
    pub fn detect(&self, text: &str) -> bool {
        self.config.detects_disclosure(text)
    }

    /// Whether the user already has an active protocol state.
    pub fn has_active_state(&self, user_id: &str) -> bool {
        self.states.contains_key(user_id)
    }

    /// Current state snapshot, if any.
    pub fn state_of(&self, user_id: &str) -> Option<UserProtocolState> {
        self.states.get(user_id).map(|e| e.value().lock().clone())
    }

    /// Process one user turn through the state machine.
    ///
    /// Every emitted string passes through the blocked-phrase safeguard.
    pub fn step(&self, user_id: &str, text: &str) -> ProtocolReply {
        let entry = self
            .states
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(UserProtocolState::new())))
            .clone();
        let mut state = entry.lock();

        let disclosed = self.detect(text);
        if disclosed {
            let current = state.current;
            state.disclosure_history.push(DisclosureRecord {
                timestamp: Utc::now(),
                text: text.to_string(),
                state: current,
            });
        }

        // A pending check-in takes precedence over whatever state the turn
        // would otherwise land in.
        if state.current == ProtocolState::AwaitReturn && state.consent.check_in_invited {
            state.current = ProtocolState::ReturnDetected;
            state.check_in_count += 1;
            state.last_check_in_time = Some(Utc::now());
            let recognition = ProtocolConfig::pick(&self.config.check_in_recognition).to_string();
            state.current = if disclosed {
                ProtocolState::Explore
            } else {
                ProtocolState::ContinueSupport
            };
            return self.reply(&state, recognition);
        }

        let text_lower = text.to_lowercase();
        let response = match state.current {
            ProtocolState::DisclosureDetected => {
                state.consent.discussion_opt_in = true;
                state.current = ProtocolState::Explore;
                format!(
                    "{} {} {}",
                    ProtocolConfig::pick(&self.config.acknowledgment),
                    ProtocolConfig::pick(&self.config.role_clarity),
                    ProtocolConfig::pick(&self.config.invitation),
                )
            }
            ProtocolState::Explore => {
                if mentions_any(&text_lower, RESOURCE_INTEREST_WORDS) {
                    state.current = ProtocolState::OfferResources;
                    self.offer_resources(&mut state, &text_lower)
                } else {
                    format!(
                        "{} {}",
                        ProtocolConfig::pick(&self.config.exploration),
                        ProtocolConfig::pick(&self.config.supports),
                    )
                }
            }
            ProtocolState::OfferResources => self.offer_resources(&mut state, &text_lower),
            ProtocolState::ContinueSupport => {
                state.consent.check_in_invited = true;
                // CheckInInvite emits nothing of its own; collapse straight
                // to awaiting the user's return.
                state.current = ProtocolState::AwaitReturn;
                ProtocolConfig::pick(&self.config.continuity).to_string()
            }
            // Reached only transiently; treat like continued support.
            ProtocolState::CheckInInvite
            | ProtocolState::AwaitReturn
            | ProtocolState::ReturnDetected => {
                state.current = ProtocolState::AwaitReturn;
                ProtocolConfig::pick(&self.config.continuity).to_string()
            }
        };

        self.reply(&state, response)
    }

    /// Consent classification inside `OfferResources`. A decline is checked
    /// first: "no thanks, not helpful" must read as a boundary even though
    /// it contains an affirmative word.
    fn offer_resources(&self, state: &mut UserProtocolState, text_lower: &str) -> String {
        if mentions_any(text_lower, NEGATIVE_WORDS) {
            state.current = ProtocolState::ContinueSupport;
            format!(
                "That's okay, we don't have to bring any of that in. {}",
                ProtocolConfig::pick(&self.config.continuity)
            )
        } else if mentions_any(text_lower, AFFIRMATIVE_WORDS) {
            state.consent.resources_opt_in = true;
            state.current = ProtocolState::ContinueSupport;
            ProtocolConfig::pick(&self.config.crisis_resources_detailed).to_string()
        } else {
            // Neither consent nor decline: re-ask, stay in state.
            ProtocolConfig::pick(&self.config.resources).to_string()
        }
    }

    fn reply(&self, state: &UserProtocolState, text: String) -> ProtocolReply {
        ProtocolReply {
            text: self.config.enforce_safeguards(text),
            state_after: state.current,
            consent: state.consent,
            check_in_count: state.check_in_count,
        }
    }
}

fn mentions_any(text_lower: &str, words: &[&str]) -> bool {
    crate::utilities::string_utils::tokenize(text_lower)
        .iter()
        .any(|t| words.contains(&t.as_str()))
}
