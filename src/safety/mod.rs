//! Consent-based suicidality protocol — configuration and language
//! safeguards.
//!
//! The protocol config is JSON: template pools (lists of strings, selected
//! uniform-random) plus the language safeguards — the direct terms that
//! trigger detection and the blocked phrases no emitted text may ever
//! contain. A missing or invalid config is fatal at startup; a running
//! pipeline must never emit an unsafeguarded message.

pub mod protocol;

use std::path::Path;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::utilities::errors::PipelineError;

/// Embedded default config, used when no file is supplied.
const EMBEDDED_PROTOCOL_JSON: &str = include_str!("default_protocol.json");

/// Detection terms and forbidden platitudes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSafeguards {
    pub direct_terms: Vec<String>,
    pub blocked_phrases: Vec<String>,
}

/// Full protocol configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub acknowledgment: Vec<String>,
    pub role_clarity: Vec<String>,
    pub invitation: Vec<String>,
    pub exploration: Vec<String>,
    pub supports: Vec<String>,
    pub resources: Vec<String>,
    pub crisis_resources_detailed: Vec<String>,
    pub continuity: Vec<String>,
    pub check_in_recognition: Vec<String>,
    pub language_safeguards: LanguageSafeguards,
}

impl ProtocolConfig {
    /// The embedded default configuration.
    pub fn embedded() -> Self {
        let config: Self = serde_json::from_str(EMBEDDED_PROTOCOL_JSON)
            .expect("embedded protocol config must parse");
        config
            .validate()
            .expect("embedded protocol config must validate");
        config
    }

    /// Load from a file. Missing or unparseable config is fatal.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content =
            std::fs::read_to_string(path).map_err(|_| PipelineError::SuicidalityConfigMissing {
                path: path.display().to_string(),
            })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|_| PipelineError::SuicidalityConfigMissing {
                path: path.display().to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        let pools: [(&str, &Vec<String>); 9] = [
            ("acknowledgment", &self.acknowledgment),
            ("role_clarity", &self.role_clarity),
            ("invitation", &self.invitation),
            ("exploration", &self.exploration),
            ("supports", &self.supports),
            ("resources", &self.resources),
            ("crisis_resources_detailed", &self.crisis_resources_detailed),
            ("continuity", &self.continuity),
            ("check_in_recognition", &self.check_in_recognition),
        ];
        for (name, pool) in pools {
            if pool.is_empty() {
                return Err(PipelineError::SuicidalityConfigMissing {
                    path: format!("pool {name} is empty"),
                });
            }
        }
        if self.language_safeguards.direct_terms.is_empty() {
            return Err(PipelineError::SuicidalityConfigMissing {
                path: "language_safeguards.direct_terms is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Uniform-random pick from a template pool.
    pub fn pick(pool: &[String]) -> &str {
        pool.choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Whether `text` contains a direct disclosure term.
    pub fn detects_disclosure(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.language_safeguards
            .direct_terms
            .iter()
            .any(|term| lowered.contains(&term.to_lowercase()))
    }

    /// First blocked phrase found in `text`, if any.
    pub fn blocked_phrase_in(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.language_safeguards
            .blocked_phrases
            .iter()
            .find(|phrase| lowered.contains(&phrase.to_lowercase()))
            .map(String::as_str)
    }

    /// Hard invariant: no emitted protocol text may contain a blocked
    /// phrase. A violation aborts the reply and substitutes a minimal safe
    /// acknowledgment plus the crisis resource list.
    pub fn enforce_safeguards(&self, text: String) -> String {
        match self.blocked_phrase_in(&text) {
            None => text,
            Some(phrase) => {
                let violation = PipelineError::ProtocolInvariantViolation {
                    phrase: phrase.to_string(),
                };
                log::error!("{violation}; substituting safe reply");
                format!(
                    "I hear you, and I'm staying with you. {}",
                    Self::pick(&self.crisis_resources_detailed)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = ProtocolConfig::embedded();
        assert!(!config.acknowledgment.is_empty());
        assert!(config
            .language_safeguards
            .blocked_phrases
            .contains(&"stay positive".to_string()));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = ProtocolConfig::load(Path::new("/nonexistent/protocol.json"));
        assert!(matches!(
            err,
            Err(PipelineError::SuicidalityConfigMissing { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("protocol.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(ProtocolConfig::load(&path).is_err());
    }

    #[test]
    fn test_detects_disclosure_case_insensitive() {
        let config = ProtocolConfig::embedded();
        assert!(config.detects_disclosure("I have thoughts of SUICIDE lately"));
        assert!(config.detects_disclosure("sometimes I want to die"));
        assert!(!config.detects_disclosure("my day was hard"));
    }

    #[test]
    fn test_enforce_passes_clean_text() {
        let config = ProtocolConfig::embedded();
        let text = "I'm here with you.".to_string();
        assert_eq!(config.enforce_safeguards(text.clone()), text);
    }

    #[test]
    fn test_enforce_substitutes_blocked_phrase() {
        let config = ProtocolConfig::embedded();
        let bad = "It's hard, but you have SO much to live for!".to_string();
        let out = config.enforce_safeguards(bad);
        assert!(!out.to_lowercase().contains("so much to live for"));
        assert!(out.contains("988"));
    }

    #[test]
    fn test_no_template_contains_blocked_phrase() {
        let config = ProtocolConfig::embedded();
        let pools = [
            &config.acknowledgment,
            &config.role_clarity,
            &config.invitation,
            &config.exploration,
            &config.supports,
            &config.resources,
            &config.crisis_resources_detailed,
            &config.continuity,
            &config.check_in_recognition,
        ];
        for pool in pools {
            for template in pool.iter() {
                assert!(
                    config.blocked_phrase_in(template).is_none(),
                    "blocked phrase in template: {template}"
                );
            }
        }
    }
}
