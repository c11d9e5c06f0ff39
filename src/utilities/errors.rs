//! Error taxonomy for the signal-to-response pipeline.
//!
//! Every variant here is recoverable at the orchestrator level except
//! [`PipelineError::SuicidalityConfigMissing`], which is fatal at startup:
//! a running pipeline must never emit an unsafeguarded message.

use thiserror::Error;

/// Errors raised by pipeline components.
///
/// Components catch their own failures and surface them as sentinel values
/// plus a diagnostic string; the orchestrator maps the remainder onto a
/// degraded path and never propagates to callers.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Neither the base nor the learned lexicon file could be loaded.
    #[error("lexicon unavailable: {message}")]
    LexiconUnavailable { message: String },

    /// The glyph index could not be opened or queried.
    #[error("glyph store unavailable: {message}")]
    GlyphStoreUnavailable { message: String },

    /// The archetype library file exists but cannot be parsed.
    /// The library degrades to read-only empty mode.
    #[error("archetype library corrupt: {message}")]
    ArchetypeLibraryCorrupt { message: String },

    /// The suicidality protocol config is missing or unreadable.
    /// Fatal at startup only.
    #[error("suicidality protocol config missing: {path}")]
    SuicidalityConfigMissing { path: String },

    /// Emitted protocol text contained a blocked phrase. The reply is
    /// aborted and substituted with a minimal safe acknowledgment.
    #[error("protocol invariant violation: blocked phrase {phrase:?}")]
    ProtocolInvariantViolation { phrase: String },

    /// Underlying storage error.
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Underlying serialization error.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the orchestrator may degrade and continue.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PipelineError::SuicidalityConfigMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_missing_is_fatal() {
        let err = PipelineError::SuicidalityConfigMissing {
            path: "/etc/solace/protocol.json".into(),
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_lexicon_unavailable_is_recoverable() {
        let err = PipelineError::LexiconUnavailable {
            message: "no such file".into(),
        };
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_display_names_component() {
        let err = PipelineError::GlyphStoreUnavailable {
            message: "locked".into(),
        };
        assert!(err.to_string().contains("glyph store"));
    }
}
