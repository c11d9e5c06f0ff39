//! Lexicon store — merged keyword → signal mappings.
//!
//! Two JSON files back the store: a curated base lexicon and a learned
//! overlay. Learned entries override base entries on collision. Readers are
//! lock-free over an immutable snapshot; `learn` serializes through a
//! store-local mutex, persists the overlay atomically, then publishes a
//! fresh snapshot.
//!
//! File format: a map `keyword → {signal, voltage, tone}`. String-only
//! values are shorthand for `{signal: value, voltage: "medium",
//! tone: "unknown"}`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::signals::{Signal, SignalSource, VoltageBand};
use crate::utilities::errors::PipelineError;
use crate::utilities::file_handler;
use crate::utilities::string_utils::token_set;

/// Confidence assigned to direct lexicon keyword matches.
const LEXICON_MATCH_CONFIDENCE: f64 = 0.9;

/// Minimum interval between overlay flushes; faster updates coalesce.
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// One resolved lexicon entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub signal: String,
    #[serde(default)]
    pub voltage: VoltageBand,
    #[serde(default = "default_tone")]
    pub tone: String,
}

fn default_tone() -> String {
    "unknown".to_string()
}

impl LexiconEntry {
    /// Decode a lexicon file value: either a bare signal string or a full
    /// entry object.
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(signal) => Some(Self {
                signal: signal.clone(),
                voltage: VoltageBand::Medium,
                tone: default_tone(),
            }),
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

/// Immutable merged view published to readers.
#[derive(Debug, Default)]
struct LexiconSnapshot {
    /// keyword (lowercase) → entry, merged base + learned.
    merged: HashMap<String, LexiconEntry>,
    /// Keys containing whitespace, matched by literal substring.
    multi_word_keys: Vec<String>,
    /// Closed signal alphabet derived from the loaded entries.
    alphabet: BTreeSet<String>,
}

impl LexiconSnapshot {
    fn build(merged: HashMap<String, LexiconEntry>) -> Self {
        let mut multi_word_keys: Vec<String> = merged
            .keys()
            .filter(|k| k.contains(char::is_whitespace))
            .cloned()
            .collect();
        multi_word_keys.sort();
        let alphabet = merged.values().map(|e| e.signal.clone()).collect();
        Self {
            merged,
            multi_word_keys,
            alphabet,
        }
    }
}

/// Flush coalescing state, guarded by the writer mutex.
struct WriterState {
    learned: BTreeMap<String, LexiconEntry>,
    last_flush: Option<Instant>,
    dirty: bool,
}

/// Loads and merges base + learned lexicons; persists newly learned terms.
pub struct LexiconStore {
    learned_path: PathBuf,
    snapshot: RwLock<Arc<LexiconSnapshot>>,
    writer: Mutex<WriterState>,
}

impl LexiconStore {
    /// Open the store from a base lexicon file and a learned overlay file.
    ///
    /// Fails with [`PipelineError::LexiconUnavailable`] only when neither
    /// file yields any entries and the base file is absent or unreadable.
    pub fn open(base_path: &Path, learned_path: &Path) -> Result<Self, PipelineError> {
        let base = Self::load_file(base_path);
        let learned_raw = Self::load_file(learned_path);

        if base.is_none() && learned_raw.is_none() {
            return Err(PipelineError::LexiconUnavailable {
                message: format!(
                    "neither {} nor {} could be loaded",
                    base_path.display(),
                    learned_path.display()
                ),
            });
        }

        let learned: BTreeMap<String, LexiconEntry> = learned_raw
            .unwrap_or_default()
            .into_iter()
            .collect();

        let mut merged = base.unwrap_or_default();
        // Learned entries win on collision.
        for (k, v) in &learned {
            merged.insert(k.clone(), v.clone());
        }

        Ok(Self {
            learned_path: learned_path.to_path_buf(),
            snapshot: RwLock::new(Arc::new(LexiconSnapshot::build(merged))),
            writer: Mutex::new(WriterState {
                learned,
                last_flush: None,
                dirty: false,
            }),
        })
    }

    fn load_file(path: &Path) -> Option<HashMap<String, LexiconEntry>> {
        let raw: Option<HashMap<String, Value>> = match file_handler::load_json(path) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("lexicon file {} unreadable: {}", path.display(), e);
                None
            }
        };
        raw.map(|map| {
            map.iter()
                .filter_map(|(k, v)| {
                    LexiconEntry::from_value(v).map(|entry| (k.to_lowercase(), entry))
                })
                .collect()
        })
    }

    /// Number of merged entries.
    pub fn len(&self) -> usize {
        self.snapshot.read().merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The closed set of signal codes defined by the loaded lexicon.
    pub fn signal_alphabet(&self) -> BTreeSet<String> {
        self.snapshot.read().alphabet.clone()
    }

    /// Resolve a single keyword, if present.
    pub fn get(&self, keyword: &str) -> Option<LexiconEntry> {
        self.snapshot
            .read()
            .merged
            .get(&keyword.to_lowercase())
            .cloned()
    }

    /// Extract signals from free text.
    ///
    /// Single-word keys match on unicode word boundaries; multi-word keys
    /// match by literal substring. Matching is case-insensitive and each
    /// matched keyword is reported once, in sorted keyword order.
    pub fn lookup_tokens(&self, text: &str) -> Vec<Signal> {
        let snapshot = self.snapshot.read().clone();
        let lowered = text.to_lowercase();
        let words = token_set(&lowered);

        let mut matched: BTreeSet<&str> = BTreeSet::new();
        for key in &snapshot.multi_word_keys {
            if lowered.contains(key.as_str()) {
                matched.insert(key.as_str());
            }
        }
        for (key, _) in snapshot.merged.iter() {
            if !key.contains(char::is_whitespace) && words.contains(key) {
                matched.insert(key.as_str());
            }
        }

        matched
            .into_iter()
            .filter_map(|key| {
                snapshot.merged.get(key).map(|entry| {
                    Signal::new(
                        key,
                        entry.signal.clone(),
                        entry.voltage,
                        entry.tone.clone(),
                        LEXICON_MATCH_CONFIDENCE,
                        SignalSource::Lexicon,
                    )
                })
            })
            .collect()
    }

    /// Upsert a learned term and persist the overlay.
    ///
    /// Updates arriving faster than once per second coalesce; the overlay
    /// is flushed on the next update past the interval, or via [`flush`].
    ///
    /// [`flush`]: LexiconStore::flush
    pub fn learn(
        &self,
        keyword: &str,
        signal: &str,
        voltage: VoltageBand,
        tone: &str,
    ) -> anyhow::Result<()> {
        let mut writer = self.writer.lock();
        writer.learned.insert(
            keyword.to_lowercase(),
            LexiconEntry {
                signal: signal.to_string(),
                voltage,
                tone: tone.to_string(),
            },
        );
        writer.dirty = true;

        let due = writer
            .last_flush
            .map(|t| t.elapsed() >= FLUSH_INTERVAL)
            .unwrap_or(true);
        if due {
            self.flush_locked(&mut writer)?;
        }

        self.publish_locked(&writer);
        Ok(())
    }

    /// Force any coalesced learned entries to disk.
    pub fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self.writer.lock();
        if writer.dirty {
            self.flush_locked(&mut writer)?;
        }
        Ok(())
    }

    fn flush_locked(&self, writer: &mut WriterState) -> anyhow::Result<()> {
        file_handler::save_json_atomic(&self.learned_path, &writer.learned)?;
        writer.last_flush = Some(Instant::now());
        writer.dirty = false;
        Ok(())
    }

    /// Rebuild and publish the merged snapshot. Base entries are re-derived
    /// from the current snapshot minus the overlay, so only the overlay is
    /// re-read from memory.
    fn publish_locked(&self, writer: &WriterState) {
        let mut merged = self.snapshot.read().merged.clone();
        for (k, v) in &writer.learned {
            merged.insert(k.clone(), v.clone());
        }
        *self.snapshot.write() = Arc::new(LexiconSnapshot::build(merged));
    }
}
