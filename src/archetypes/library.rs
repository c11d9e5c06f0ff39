//! Persisted archetype library.
//!
//! The on-disk format is a JSON map `name → ConversationArchetype`, kept
//! sorted so no-op rewrites are byte-identical. Readers take an immutable
//! snapshot; writers serialize through a library-local mutex and publish
//! the new snapshot immediately, while disk flushes coalesce to at most
//! one per second ([`flush`] forces one). A corrupt file degrades the
//! library to read-only empty mode: matching returns nothing, updates are
//! logged and dropped.
//!
//! [`flush`]: ArchetypeLibrary::flush

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::archetypes::{ArchetypeMatch, ConversationArchetype};
use crate::utilities::errors::PipelineError;
use crate::utilities::file_handler;

/// Default match threshold.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.3;

/// Minimum interval between disk flushes; faster updates coalesce.
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

type ArchetypeMap = BTreeMap<String, ConversationArchetype>;

struct WriterState {
    last_flush: Option<Instant>,
    dirty: bool,
}

/// Persisted map of learned conversation archetypes.
pub struct ArchetypeLibrary {
    path: PathBuf,
    snapshot: RwLock<Arc<ArchetypeMap>>,
    writer: Mutex<WriterState>,
    read_only: AtomicBool,
}

impl ArchetypeLibrary {
    /// Open the library at `path`. A missing file is an empty library; a
    /// corrupt file drops into read-only empty mode.
    pub fn open(path: &Path) -> Self {
        let (map, read_only) = match file_handler::load_json::<ArchetypeMap>(path) {
            Ok(Some(map)) => (map, false),
            Ok(None) => (ArchetypeMap::new(), false),
            Err(e) => {
                let corrupt = PipelineError::ArchetypeLibraryCorrupt {
                    message: format!("{}: {}", path.display(), e),
                };
                log::error!("{corrupt}; operating read-only empty");
                (ArchetypeMap::new(), true)
            }
        };
        Self {
            path: path.to_path_buf(),
            snapshot: RwLock::new(Arc::new(map)),
            writer: Mutex::new(WriterState {
                last_flush: None,
                dirty: false,
            }),
            read_only: AtomicBool::new(read_only),
        }
    }

    /// Whether the library is in read-only empty mode (corrupt source file).
    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Option<ConversationArchetype> {
        self.snapshot.read().get(name).cloned()
    }

    /// Matches above `threshold`, best first.
    pub fn find_matches(
        &self,
        current_text: &str,
        prior_text: &str,
        threshold: f64,
    ) -> Vec<ArchetypeMatch> {
        let snapshot = self.snapshot.read().clone();
        let mut matches: Vec<ArchetypeMatch> = snapshot
            .values()
            .filter_map(|archetype| {
                let score = archetype.match_score(current_text, prior_text);
                (score >= threshold).then(|| ArchetypeMatch {
                    archetype: archetype.clone(),
                    score,
                })
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.archetype.name.cmp(&b.archetype.name))
        });
        matches
    }

    /// Best match above `threshold`, if any.
    pub fn best_match(
        &self,
        current_text: &str,
        prior_text: &str,
        threshold: f64,
    ) -> Option<ArchetypeMatch> {
        self.find_matches(current_text, prior_text, threshold)
            .into_iter()
            .next()
    }

    /// Record a usage outcome for `name` and persist.
    pub fn record_usage(&self, name: &str, success: bool) -> anyhow::Result<()> {
        self.mutate(|map| {
            if let Some(archetype) = map.get_mut(name) {
                archetype.record_outcome(success);
                true
            } else {
                log::warn!("record_usage for unknown archetype {:?}", name);
                false
            }
        })
    }

    /// Insert or merge an archetype candidate (learner surface) and persist.
    ///
    /// An existing archetype of the same name absorbs the candidate's cues,
    /// principles, bridges, and guidelines, then takes an EWMA step on the
    /// rating-derived success observation.
    pub fn upsert(
        &self,
        candidate: ConversationArchetype,
        success: Option<bool>,
    ) -> anyhow::Result<()> {
        self.mutate(|map| {
            match map.get_mut(&candidate.name) {
                Some(existing) => {
                    let before = existing.clone();
                    existing.absorb(&candidate);
                    if let Some(success) = success {
                        existing.record_outcome(success);
                    }
                    *existing != before
                }
                None => {
                    map.insert(candidate.name.clone(), candidate);
                    true
                }
            }
        })
    }

    /// Apply `f` under the write lock and publish the new snapshot when
    /// `f` reports a change. No-op updates leave the file untouched (and a
    /// forced rewrite of unchanged data is byte-identical, since the map
    /// serializes in sorted order). Disk flushes arriving faster than once
    /// per second coalesce; the pending state lands on the next update
    /// past the interval, or via [`flush`].
    ///
    /// [`flush`]: ArchetypeLibrary::flush
    fn mutate<F>(&self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut ArchetypeMap) -> bool,
    {
        if self.is_read_only() {
            log::error!(
                "archetype library {} is read-only; dropping update",
                self.path.display()
            );
            return Ok(());
        }

        let mut writer = self.writer.lock();
        let mut map = (**self.snapshot.read()).clone();
        let changed = f(&mut map);
        if !changed {
            return Ok(());
        }
        *self.snapshot.write() = Arc::new(map);
        writer.dirty = true;

        let due = writer
            .last_flush
            .map(|t| t.elapsed() >= FLUSH_INTERVAL)
            .unwrap_or(true);
        if due {
            self.flush_locked(&mut writer)?;
        }
        Ok(())
    }

    /// Force any coalesced state to disk.
    pub fn flush(&self) -> anyhow::Result<()> {
        if self.is_read_only() {
            return Ok(());
        }
        let mut writer = self.writer.lock();
        self.flush_locked(&mut writer)
    }

    fn flush_locked(&self, writer: &mut WriterState) -> anyhow::Result<()> {
        if !writer.dirty {
            return Ok(());
        }
        let map = self.snapshot.read().clone();
        file_handler::save_json_atomic(&self.path, &*map)?;
        writer.last_flush = Some(Instant::now());
        writer.dirty = false;
        Ok(())
    }
}
