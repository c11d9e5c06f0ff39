//! SQLite-backed glyph index.
//!
//! Two logical tables with identical schema: `glyphs` (primary) and
//! `glyphs_salvaged` (recovered fallback). Retrieval is a single indexed
//! lookup per gate set; when the primary returns nothing the salvaged table
//! is consulted. The store is read-only after startup seeding.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use crate::glyphs::{is_artifact, Glyph};
use crate::utilities::errors::PipelineError;

const SELECT_COLUMNS: &str = "glyph_id, glyph_name, description, gate, emotional_signal";

/// Which logical table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphTable {
    Primary,
    Salvaged,
}

impl GlyphTable {
    fn name(&self) -> &'static str {
        match self {
            GlyphTable::Primary => "glyphs",
            GlyphTable::Salvaged => "glyphs_salvaged",
        }
    }
}

/// Result of one retrieval: retained glyphs plus the opaque query shape
/// used, surfaced to callers as `debug_sql`.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub glyphs: Vec<Glyph>,
    /// Opaque diagnostic string describing the query shape.
    pub query_shape: String,
    /// Number of candidate rows before artifact pruning.
    pub candidates: usize,
}

/// Read-only indexed store of glyph records keyed by gate.
pub struct GlyphStore {
    db_path: PathBuf,
}

impl GlyphStore {
    /// Open (and if needed create) the glyph database.
    pub fn open(db_path: &Path) -> Result<Self, PipelineError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PipelineError::GlyphStoreUnavailable {
                        message: e.to_string(),
                    }
                })?;
            }
        }
        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        store.initialize_db().map_err(|e| PipelineError::GlyphStoreUnavailable {
            message: e.to_string(),
        })?;
        Ok(store)
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.db_path)
    }

    fn initialize_db(&self) -> rusqlite::Result<()> {
        let conn = self.connect()?;
        for table in ["glyphs", "glyphs_salvaged"] {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    glyph_id INTEGER PRIMARY KEY,
                    glyph_name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    gate TEXT NOT NULL,
                    emotional_signal TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_{table}_gate ON {table}(gate);"
            ))?;
        }
        Ok(())
    }

    /// Insert one glyph (bootstrap/seeding surface; retrieval never writes).
    pub fn insert(&self, table: GlyphTable, glyph: &Glyph) -> Result<(), PipelineError> {
        let conn = self.connect()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (glyph_id, glyph_name, description, gate, emotional_signal)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                table.name()
            ),
            params![
                glyph.glyph_id,
                glyph.glyph_name,
                glyph.description,
                glyph.gate,
                glyph.emotional_signal,
            ],
        )?;
        Ok(())
    }

    /// Number of rows in a table.
    pub fn count(&self, table: GlyphTable) -> Result<usize, PipelineError> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Fetch candidate glyphs for the activated gates.
    ///
    /// The union over gates is deduplicated by `glyph_id`. Artifact rows are
    /// pruned before the result is returned. Falls back to the salvaged
    /// table when the primary yields nothing (pre-pruning).
    pub fn fetch(&self, gates: &[String]) -> Result<FetchResult, PipelineError> {
        if gates.is_empty() {
            return Ok(FetchResult {
                glyphs: Vec::new(),
                query_shape: "no gates activated; no query issued".to_string(),
                candidates: 0,
            });
        }

        let conn = self.connect()?;
        let (primary, shape) = self.fetch_table(&conn, GlyphTable::Primary, gates)?;
        let (rows, query_shape) = if primary.is_empty() {
            let (salvaged, salvaged_shape) =
                self.fetch_table(&conn, GlyphTable::Salvaged, gates)?;
            (salvaged, format!("{shape}; fallback: {salvaged_shape}"))
        } else {
            (primary, shape)
        };

        let candidates = rows.len();
        let mut seen: HashSet<i64> = HashSet::new();
        let glyphs: Vec<Glyph> = rows
            .into_iter()
            .filter(|g| seen.insert(g.glyph_id))
            .filter(|g| {
                let keep = !is_artifact(g);
                if !keep {
                    log::debug!("pruned artifact glyph {} ({:?})", g.glyph_id, g.glyph_name);
                }
                keep
            })
            .collect();

        Ok(FetchResult {
            glyphs,
            query_shape,
            candidates,
        })
    }

    fn fetch_table(
        &self,
        conn: &Connection,
        table: GlyphTable,
        gates: &[String],
    ) -> Result<(Vec<Glyph>, String), PipelineError> {
        let placeholders = vec!["?"; gates.len()].join(", ");
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM {} WHERE gate IN ({placeholders}) ORDER BY glyph_id",
            table.name()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(gates.iter()), |row| {
            Ok(Glyph {
                glyph_id: row.get(0)?,
                glyph_name: row.get(1)?,
                description: row.get(2)?,
                gate: row.get(3)?,
                emotional_signal: row.get(4)?,
            })
        })?;
        let mut glyphs = Vec::new();
        for row in rows {
            glyphs.push(row?);
        }
        Ok((glyphs, sql))
    }
}
