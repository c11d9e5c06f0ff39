//! JSON file persistence with atomic replace.
//!
//! The lexicon overlay, the archetype library, and the protocol config all
//! load through here. Writes go to a `.tmp` sibling first and are renamed
//! into place, so readers never observe a half-written file.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Load JSON from `path`, deserialized into `T`.
///
/// Returns `None` if the file does not exist; `Err` if it exists but cannot
/// be read or parsed.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;
    Ok(Some(value))
}

/// Serialize `data` as pretty JSON and atomically replace `path`.
///
/// The parent directory is created if missing. The write lands in
/// `<path>.tmp` and is renamed over the target, which is atomic on POSIX
/// filesystems.
pub fn save_json_atomic<T: Serialize>(path: &Path, data: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(data)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
