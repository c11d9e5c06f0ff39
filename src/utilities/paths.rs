//! Path resolution for on-disk stores (lexicon overlay, archetype library,
//! glyph index).

use std::env;
use std::path::PathBuf;

/// Returns the directory used for disk-backed stores.
///
/// Honors the `SOLACE_STORAGE_DIR` environment variable when set; otherwise
/// uses the platform data directory:
/// - Linux: `~/.local/share/solace`
/// - macOS: `~/Library/Application Support/solace`
/// - Windows: `%LOCALAPPDATA%\solace`
///
/// The directory is created if it does not exist.
pub fn storage_dir() -> PathBuf {
    let dir = match env::var("SOLACE_STORAGE_DIR") {
        Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => default_data_dir(),
    };
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn default_data_dir() -> PathBuf {
    let app_name = "solace";
    if cfg!(target_os = "linux") {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(app_name)
    } else if cfg!(target_os = "macos") {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join(app_name)
    } else if cfg!(target_os = "windows") {
        let local_app_data = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("APPDATA").unwrap_or_else(|_| "C:\\tmp".to_string()));
        PathBuf::from(local_app_data).join(app_name)
    } else {
        PathBuf::from("/tmp").join(app_name)
    }
}

/// Default path for the glyph index database.
pub fn default_glyph_db_path() -> PathBuf {
    storage_dir().join("glyphs.db")
}

/// Default path for the learned lexicon overlay.
pub fn default_learned_lexicon_path() -> PathBuf {
    storage_dir().join("learned_lexicon.json")
}

/// Default path for the archetype library.
pub fn default_archetype_library_path() -> PathBuf {
    storage_dir().join("archetypes.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_share_storage_dir() {
        let dir = storage_dir();
        assert!(default_glyph_db_path().starts_with(&dir));
        assert!(default_learned_lexicon_path().starts_with(&dir));
        assert!(default_archetype_library_path().starts_with(&dir));
    }
}
