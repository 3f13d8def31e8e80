//! Persistence for local display preferences.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub fn load(path: &Path) -> Result<Option<Preferences>, PersistenceError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let preferences = serde_json::from_str::<Preferences>(&contents)?;
    Ok(Some(preferences))
}

pub fn save(path: &Path, preferences: &Preferences) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(preferences)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Load saved preferences. A missing or unreadable file yields the defaults.
pub fn load_or_default(path: &Path) -> Preferences {
    match load(path) {
        Ok(preferences) => preferences.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Ignoring unreadable preferences");
            Preferences::default()
        }
    }
}
