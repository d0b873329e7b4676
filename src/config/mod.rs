//! Configuration module for Logfolio
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// First settings file that exists.
///
/// `LOGFOLIO_SETTINGS_PATH` wins over the well-known locations.
pub fn locate() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var("LOGFOLIO_SETTINGS_PATH") {
        candidates.push(PathBuf::from(path));
    }
    candidates.extend([
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/logfolio/settings.yml"),
    ]);
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("logfolio/settings.yml"));
    }

    candidates.into_iter().find(|p| p.exists())
}

/// Load settings from `path`, or defaults when there is none.
///
/// Environment overrides are applied last in every case. Nothing is logged
/// here since the subscriber is configured from the result.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    settings.merge_env();
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yml");
        std::fs::write(&path, "general:\n  instance_name: shelf\n").unwrap();

        let settings = load(Some(&path)).unwrap();
        assert_eq!(settings.general.instance_name, "shelf");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = load(None).unwrap();
        assert_eq!(settings.providers.len(), 2);
    }

    #[test]
    fn test_unreadable_file_names_path() {
        let err = load(Some(Path::new("/nonexistent/settings.yml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/settings.yml"));
    }
}
