/// Configuration for the change tracker.
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable that caps the number of undo batches kept.
pub const MAX_DEPTH_ENV_VAR: &str = "CHANGE_TRACKER_MAX_DEPTH";

/// Configuration for a `ChangeTracker`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Max committed batches kept on the undo stack.
    /// `None` keeps history unbounded. `Some(0)` keeps no history at all;
    /// the loaders below reject it and fall back to unbounded.
    pub max_history_depth: Option<usize>,
}

impl TrackerConfig {
    /// Builds a config from the process environment.
    ///
    /// Reads `CHANGE_TRACKER_MAX_DEPTH`; unset, empty, zero or unparsable
    /// values leave history unbounded.
    pub fn from_env() -> Self {
        let max_history_depth = match std::env::var(MAX_DEPTH_ENV_VAR) {
            Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    tracing::warn!("Ignoring {MAX_DEPTH_ENV_VAR}=0: depth must be at least 1");
                    None
                }
                Ok(depth) => Some(depth),
                Err(e) => {
                    tracing::warn!("Ignoring invalid {MAX_DEPTH_ENV_VAR}={raw:?}: {e}");
                    None
                }
            },
            _ => None,
        };
        Self { max_history_depth }
    }

    /// Loads config from a JSON file at `path`.
    /// Returns defaults on any error (missing file, parse error, etc.).
    /// A zero `max_history_depth` is ignored.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<TrackerConfig>(&contents) {
                Ok(mut config) => {
                    if config.max_history_depth == Some(0) {
                        tracing::warn!(
                            "Ignoring max_history_depth = 0 in {}: depth must be at least 1",
                            path.display()
                        );
                        config.max_history_depth = None;
                    }
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse tracker config at {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::debug!("No tracker config at {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_unbounded() {
        let config = TrackerConfig::default();
        assert_eq!(config.max_history_depth, None);
    }

    #[test]
    fn test_from_env() {
        // Save and restore env var
        let original = std::env::var(MAX_DEPTH_ENV_VAR).ok();

        std::env::set_var(MAX_DEPTH_ENV_VAR, "25");
        assert_eq!(TrackerConfig::from_env().max_history_depth, Some(25));

        std::env::set_var(MAX_DEPTH_ENV_VAR, "0");
        assert_eq!(TrackerConfig::from_env().max_history_depth, None);

        std::env::set_var(MAX_DEPTH_ENV_VAR, "lots");
        assert_eq!(TrackerConfig::from_env().max_history_depth, None);

        std::env::remove_var(MAX_DEPTH_ENV_VAR);
        assert_eq!(TrackerConfig::from_env().max_history_depth, None);

        // Restore
        if let Some(val) = original {
            std::env::set_var(MAX_DEPTH_ENV_VAR, val);
        }
    }

    #[test]
    fn test_load_from_json_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, r#"{ "max_history_depth": 3 }"#).expect("write");

        let config = TrackerConfig::load_or_default(&path);
        assert_eq!(config.max_history_depth, Some(3));
    }

    #[test]
    fn test_load_zero_depth_is_ignored() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, r#"{ "max_history_depth": 0 }"#).expect("write");

        assert_eq!(TrackerConfig::load_or_default(&path).max_history_depth, None);
    }

    #[test]
    fn test_load_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, "{}").expect("write");

        assert_eq!(TrackerConfig::load_or_default(&path), TrackerConfig::default());
    }

    #[test]
    fn test_load_broken_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").expect("write");

        assert_eq!(TrackerConfig::load_or_default(&broken), TrackerConfig::default());
        assert_eq!(
            TrackerConfig::load_or_default(&dir.path().join("absent.json")),
            TrackerConfig::default()
        );
    }
}
