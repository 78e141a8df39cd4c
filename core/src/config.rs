//! Undo engine settings, loadable from TOML.
//!
//! ```toml
//! max_history = 250
//! merge_interactive = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root history steps kept by default.
pub const DEFAULT_MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoConfig {
    /// Oldest root steps beyond this count are dropped. `0` keeps everything.
    /// Open transactions are never trimmed.
    pub max_history: usize,
    /// Merge consecutive interactive changes on the same cell into one step.
    pub merge_interactive: bool,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            merge_interactive: true,
        }
    }
}

impl UndoConfig {
    /// An unbounded configuration.
    pub fn unbounded() -> Self {
        Self {
            max_history: 0,
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            origin: "inline configuration".into(),
            source,
        })
    }

    /// Reads a configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = UndoConfig::default();
        assert_eq!(config.max_history, DEFAULT_MAX_HISTORY);
        assert!(config.merge_interactive);
        assert_eq!(UndoConfig::unbounded().max_history, 0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = UndoConfig::from_toml_str("max_history = 5").unwrap();
        assert_eq!(config.max_history, 5);
        assert!(config.merge_interactive);

        let empty = UndoConfig::from_toml_str("").unwrap();
        assert_eq!(empty, UndoConfig::default());
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = UndoConfig::from_toml_str("max_history = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = UndoConfig::load(Path::new("/nonexistent/trellis/undo.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("undo.toml"));
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("trellis-undo-{}.toml", std::process::id()));
        std::fs::write(&path, "merge_interactive = false\n").unwrap();
        let config = UndoConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!config.merge_interactive);
        assert_eq!(config.max_history, DEFAULT_MAX_HISTORY);
    }
}
