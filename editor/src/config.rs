//! Editor configuration loaded from `--config`.

use std::path::Path;

use serde::Deserialize;
use trellis_core::{ConfigError, UndoConfig};

/// Top-level editor configuration.
///
/// ```toml
/// [undo]
/// max_history = 50
/// merge_interactive = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub undo: UndoConfig,
}

impl EditorConfig {
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

    /// Loads `path` if given, falling back to defaults when it cannot be read.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => {
                log::info!("loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{e}; using default configuration");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_table_is_optional() {
        let config: EditorConfig = toml::from_str("").unwrap();
        assert_eq!(config.undo, UndoConfig::default());

        let config: EditorConfig = toml::from_str("[undo]\nmax_history = 7\n").unwrap();
        assert_eq!(config.undo.max_history, 7);
        assert!(config.undo.merge_interactive);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let config = EditorConfig::load_or_default(Some(Path::new("/nonexistent/editor.toml")));
        assert_eq!(config.undo, UndoConfig::default());
    }
}
