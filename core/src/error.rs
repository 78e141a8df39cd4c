//! Error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::cell::CellKey;

/// Failures reported by a cell graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("cell {0} is not in the graph")]
    UnknownCell(CellKey),
    #[error("no cell with identifier \"{0}\"")]
    UnknownId(String),
    #[error("identifier \"{0}\" is already in use")]
    DuplicateId(String),
    #[error("cell key {0} is already in use")]
    KeyInUse(CellKey),
    #[error("cell has no identifier")]
    MissingId,
    #[error("identifier must be a non-empty string, got {0}")]
    InvalidId(String),
}

/// Result type for graph operations.
pub type GraphResult<T = ()> = Result<T, GraphError>;

/// Failures while loading an [`UndoConfig`](crate::config::UndoConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_display() {
        assert_eq!(
            GraphError::UnknownCell(CellKey::from_raw(7)).to_string(),
            "cell #7 is not in the graph"
        );
        assert_eq!(
            GraphError::DuplicateId("n1".into()).to_string(),
            "identifier \"n1\" is already in use"
        );
        assert_eq!(GraphError::MissingId.to_string(), "cell has no identifier");
    }

    #[test]
    fn config_error_mentions_path() {
        let err = ConfigError::Read {
            path: PathBuf::from("undo.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().starts_with("failed to read undo.toml"));
    }
}
