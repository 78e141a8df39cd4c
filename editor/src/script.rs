//! Scripted editing sessions.
//!
//! A session is a TOML document with an ordered `[[step]]` array:
//!
//! ```toml
//! [[step]]
//! op = "add-element"
//! id = "n0"
//! attributes = { label = "Start" }
//!
//! [[step]]
//! op = "add-link"
//! id = "l0"
//! source = { id = "n0" }
//! target = { x = 40.0, y = 10.0 }
//!
//! [[step]]
//! op = "set"
//! id = "l0"
//! name = "target"
//! value = { id = "n1" }
//! interactive = true
//!
//! [[step]]
//! op = "undo"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use trellis_core::cell::{Attributes, Cell, Endpoint};
use trellis_core::graph::sort_cells;
use trellis_core::{Board, GraphError};

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse script: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("step {step}: {source}")]
    Graph { step: usize, source: GraphError },
    #[error("step {step}: {value} is not a link endpoint")]
    InvalidEndpoint { step: usize, value: Value },
    #[error("failed to encode diagram: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One scripted operation. Cells are addressed by identifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    AddElement {
        id: String,
        #[serde(default)]
        attributes: Attributes,
    },
    AddLink {
        id: String,
        source: Value,
        target: Value,
        #[serde(default)]
        attributes: Attributes,
    },
    Set {
        id: String,
        name: String,
        value: Value,
        #[serde(default)]
        interactive: bool,
    },
    Remove {
        id: String,
    },
    Embed {
        parent: String,
        child: String,
    },
    Unembed {
        parent: String,
        child: String,
    },
    Rename {
        id: String,
        to: String,
    },
    Start,
    Stop,
    Undo {
        #[serde(default = "default_true")]
        record_redo: bool,
    },
    Redo,
    Abort,
    Clear,
}

fn default_true() -> bool {
    true
}

impl Script {
    pub fn from_toml_str(content: &str) -> Result<Self, ScriptError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies every step in order. Steps are numbered from 1 in errors.
    pub fn run(&self, board: &mut Board) -> Result<(), ScriptError> {
        for (index, step) in self.steps.iter().enumerate() {
            run_step(board, index + 1, step)?;
        }
        Ok(())
    }
}

fn run_step(board: &mut Board, step: usize, op: &Step) -> Result<(), ScriptError> {
    let graph_err = |source| ScriptError::Graph { step, source };
    log::debug!("step {step}: {op:?}");

    match op {
        Step::AddElement { id, attributes } => {
            let cell = with_attributes(Cell::element(id.as_str()), attributes);
            board.add_cell(cell).map_err(graph_err)?;
        }
        Step::AddLink {
            id,
            source,
            target,
            attributes,
        } => {
            let endpoint = |value: &Value| {
                Endpoint::from_value(value).ok_or_else(|| ScriptError::InvalidEndpoint {
                    step,
                    value: value.clone(),
                })
            };
            let cell = Cell::link(id.as_str(), endpoint(source)?, endpoint(target)?);
            board
                .add_cell(with_attributes(cell, attributes))
                .map_err(graph_err)?;
        }
        Step::Set {
            id,
            name,
            value,
            interactive,
        } => {
            let key = board.require(id).map_err(graph_err)?;
            let result = if *interactive {
                board.set_interactive(key, name, value.clone())
            } else {
                board.set(key, name, value.clone())
            };
            result.map_err(graph_err)?;
        }
        Step::Remove { id } => {
            let key = board.require(id).map_err(graph_err)?;
            board.remove_cell(key).map_err(graph_err)?;
        }
        Step::Embed { parent, child } => {
            let parent = board.require(parent).map_err(graph_err)?;
            let child = board.require(child).map_err(graph_err)?;
            board.embed(parent, child).map_err(graph_err)?;
        }
        Step::Unembed { parent, child } => {
            let parent = board.require(parent).map_err(graph_err)?;
            let child = board.require(child).map_err(graph_err)?;
            board.unembed(parent, child).map_err(graph_err)?;
        }
        Step::Rename { id, to } => {
            let key = board.require(id).map_err(graph_err)?;
            if !board.change_id(key, to).map_err(graph_err)? {
                log::warn!("step {step}: \"{to}\" is taken, \"{id}\" keeps its identifier");
            }
        }
        Step::Start => board.start(),
        Step::Stop => {
            if !board.stop() {
                log::info!("step {step}: transaction recorded nothing");
            }
        }
        Step::Undo { record_redo } => {
            let undone = if *record_redo {
                board.undo()
            } else {
                board.undo_without_redo()
            };
            if !undone.map_err(graph_err)? {
                log::info!("step {step}: nothing to undo");
            }
        }
        Step::Redo => {
            if !board.redo().map_err(graph_err)? {
                log::info!("step {step}: nothing to redo");
            }
        }
        Step::Abort => {
            board.abort().map_err(graph_err)?;
        }
        Step::Clear => board.clear(),
    }
    Ok(())
}

fn with_attributes(cell: Cell, attributes: &Attributes) -> Cell {
    attributes
        .iter()
        .fold(cell, |cell, (name, value)| cell.with(name.as_str(), value.clone()))
}

/// The board's cells in canonical order, as JSON.
pub fn render(board: &Board, pretty: bool) -> Result<String, ScriptError> {
    let mut cells: Vec<Cell> = board.graph().cells().cloned().collect();
    sort_cells(&mut cells);
    let json = if pretty {
        serde_json::to_string_pretty(&cells)?
    } else {
        serde_json::to_string(&cells)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use trellis_core::CellGraph;

    use super::*;

    fn run(source: &str) -> Board {
        let script = Script::from_toml_str(source).unwrap();
        let mut board = Board::new();
        script.run(&mut board).unwrap();
        board
    }

    #[test]
    fn parses_every_op() {
        let script = Script::from_toml_str(
            r#"
            [[step]]
            op = "add-element"
            id = "n0"

            [[step]]
            op = "undo"
            record_redo = false

            [[step]]
            op = "redo"

            [[step]]
            op = "clear"
            "#,
        )
        .unwrap();
        assert_eq!(
            script.steps,
            vec![
                Step::AddElement {
                    id: "n0".into(),
                    attributes: Attributes::new(),
                },
                Step::Undo { record_redo: false },
                Step::Redo,
                Step::Clear,
            ]
        );
    }

    #[test]
    fn link_drawing_session() {
        let board = run(r#"
            [[step]]
            op = "add-element"
            id = "n0"
            attributes = { label = "Start" }

            [[step]]
            op = "add-element"
            id = "n1"

            [[step]]
            op = "add-link"
            id = "l0"
            source = { id = "n0" }
            target = { x = 40.0, y = 10.0 }

            [[step]]
            op = "set"
            id = "l0"
            name = "target"
            value = { id = "n1" }
            interactive = true

            [[step]]
            op = "undo"
            "#);

        assert!(board.key_of("l0").is_none());
        assert_eq!(board.reactor().history_len(), 2);
        assert_eq!(board.reactor().future_len(), 1);
        let n0 = board.graph().cell_by_id("n0").unwrap();
        assert_eq!(n0.get("label"), &json!("Start"));
    }

    #[test]
    fn rename_collision_is_not_an_error() {
        let board = run(r#"
            [[step]]
            op = "add-element"
            id = "a"

            [[step]]
            op = "add-element"
            id = "b"

            [[step]]
            op = "rename"
            id = "a"
            to = "b"
            "#);
        assert!(board.key_of("a").is_some());
        assert_eq!(board.reactor().history_len(), 2);
    }

    #[test]
    fn unknown_cell_reports_step() {
        let script = Script::from_toml_str(
            r#"
            [[step]]
            op = "remove"
            id = "ghost"
            "#,
        )
        .unwrap();
        let err = script.run(&mut Board::new()).unwrap_err();
        assert!(matches!(err, ScriptError::Graph { step: 1, .. }));
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        let script = Script::from_toml_str(
            r#"
            [[step]]
            op = "add-link"
            id = "l0"
            source = { id = "n0" }
            target = "nowhere"
            "#,
        )
        .unwrap();
        let err = script.run(&mut Board::new()).unwrap_err();
        assert!(matches!(err, ScriptError::InvalidEndpoint { step: 1, .. }));
    }

    #[test]
    fn render_lists_elements_before_links() {
        let board = run(r#"
            [[step]]
            op = "add-element"
            id = "a"

            [[step]]
            op = "add-link"
            id = "l"
            source = { id = "a" }
            target = { id = "a" }

            [[step]]
            op = "add-element"
            id = "b"
            "#);
        let rendered: Value = serde_json::from_str(&render(&board, false).unwrap()).unwrap();
        let ids: Vec<&str> = rendered
            .as_array()
            .unwrap()
            .iter()
            .map(|cell| cell["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "l"]);
        assert_eq!(rendered[2]["type"], json!("link"));
    }
}
