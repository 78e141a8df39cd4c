//! # Trellis Core
//!
//! Transactional undo/redo for diagram graphs whose cells reference each
//! other by identifier.
//!
//! - [`cell`]: cells, endpoints and attribute access
//! - [`graph`]: the [`CellGraph`](graph::CellGraph) interface and an in-memory [`Diagram`](graph::Diagram)
//! - [`undo`]: entries, compaction, transactions and the [`UndoReactor`](undo::UndoReactor)
//! - [`board`]: a graph wired to its undo engine
//! - [`config`]: engine settings

pub mod board;
pub mod cell;
pub mod config;
pub mod error;
pub mod graph;
pub mod undo;

pub use board::Board;
pub use cell::{Cell, CellKey, Endpoint};
pub use config::UndoConfig;
pub use error::{ConfigError, GraphError, GraphResult};
pub use graph::{CellGraph, ChangeOrigin, Diagram};
pub use undo::UndoReactor;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the library version once at startup.
pub fn init() {
    log::info!("Trellis Core v{} initialized", VERSION);
}
