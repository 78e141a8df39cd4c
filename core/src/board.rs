//! A graph bundled with its undo engine.
//!
//! [`Board`] owns a [`CellGraph`] and an [`UndoReactor`] and feeds the one's
//! events to the other after every mutation, so callers never have to
//! remember to [`sync`](UndoReactor::sync). Arbitrary edits go through a
//! [`Recording`] view, which does the same for each mutation it forwards.

use serde_json::Value;

use crate::cell::{Attributes, Cell, CellKey};
use crate::config::UndoConfig;
use crate::error::{GraphError, GraphResult};
use crate::graph::{self, CellGraph, ChangeOrigin, Diagram, GraphEvent, LinkDirection};
use crate::undo::{self, UndoReactor};

/// An editable graph with history.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use trellis_core::board::Board;
/// use trellis_core::cell::Cell;
/// use trellis_core::graph::CellGraph;
///
/// let mut board = Board::new();
/// let node = board.add_cell(Cell::element("n1")).unwrap();
/// board.set(node, "label", json!("Start")).unwrap();
///
/// board.undo().unwrap();
/// assert!(board.graph().cell(node).unwrap().get("label").is_null());
/// board.redo().unwrap();
/// assert_eq!(board.graph().cell(node).unwrap().get("label"), &json!("Start"));
/// ```
#[derive(Debug)]
pub struct Board<G: CellGraph = Diagram> {
    graph: G,
    reactor: UndoReactor,
}

impl Board<Diagram> {
    pub fn new() -> Self {
        Self::with_graph(Diagram::new(), UndoConfig::default())
    }

    pub fn with_config(config: UndoConfig) -> Self {
        Self::with_graph(Diagram::new(), config)
    }
}

impl Default for Board<Diagram> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: CellGraph> Board<G> {
    /// Wraps an existing graph. Whatever it already contains is not part of
    /// the history; pending events are discarded.
    pub fn with_graph(mut graph: G, config: UndoConfig) -> Self {
        let pending = graph.drain_events().len();
        if pending > 0 {
            log::debug!("discarding {pending} event(s) recorded before the board existed");
        }
        Self {
            graph,
            reactor: UndoReactor::with_config(config),
        }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn reactor(&self) -> &UndoReactor {
        &self.reactor
    }

    pub fn into_graph(self) -> G {
        self.graph
    }

    /// Runs arbitrary mutations against the graph, recording each one as
    /// it happens.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Recording<'_, G>) -> R) -> R {
        let mut recording = Recording {
            graph: &mut self.graph,
            reactor: &mut self.reactor,
        };
        let result = f(&mut recording);
        recording.sync();
        result
    }

    pub fn key_of(&self, id: &str) -> Option<CellKey> {
        self.graph.key_of(id)
    }

    /// Resolves an identifier or reports it as unknown.
    pub fn require(&self, id: &str) -> GraphResult<CellKey> {
        self.graph
            .key_of(id)
            .ok_or_else(|| GraphError::UnknownId(id.to_owned()))
    }

    pub fn add_cell(&mut self, cell: Cell) -> GraphResult<CellKey> {
        self.edit(|graph| graph.add_cell(cell))
    }

    pub fn remove_cell(&mut self, key: CellKey) -> GraphResult {
        self.edit(|graph| graph.remove_cell(key))
    }

    /// Sets one attribute programmatically.
    pub fn set(&mut self, key: CellKey, name: &str, value: Value) -> GraphResult {
        self.edit(|g| g.set(key, graph::attributes(name, value), ChangeOrigin::Programmatic))
    }

    /// Sets one attribute as part of a user gesture.
    pub fn set_interactive(&mut self, key: CellKey, name: &str, value: Value) -> GraphResult {
        self.edit(|g| g.set(key, graph::attributes(name, value), ChangeOrigin::Interactive))
    }

    pub fn set_attributes(&mut self, key: CellKey, attributes: Attributes, origin: ChangeOrigin) -> GraphResult {
        self.edit(|graph| graph.set(key, attributes, origin))
    }

    pub fn embed(&mut self, parent: CellKey, child: CellKey) -> GraphResult {
        self.edit(|g| graph::embed(g, parent, child))
    }

    pub fn unembed(&mut self, parent: CellKey, child: CellKey) -> GraphResult {
        self.edit(|g| graph::unembed(g, parent, child))
    }

    /// Renames a cell and every reference to it; see [`undo::change_id`].
    pub fn change_id(&mut self, key: CellKey, new_id: &str) -> GraphResult<bool> {
        self.edit(|graph| undo::change_id(graph, key, new_id))
    }

    pub fn start(&mut self) {
        self.reactor.start();
    }

    pub fn stop(&mut self) -> bool {
        self.reactor.stop(&self.graph)
    }

    pub fn undo(&mut self) -> GraphResult<bool> {
        self.reactor.undo(&mut self.graph, true)
    }

    /// Undoes without making the step redoable.
    pub fn undo_without_redo(&mut self) -> GraphResult<bool> {
        self.reactor.undo(&mut self.graph, false)
    }

    pub fn redo(&mut self) -> GraphResult<bool> {
        self.reactor.redo(&mut self.graph)
    }

    pub fn abort(&mut self) -> GraphResult<bool> {
        self.reactor.abort(&mut self.graph)
    }

    /// Forgets all history. The graph itself is left as it is.
    pub fn clear(&mut self) {
        self.reactor.clear();
    }
}

/// A board's graph, borrowed for [`Board::edit`].
///
/// Every mutation is passed to the graph and then synced into the reactor
/// before the next one runs.
pub struct Recording<'a, G: CellGraph> {
    graph: &'a mut G,
    reactor: &'a mut UndoReactor,
}

impl<G: CellGraph> Recording<'_, G> {
    pub fn reactor(&self) -> &UndoReactor {
        self.reactor
    }

    fn sync(&mut self) {
        self.reactor.sync(&mut *self.graph);
    }
}

impl<G: CellGraph> CellGraph for Recording<'_, G> {
    fn cell(&self, key: CellKey) -> Option<&Cell> {
        self.graph.cell(key)
    }

    fn key_of(&self, id: &str) -> Option<CellKey> {
        self.graph.key_of(id)
    }

    fn keys(&self) -> Vec<CellKey> {
        self.graph.keys()
    }

    fn connected_links(&self, key: CellKey, direction: LinkDirection) -> Vec<CellKey> {
        self.graph.connected_links(key, direction)
    }

    fn embedded_cells(&self, key: CellKey) -> Vec<CellKey> {
        self.graph.embedded_cells(key)
    }

    fn add_cell(&mut self, cell: Cell) -> GraphResult<CellKey> {
        let result = self.graph.add_cell(cell);
        self.sync();
        result
    }

    fn remove_cell(&mut self, key: CellKey) -> GraphResult {
        let result = self.graph.remove_cell(key);
        self.sync();
        result
    }

    fn set(&mut self, key: CellKey, attributes: Attributes, origin: ChangeOrigin) -> GraphResult {
        let result = self.graph.set(key, attributes, origin);
        self.sync();
        result
    }

    fn notifications_enabled(&self) -> bool {
        self.graph.notifications_enabled()
    }

    fn set_notifications_enabled(&mut self, enabled: bool) {
        self.graph.set_notifications_enabled(enabled);
    }

    fn drain_events(&mut self) -> Vec<GraphEvent> {
        self.graph.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cell::{Endpoint, TARGET};

    #[test]
    fn edits_are_recorded() {
        let mut board = Board::new();
        let n1 = board.add_cell(Cell::element("n1")).unwrap();
        board.set(n1, "label", json!("a")).unwrap();
        assert_eq!(board.reactor().history_len(), 2);
    }

    #[test]
    fn gesture_is_one_step() {
        let mut board = Board::new();
        let n1 = board.add_cell(Cell::element("n1")).unwrap();
        board.start();
        for x in 1..=20 {
            board.set_interactive(n1, "position", json!({"x": x, "y": 0})).unwrap();
        }
        assert!(board.stop());
        assert_eq!(board.reactor().history_len(), 2);

        board.undo().unwrap();
        assert!(board.graph().cell(n1).unwrap().get("position").is_null());
    }

    #[test]
    fn embed_and_unembed_are_undoable() {
        let mut board = Board::new();
        let parent = board.add_cell(Cell::element("p")).unwrap();
        let child = board.add_cell(Cell::element("c")).unwrap();

        board.start();
        board.embed(parent, child).unwrap();
        board.stop();
        assert_eq!(board.graph().cell(child).unwrap().parent(), Some("p"));

        board.undo().unwrap();
        assert_eq!(board.graph().cell(child).unwrap().parent(), None);
        assert!(board.graph().cell(parent).unwrap().embeds().is_empty());
    }

    #[test]
    fn rename_is_undoable() {
        let mut board = Board::new();
        let a = board.add_cell(Cell::element("a")).unwrap();
        board.add_cell(Cell::element("b")).unwrap();
        let link = board
            .add_cell(Cell::link("l", Endpoint::cell("a"), Endpoint::cell("b")))
            .unwrap();

        assert!(board.change_id(a, "z").unwrap());
        assert_eq!(board.graph().cell(link).unwrap().source(), Some(Endpoint::cell("z")));

        board.undo().unwrap();
        assert_eq!(board.key_of("a"), Some(a));
        assert_eq!(board.key_of("z"), None);
        assert_eq!(board.graph().cell(link).unwrap().source(), Some(Endpoint::cell("a")));
    }

    #[test]
    fn drag_back_to_start_inside_edit_leaves_no_step() {
        let mut board = Board::new();
        let node = board.add_cell(Cell::element("n1")).unwrap();
        board.set(node, "position", json!(0)).unwrap();
        board.add_cell(Cell::element("separator")).unwrap();
        let before = board.reactor().history_len();

        board.edit(|g| {
            for position in [1, 2, 0] {
                let moved = graph::attributes("position", json!(position));
                g.set(node, moved, ChangeOrigin::Interactive).unwrap();
            }
        });

        assert_eq!(board.reactor().history_len(), before);
        board.undo().unwrap();
        assert_eq!(board.graph().cell(node).unwrap().get("position"), &json!(0));
        assert_eq!(board.key_of("separator"), None);
    }

    #[test]
    fn each_mutation_inside_edit_is_recorded_before_the_next() {
        let mut board = Board::new();
        let node = board.add_cell(Cell::element("n1")).unwrap();
        board.edit(|g| {
            g.set(node, graph::attributes("label", json!("a")), ChangeOrigin::Programmatic)
                .unwrap();
            assert_eq!(g.reactor().history_len(), 2);
            g.set(node, graph::attributes("label", json!("b")), ChangeOrigin::Programmatic)
                .unwrap();
        });
        assert_eq!(board.reactor().history_len(), 3);
    }

    #[test]
    fn drawing_inside_edit_keeps_outer_transaction_open() {
        let mut board = Board::new();
        board.add_cell(Cell::element("a")).unwrap();
        board.add_cell(Cell::element("b")).unwrap();

        board.start();
        board.edit(|g| {
            let link = g
                .add_cell(Cell::link("l", Endpoint::cell("a"), Endpoint::point(1.0, 1.0)))
                .unwrap();
            let bound = graph::attributes(TARGET, json!({"id": "b"}));
            g.set(link, bound, ChangeOrigin::Interactive).unwrap();
        });
        assert_eq!(board.reactor().depth(), 1);
        assert!(board.stop());

        board.undo().unwrap();
        assert_eq!(board.key_of("l"), None);
        assert_eq!(board.reactor().depth(), 0);
    }

    #[test]
    fn require_reports_unknown_ids() {
        let board = Board::new();
        assert_eq!(board.require("nope"), Err(GraphError::UnknownId("nope".into())));
    }

    #[test]
    fn wrapping_a_populated_graph_starts_with_empty_history() {
        let mut diagram = Diagram::new();
        diagram.add_cell(Cell::element("n1")).unwrap();
        let board = Board::with_graph(diagram, UndoConfig::default());
        assert!(!board.reactor().can_undo());
        assert_eq!(board.into_graph().len(), 1);
    }
}
