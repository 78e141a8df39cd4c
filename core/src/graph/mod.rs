//! Observation and mutation interface of a cell graph.
//!
//! The undo engine never touches a concrete graph type. It depends only on
//! [`CellGraph`]: lookups by key and identifier, the structural queries needed
//! to rename a cell, three mutations, and a buffer of [`GraphEvent`]s that
//! reports every observable change in call order.
//!
//! - [`CellGraph`]: the capability interface
//! - [`GraphEvent`] / [`AttributeChange`]: change notifications
//! - [`ChangeOrigin`]: interactive gesture vs programmatic mutation
//! - [`Silenced`]: scoped notification suppression
//! - [`Diagram`]: in-memory reference implementation
//! - [`sort_cells`]: canonical ordering for bulk insertion
//!
//! # Notifications
//!
//! While notifications are enabled, every mutation appends events to an
//! internal buffer which the owner drains with [`CellGraph::drain_events`].
//! Mutations made while notifications are disabled produce no events at all,
//! which is how multi-step rewrites avoid exposing intermediate states.

mod diagram;
mod silence;
mod sort;

use serde_json::Value;

use crate::cell::{Attributes, Cell, CellKey, EMBEDS, PARENT};
use crate::error::{GraphError, GraphResult};

pub use diagram::Diagram;
pub use silence::Silenced;
pub use sort::sort_cells;

/// Where a mutation came from.
///
/// Only interactive changes are candidates for streaming merge: a drag emits
/// one change per pointer move and those collapse into a single undo step.
/// Which call sites count as interactive is the caller's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeOrigin {
    /// Continuous pointer-driven input (drag, resize, rotate).
    Interactive,
    /// Everything else: scripted edits, bulk operations, replay.
    #[default]
    Programmatic,
}

/// One attribute transition carried by [`GraphEvent::Changed`].
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub name: String,
    pub previous: Value,
    pub current: Value,
}

/// A change notification.
///
/// Every event carries the cell as it was right after the mutation, so a
/// consumer that drains several events at once still sees each one in its
/// own state rather than in whatever state the graph has reached since.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A cell was inserted and is now reachable by `key`.
    Added { key: CellKey, cell: Cell },
    /// A cell was removed; `cell` is its final state.
    Removed { cell: Cell },
    /// Attributes of a cell changed; `cell` is its state afterwards.
    Changed {
        key: CellKey,
        changes: Vec<AttributeChange>,
        origin: ChangeOrigin,
        cell: Cell,
    },
}

/// Direction for [`CellGraph::connected_links`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// Links whose target is bound to the cell.
    Inbound,
    /// Links whose source is bound to the cell.
    Outbound,
}

/// The capability interface the undo engine depends on.
pub trait CellGraph {
    /// Looks up a cell by key.
    fn cell(&self, key: CellKey) -> Option<&Cell>;

    /// Resolves an identifier to a key.
    fn key_of(&self, id: &str) -> Option<CellKey>;

    /// Looks up a cell by identifier.
    fn cell_by_id(&self, id: &str) -> Option<&Cell> {
        self.key_of(id).and_then(|key| self.cell(key))
    }

    /// Keys of every cell, in graph order.
    fn keys(&self) -> Vec<CellKey>;

    /// Links attached to `key` in the given direction.
    fn connected_links(&self, key: CellKey, direction: LinkDirection) -> Vec<CellKey>;

    /// Direct children of `key`, in sibling order.
    fn embedded_cells(&self, key: CellKey) -> Vec<CellKey>;

    /// Inserts a cell, keeping its key if it already has one.
    fn add_cell(&mut self, cell: Cell) -> GraphResult<CellKey>;

    /// Removes a cell.
    fn remove_cell(&mut self, key: CellKey) -> GraphResult;

    /// Assigns attributes. Only attributes whose value actually changes are
    /// reported.
    fn set(&mut self, key: CellKey, attributes: Attributes, origin: ChangeOrigin) -> GraphResult;

    fn notifications_enabled(&self) -> bool;

    fn set_notifications_enabled(&mut self, enabled: bool);

    /// Takes every buffered event, oldest first.
    fn drain_events(&mut self) -> Vec<GraphEvent>;
}

/// Builds a one-attribute map.
pub fn attributes(name: &str, value: Value) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(name.to_owned(), value);
    attributes
}

/// Nests `child` inside `parent`, appending it to the parent's `embeds`.
pub fn embed<G: CellGraph + ?Sized>(graph: &mut G, parent: CellKey, child: CellKey) -> GraphResult {
    let parent_cell = graph.cell(parent).ok_or(GraphError::UnknownCell(parent))?;
    let parent_id = parent_cell.id().to_owned();
    let mut embeds: Vec<String> = parent_cell.embeds().into_iter().map(str::to_owned).collect();
    let child_id = graph
        .cell(child)
        .ok_or(GraphError::UnknownCell(child))?
        .id()
        .to_owned();

    if !embeds.contains(&child_id) {
        embeds.push(child_id);
        graph.set(parent, attributes(EMBEDS, embeds.into()), ChangeOrigin::Programmatic)?;
    }
    graph.set(child, attributes(PARENT, parent_id.into()), ChangeOrigin::Programmatic)
}

/// Reverses [`embed`].
pub fn unembed<G: CellGraph + ?Sized>(graph: &mut G, parent: CellKey, child: CellKey) -> GraphResult {
    let parent_cell = graph.cell(parent).ok_or(GraphError::UnknownCell(parent))?;
    let child_id = graph
        .cell(child)
        .ok_or(GraphError::UnknownCell(child))?
        .id()
        .to_owned();
    let embeds: Vec<String> = parent_cell
        .embeds()
        .into_iter()
        .filter(|id| *id != child_id)
        .map(str::to_owned)
        .collect();

    graph.set(parent, attributes(EMBEDS, embeds.into()), ChangeOrigin::Programmatic)?;
    graph.set(child, attributes(PARENT, Value::Null), ChangeOrigin::Programmatic)
}
