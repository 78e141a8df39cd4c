//! Reversible entries and the transactions that group them.
//!
//! An [`Entry`] stores just enough to return the graph to the state before
//! one observed mutation: the removed cell's final snapshot, the key of an
//! inserted cell, or the *previous* values of changed attributes. It never
//! stores the new values; those are whatever the graph holds when the entry
//! is replayed.

use serde_json::Value;

use super::rewire;
use crate::cell::{ATTRS, Attributes, Cell, CellKey, ID};
use crate::error::{GraphError, GraphResult};
use crate::graph::{AttributeChange, CellGraph, ChangeOrigin};

/// One reversible delta.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A cell was inserted; undone by removing it.
    Add { key: CellKey },
    /// A cell was removed; undone by inserting the snapshot again.
    Remove { cell: Cell },
    /// Attributes changed. `delta` maps attribute names to their previous
    /// values; an identifier change is kept apart in `renamed_from` because
    /// undoing it needs [`rewire::change_id`] rather than a plain set.
    Change {
        key: CellKey,
        delta: Attributes,
        renamed_from: Option<String>,
    },
}

impl Entry {
    /// The cell this entry targets.
    pub fn key(&self) -> Option<CellKey> {
        match self {
            Self::Add { key } | Self::Change { key, .. } => Some(*key),
            Self::Remove { cell } => cell.key(),
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Self::Change { .. })
    }
}

/// A history or future step: one entry or an ordered group of steps.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    Entry(Entry),
    Group(Vec<Transaction>),
}

impl Transaction {
    /// Wraps compacted entries: `None` for nothing, a bare entry for one, a
    /// group otherwise.
    pub fn from_entries(mut entries: Vec<Entry>) -> Option<Self> {
        match entries.len() {
            0 => None,
            1 => entries.pop().map(Self::Entry),
            _ => Some(Self::Group(entries.into_iter().map(Self::Entry).collect())),
        }
    }

    /// All entries in recording order.
    pub fn flatten(self) -> Vec<Entry> {
        let mut entries = Vec::new();
        self.flatten_into(&mut entries);
        entries
    }

    fn flatten_into(self, out: &mut Vec<Entry>) {
        match self {
            Self::Entry(entry) => out.push(entry),
            Self::Group(steps) => {
                for step in steps {
                    step.flatten_into(out);
                }
            }
        }
    }

    /// Borrowing traversal in recording order.
    pub fn entries(&self) -> Vec<&Entry> {
        match self {
            Self::Entry(entry) => vec![entry],
            Self::Group(steps) => steps.iter().flat_map(Transaction::entries).collect(),
        }
    }

    /// Number of entries, counting through nested groups.
    pub fn len(&self) -> usize {
        match self {
            Self::Entry(_) => 1,
            Self::Group(steps) => steps.iter().map(Transaction::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Entry> for Transaction {
    fn from(entry: Entry) -> Self {
        Self::Entry(entry)
    }
}

pub fn record_add(key: CellKey) -> Entry {
    Entry::Add { key }
}

pub fn record_remove(cell: Cell) -> Entry {
    Entry::Remove { cell }
}

/// Builds a change entry from observed attribute transitions.
///
/// The rendering-only [`ATTRS`] attribute is ignored. Returns `None` when
/// nothing recordable is left.
pub fn record_change(key: CellKey, changes: &[AttributeChange]) -> Option<Entry> {
    let mut delta = Attributes::new();
    let mut renamed_from = None;
    for change in changes {
        match change.name.as_str() {
            ATTRS => {}
            ID => {
                if let Value::String(previous) = &change.previous {
                    renamed_from = Some(previous.clone());
                }
            }
            name => {
                delta.insert(name.to_owned(), change.previous.clone());
            }
        }
    }

    if delta.is_empty() && renamed_from.is_none() {
        return None;
    }
    Some(Entry::Change {
        key,
        delta,
        renamed_from,
    })
}

/// Returns the graph to the state before `entry` was recorded.
///
/// A rename is undone first, then the attribute delta.
pub fn invert_apply<G: CellGraph + ?Sized>(graph: &mut G, entry: &Entry) -> GraphResult {
    match entry {
        Entry::Change {
            key,
            delta,
            renamed_from,
        } => {
            if let Some(previous_id) = renamed_from {
                if !rewire::change_id(graph, *key, previous_id)? {
                    return Err(GraphError::DuplicateId(previous_id.clone()));
                }
            }
            if !delta.is_empty() {
                graph.set(*key, delta.clone(), ChangeOrigin::Programmatic)?;
            }
            Ok(())
        }
        Entry::Add { key } => {
            if graph.cell(*key).is_none() {
                log::debug!("cell {key} already gone, nothing to remove");
                return Ok(());
            }
            graph.remove_cell(*key)
        }
        Entry::Remove { cell } => graph.add_cell(cell.clone()).map(|_| ()),
    }
}

/// Inverts a sequence of entries, last recorded first.
pub fn invert_apply_all<G: CellGraph + ?Sized>(graph: &mut G, entries: &[Entry]) -> GraphResult {
    entries
        .iter()
        .rev()
        .try_for_each(|entry| invert_apply(graph, entry))
}
