use super::entry::Entry;
use crate::cell::Cell;
use crate::graph::CellGraph;

/// Whether replaying `entry` would still change anything.
///
/// Renames always count. A change entry counts when at least one stored
/// previous value differs from the cell's current value; one whose values
/// all match is a round trip that merging cancelled out. Insertions and
/// removals always count, as does a change on a cell that is no longer in
/// the graph.
pub fn has_effect<G: CellGraph + ?Sized>(graph: &G, entry: &Entry) -> bool {
    match entry {
        Entry::Change { key, .. } => has_effect_on(graph.cell(*key), entry),
        Entry::Add { .. } | Entry::Remove { .. } => true,
    }
}

/// [`has_effect`] judged against a given state of the target cell instead
/// of the graph's present one. `None` means the cell does not exist.
pub fn has_effect_on(cell: Option<&Cell>, entry: &Entry) -> bool {
    match entry {
        Entry::Change {
            delta,
            renamed_from,
            ..
        } => {
            if renamed_from.is_some() {
                return true;
            }
            let Some(cell) = cell else {
                return true;
            };
            delta.iter().any(|(name, previous)| cell.get(name) != previous)
        }
        Entry::Add { .. } | Entry::Remove { .. } => true,
    }
}
