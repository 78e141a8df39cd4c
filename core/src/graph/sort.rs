use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::cell::Cell;

/// Sorts cells into canonical insertion order.
///
/// Elements come before links. Elements are ordered by nesting depth (roots
/// first); two elements at the same depth are ordered by their first
/// diverging ancestors, which are either roots (compared by identifier) or
/// siblings (compared by position in the parent's `embeds`). Links are
/// ordered by identifier.
///
/// Parents are only looked up among the given cells; a cell whose parent is
/// missing from the slice is treated as a root.
pub fn sort_cells(cells: &mut [Cell]) {
    let keys: HashMap<String, SortKey> = {
        let lookup: HashMap<&str, &Cell> = cells.iter().map(|cell| (cell.id(), cell)).collect();
        cells
            .iter()
            .map(|cell| (cell.id().to_owned(), SortKey::of(cell, &lookup)))
            .collect()
    };
    cells.sort_by(|a, b| match (keys.get(a.id()), keys.get(b.id())) {
        (Some(a), Some(b)) => a.cmp(b),
        _ => a.id().cmp(b.id()),
    });
}

#[derive(Debug, PartialEq, Eq)]
struct SortKey {
    is_link: bool,
    depth: usize,
    /// (sibling index, identifier) for each ancestor from the root down,
    /// ending with the cell itself. Roots use index 0.
    path: Vec<(usize, String)>,
}

impl SortKey {
    fn of(cell: &Cell, lookup: &HashMap<&str, &Cell>) -> Self {
        if cell.is_link() {
            return Self {
                is_link: true,
                depth: 0,
                path: vec![(0, cell.id().to_owned())],
            };
        }

        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut current = cell;
        loop {
            if !visited.insert(current.id()) {
                break;
            }
            match current.parent().and_then(|id| lookup.get(id).copied()) {
                Some(parent) => {
                    let index = parent
                        .embeds()
                        .iter()
                        .position(|id| *id == current.id())
                        .unwrap_or(usize::MAX);
                    path.push((index, current.id().to_owned()));
                    current = parent;
                }
                None => {
                    path.push((0, current.id().to_owned()));
                    break;
                }
            }
        }
        path.reverse();

        Self {
            is_link: false,
            depth: path.len(),
            path,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.is_link
            .cmp(&other.is_link)
            .then(self.depth.cmp(&other.depth))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
