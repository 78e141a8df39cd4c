//! In-memory cell graph.

use std::collections::HashMap;
use std::fmt;

use super::{
    AttributeChange, CellGraph, ChangeOrigin, GraphEvent, LinkDirection, attributes, sort_cells,
};
use crate::cell::{Attributes, Cell, CellKey, EMBEDS, ID, SOURCE, TARGET, bound_id};
use crate::error::{GraphError, GraphResult};

/// An in-memory [`CellGraph`].
///
/// Cells are kept in insertion order; re-inserting a removed cell appends it
/// at the end, like any other insertion. Keys are allocated on first
/// insertion and kept forever after.
///
/// Removing a cell cascades: its embedded children (deep) and the links
/// attached to it are removed first, then it is detached from its parent's
/// `embeds`, then it is removed itself. Each step is reported separately so
/// that replaying the events backwards rebuilds the whole structure.
pub struct Diagram {
    cells: HashMap<CellKey, Cell>,
    order: Vec<CellKey>,
    ids: HashMap<String, CellKey>,
    next_key: u64,
    notify: bool,
    events: Vec<GraphEvent>,
}

impl Diagram {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
            order: Vec::new(),
            ids: HashMap::new(),
            next_key: 0,
            notify: true,
            events: Vec::new(),
        }
    }

    /// Cells in graph order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.order.iter().filter_map(|key| self.cells.get(key))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Replaces the whole content without notifications.
    ///
    /// Cells are inserted in [canonical order](sort_cells). Keys carried by
    /// the incoming cells are kept.
    pub fn reset_cells(&mut self, mut cells: Vec<Cell>) -> GraphResult {
        let restore = self.notify;
        self.notify = false;
        self.cells.clear();
        self.order.clear();
        self.ids.clear();
        sort_cells(&mut cells);
        let result = cells
            .into_iter()
            .try_for_each(|cell| self.add_cell(cell).map(|_| ()));
        self.notify = restore;
        result
    }

    fn emit(&mut self, event: GraphEvent) {
        if self.notify {
            self.events.push(event);
        }
    }

    fn allocate_key(&mut self) -> CellKey {
        let key = CellKey::from_raw(self.next_key);
        self.next_key += 1;
        key
    }

    fn links(&self) -> impl Iterator<Item = &Cell> {
        self.cells().filter(|cell| cell.is_link())
    }
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagram")
            .field("cells", &self.order.len())
            .field("notify", &self.notify)
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl CellGraph for Diagram {
    fn cell(&self, key: CellKey) -> Option<&Cell> {
        self.cells.get(&key)
    }

    fn key_of(&self, id: &str) -> Option<CellKey> {
        self.ids.get(id).copied()
    }

    fn keys(&self) -> Vec<CellKey> {
        self.order.clone()
    }

    fn connected_links(&self, key: CellKey, direction: LinkDirection) -> Vec<CellKey> {
        let Some(cell) = self.cells.get(&key) else {
            return Vec::new();
        };
        let id = cell.id();
        let end = match direction {
            LinkDirection::Inbound => TARGET,
            LinkDirection::Outbound => SOURCE,
        };
        self.links()
            .filter(|link| bound_id(link.get(end)) == Some(id))
            .filter_map(Cell::key)
            .collect()
    }

    fn embedded_cells(&self, key: CellKey) -> Vec<CellKey> {
        self.cells
            .get(&key)
            .map(|cell| {
                cell.embeds()
                    .into_iter()
                    .filter_map(|id| self.key_of(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn add_cell(&mut self, mut cell: Cell) -> GraphResult<CellKey> {
        let id = cell.id().to_owned();
        if id.is_empty() {
            return Err(GraphError::MissingId);
        }
        if self.ids.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        let key = match cell.key() {
            Some(key) if self.cells.contains_key(&key) => return Err(GraphError::KeyInUse(key)),
            Some(key) => {
                self.next_key = self.next_key.max(key.raw() + 1);
                key
            }
            None => self.allocate_key(),
        };

        cell.assign_key(key);
        let snapshot = self.notify.then(|| cell.clone());
        self.cells.insert(key, cell);
        self.order.push(key);
        self.ids.insert(id, key);
        if let Some(cell) = snapshot {
            self.emit(GraphEvent::Added { key, cell });
        }
        Ok(key)
    }

    fn remove_cell(&mut self, key: CellKey) -> GraphResult {
        let cell = self.cells.get(&key).ok_or(GraphError::UnknownCell(key))?;
        let parent = cell.parent().and_then(|id| self.key_of(id));

        for child in self.embedded_cells(key) {
            if self.cells.contains_key(&child) {
                self.remove_cell(child)?;
            }
        }
        let mut links = self.connected_links(key, LinkDirection::Inbound);
        links.extend(self.connected_links(key, LinkDirection::Outbound));
        for link in links {
            if self.cells.contains_key(&link) {
                self.remove_cell(link)?;
            }
        }

        if let Some(parent) = parent {
            let id = self.cells.get(&key).map(|cell| cell.id().to_owned());
            let embeds: Option<Vec<String>> = self.cells.get(&parent).map(|parent| {
                parent
                    .embeds()
                    .into_iter()
                    .filter(|embedded| Some(*embedded) != id.as_deref())
                    .map(str::to_owned)
                    .collect()
            });
            if let Some(embeds) = embeds {
                self.set(parent, attributes(EMBEDS, embeds.into()), ChangeOrigin::Programmatic)?;
            }
        }

        let cell = self.cells.remove(&key).ok_or(GraphError::UnknownCell(key))?;
        self.order.retain(|k| *k != key);
        self.ids.remove(cell.id());
        self.emit(GraphEvent::Removed { cell });
        Ok(())
    }

    fn set(&mut self, key: CellKey, attributes: Attributes, origin: ChangeOrigin) -> GraphResult {
        if !self.cells.contains_key(&key) {
            return Err(GraphError::UnknownCell(key));
        }

        // Validate the identifier up front so a rejected rename leaves the
        // cell untouched.
        if let Some(value) = attributes.get(ID) {
            let id = value
                .as_str()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| GraphError::InvalidId(value.to_string()))?;
            if self.ids.get(id).is_some_and(|owner| *owner != key) {
                return Err(GraphError::DuplicateId(id.to_owned()));
            }
        }

        let Some(cell) = self.cells.get_mut(&key) else {
            return Err(GraphError::UnknownCell(key));
        };
        let mut changes = Vec::new();
        for (name, value) in attributes {
            if cell.get(&name) == &value {
                continue;
            }
            let previous = cell.set(name.clone(), value.clone());
            if name == ID {
                if let Some(old) = previous.as_str() {
                    self.ids.remove(old);
                }
                if let Some(new) = value.as_str() {
                    self.ids.insert(new.to_owned(), key);
                }
            }
            changes.push(AttributeChange {
                name,
                previous,
                current: value,
            });
        }

        if !changes.is_empty() && self.notify {
            let cell = cell.clone();
            self.emit(GraphEvent::Changed {
                key,
                changes,
                origin,
                cell,
            });
        }
        Ok(())
    }

    fn notifications_enabled(&self) -> bool {
        self.notify
    }

    fn set_notifications_enabled(&mut self, enabled: bool) {
        self.notify = enabled;
    }

    fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }
}
