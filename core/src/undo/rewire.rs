//! Renaming a cell together with every reference to it.

use serde_json::Value;

use crate::cell::{Cell, CellKey, EMBEDS, ID, PARENT, SOURCE, TARGET};
use crate::error::{GraphError, GraphResult};
use crate::graph::{CellGraph, ChangeOrigin, LinkDirection, Silenced, attributes};

/// Renames the cell at `key` to `new_id`.
///
/// Children get their `parent` repointed, the parent's `embeds` has the old
/// identifier replaced in place, and links whose source or target is bound
/// to the cell are rebound. Those rewrites happen with notifications
/// suppressed; the rename itself is then applied as one ordinary change, so
/// observers only ever see a consistent graph and a single event carrying
/// the old identifier.
///
/// Returns `Ok(false)` without touching anything when `new_id` already
/// belongs to another cell. Renaming to the current identifier succeeds
/// trivially.
pub fn change_id<G: CellGraph + ?Sized>(graph: &mut G, key: CellKey, new_id: &str) -> GraphResult<bool> {
    let cell = graph.cell(key).ok_or(GraphError::UnknownCell(key))?;
    let old_id = cell.id().to_owned();
    if old_id == new_id {
        return Ok(true);
    }
    if new_id.is_empty() {
        return Err(GraphError::InvalidId(Value::from(new_id).to_string()));
    }
    if graph.key_of(new_id).is_some() {
        log::warn!("cannot rename \"{old_id}\": identifier \"{new_id}\" is taken");
        return Ok(false);
    }

    let parent = cell.parent().and_then(|id| graph.key_of(id));
    let children = graph.embedded_cells(key);
    let inbound = graph.connected_links(key, LinkDirection::Inbound);
    let outbound = graph.connected_links(key, LinkDirection::Outbound);

    {
        let mut silent = Silenced::new(graph);
        for child in children {
            silent.set(child, attributes(PARENT, new_id.into()), ChangeOrigin::Programmatic)?;
        }
        if let Some(parent) = parent {
            let embeds = silent
                .cell(parent)
                .map(|parent| replace_embedded(parent, &old_id, new_id));
            if let Some(embeds) = embeds {
                silent.set(parent, attributes(EMBEDS, embeds), ChangeOrigin::Programmatic)?;
            }
        }
        for (links, end) in [(inbound, TARGET), (outbound, SOURCE)] {
            for link in links {
                let endpoint = silent.cell(link).map(|link| rebind(link.get(end), new_id));
                if let Some(endpoint) = endpoint {
                    silent.set(link, attributes(end, endpoint), ChangeOrigin::Programmatic)?;
                }
            }
        }
    }

    log::debug!("renaming \"{old_id}\" to \"{new_id}\"");
    graph.set(key, attributes(ID, new_id.into()), ChangeOrigin::Programmatic)?;
    Ok(true)
}

/// Renames a cell that is not part of any graph. There is nothing to
/// repoint, so this is a plain attribute assignment and always succeeds.
pub fn change_detached_id(cell: &mut Cell, new_id: &str) -> bool {
    cell.set(ID, new_id.into());
    true
}

fn replace_embedded(parent: &Cell, old_id: &str, new_id: &str) -> Value {
    parent
        .embeds()
        .into_iter()
        .map(|id| if id == old_id { new_id } else { id })
        .map(|id| Value::String(id.to_owned()))
        .collect::<Vec<_>>()
        .into()
}

/// Copies an endpoint with its `id` replaced; other fields (ports, anchors)
/// are kept.
fn rebind(endpoint: &Value, new_id: &str) -> Value {
    let mut endpoint = endpoint.clone();
    if let Some(fields) = endpoint.as_object_mut() {
        fields.insert(ID.into(), new_id.into());
    }
    endpoint
}
