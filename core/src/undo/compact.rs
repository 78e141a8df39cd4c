//! History compaction.
//!
//! Interactive editing produces a change per pointer move. Two passes keep
//! the undo history down to one step per meaningful action:
//!
//! - [`add_to_history`] merges an incoming change into the previous entry as
//!   it is recorded (streaming, bounded memory during long gestures);
//! - [`optimize_history`] runs once over everything a transaction recorded
//!   when it stops.
//!
//! Both merge with the same rule: the merged entry keeps the **earliest**
//! previous value of every attribute, so it reverts to the state before the
//! whole run rather than to an intermediate one.

use super::effect::{has_effect, has_effect_on};
use super::entry::{Entry, Transaction};
use crate::cell::Cell;
use crate::graph::CellGraph;

/// Two change entries on the same cell.
fn same_change_target(earlier: &Entry, later: &Entry) -> bool {
    matches!(
        (earlier, later),
        (Entry::Change { key: a, .. }, Entry::Change { key: b, .. }) if a == b
    )
}

/// Folds `later` into `earlier`. Attributes already captured by `earlier`
/// keep their values; the rest are taken from `later`. The earliest rename
/// source wins for the same reason.
fn absorb(earlier: &mut Entry, later: Entry) {
    if let (
        Entry::Change {
            delta,
            renamed_from,
            ..
        },
        Entry::Change {
            delta: later_delta,
            renamed_from: later_renamed,
            ..
        },
    ) = (earlier, later)
    {
        for (name, previous) in later_delta {
            delta.entry(name).or_insert(previous);
        }
        if renamed_from.is_none() {
            *renamed_from = later_renamed;
        }
    }
}

/// Appends `entry` to `stack`, merging it into the last step when allowed.
///
/// Merging happens only when `mergeable` is set, the last step is a bare
/// entry (never a group), and both are changes on the same cell. A merge
/// that nets out to nothing removes the step altogether; that is judged
/// against `after`, the target cell's state right after the mutation being
/// recorded, so it does not matter how far the graph has moved on since.
pub fn add_to_history(
    stack: &mut Vec<Transaction>,
    entry: Entry,
    mergeable: bool,
    after: Option<&Cell>,
) {
    if mergeable {
        if let Some(Transaction::Entry(last)) = stack.last_mut() {
            if same_change_target(last, &entry) {
                absorb(last, entry);
                let effective = has_effect_on(after, last);
                if !effective {
                    stack.pop();
                }
                return;
            }
        }
    }
    stack.push(Transaction::Entry(entry));
}

/// Compacts everything a transaction recorded into a minimal entry list.
///
/// 1. Flatten nested groups.
/// 2. Walking backwards, merge each run of adjacent changes on the same cell
///    into one entry. Insertions and removals end a run.
/// 3. Drop trailing plain changes that no longer have an effect. Renames,
///    insertions and removals stop the pruning.
pub fn optimize_history<G: CellGraph + ?Sized>(graph: &G, history: Vec<Transaction>) -> Vec<Entry> {
    let entries: Vec<Entry> = history.into_iter().flat_map(Transaction::flatten).collect();

    let mut compressed: Vec<Entry> = Vec::with_capacity(entries.len());
    for current in entries.into_iter().rev() {
        let merge = compressed
            .last()
            .is_some_and(|later| same_change_target(&current, later));
        if merge {
            if let Some(slot) = compressed.last_mut() {
                let later = std::mem::replace(slot, current);
                absorb(slot, later);
                continue;
            }
        }
        compressed.push(current);
    }
    compressed.reverse();

    while compressed.last().is_some_and(|entry| {
        matches!(entry, Entry::Change { renamed_from: None, .. }) && !has_effect(graph, entry)
    }) {
        compressed.pop();
    }
    compressed
}
