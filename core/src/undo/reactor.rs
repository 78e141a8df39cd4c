//! The change recorder and undo/redo executor.

use std::fmt;
use std::mem;

use serde_json::Value;

use super::compact::{add_to_history, optimize_history};
use super::entry::{self, Entry, Transaction};
use super::environment::{Environment, ReplayMode, TransactionStack};
use crate::cell::{Cell, CellKey, SOURCE, TARGET, bound_id};
use crate::config::UndoConfig;
use crate::error::GraphResult;
use crate::graph::{AttributeChange, CellGraph, ChangeOrigin, GraphEvent};

/// Records graph mutations as reversible steps and replays them.
///
/// The reactor is fed every [`GraphEvent`] of one graph, in order, through
/// [`observe`](Self::observe) (or [`sync`](Self::sync), which drains the
/// graph's buffer). Undo and redo mutate the graph themselves and record the
/// replay into the opposite stack, so they can be repeated indefinitely.
///
/// # Dangling links
///
/// Drawing a connection starts with a link whose end follows the pointer.
/// Outside replay, adding a dangling link or unbinding an endpoint of an
/// existing link opens a transaction implicitly. Binding the last free
/// endpoint closes it, and so does removing the link, which is how an
/// abandoned draw ends. The whole gesture, including any moves in between,
/// becomes a single undo step. Only a transaction opened this way is ever
/// closed this way; transactions the caller opened are left alone.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use trellis_core::cell::Cell;
/// use trellis_core::graph::{CellGraph, ChangeOrigin, Diagram, attributes};
/// use trellis_core::undo::UndoReactor;
///
/// let mut diagram = Diagram::new();
/// let mut reactor = UndoReactor::new();
///
/// let key = diagram.add_cell(Cell::element("n1")).unwrap();
/// reactor.sync(&mut diagram);
///
/// reactor.start();
/// diagram.set(key, attributes("position", json!(10)), ChangeOrigin::Interactive).unwrap();
/// reactor.sync(&mut diagram);
/// diagram.set(key, attributes("position", json!(20)), ChangeOrigin::Interactive).unwrap();
/// reactor.sync(&mut diagram);
/// assert!(reactor.stop(&diagram));
///
/// reactor.undo(&mut diagram, true).unwrap();
/// assert_eq!(diagram.cell(key).unwrap().get("position"), &serde_json::Value::Null);
/// ```
pub struct UndoReactor {
    stack: TransactionStack,
    mode: ReplayMode,
    config: UndoConfig,
    gestures: Vec<Gesture>,
}

/// A transaction opened on behalf of a link being drawn or re-attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Gesture {
    key: CellKey,
    /// Transaction depth right after it was opened.
    depth: usize,
}

impl UndoReactor {
    pub fn new() -> Self {
        Self::with_config(UndoConfig::default())
    }

    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            stack: TransactionStack::new(),
            mode: ReplayMode::Idle,
            config,
            gestures: Vec::new(),
        }
    }

    pub fn config(&self) -> &UndoConfig {
        &self.config
    }

    /// Records one mutation.
    ///
    /// Everything about the mutation itself is read from `event`, so events
    /// may be observed long after they happened. `graph` is only consulted
    /// when a transaction closes and its entries are compacted.
    pub fn observe<G: CellGraph + ?Sized>(&mut self, graph: &G, event: &GraphEvent) {
        let idle = !self.mode.is_replaying();
        match event {
            GraphEvent::Added { key, cell } => {
                if idle && cell.is_dangling() {
                    log::debug!("dangling link {key} added, opening transaction");
                    self.open_gesture(*key);
                }
                self.record(entry::record_add(*key), false, Some(cell));
            }
            GraphEvent::Removed { cell } => {
                self.record(entry::record_remove(cell.clone()), false, None);
                if let Some(key) = cell.key() {
                    if idle && self.is_open_gesture(key) {
                        log::debug!("link {key} removed while drawn, closing transaction");
                        self.close_gesture(graph);
                    }
                }
            }
            GraphEvent::Changed {
                key,
                changes,
                origin,
                cell,
            } => {
                let Some(entry) = entry::record_change(*key, changes) else {
                    return;
                };
                let gesture = idle && cell.is_link();
                if gesture && changes.iter().any(endpoint_unbound) && !self.is_open_gesture(*key) {
                    log::debug!("link {key} detached, opening transaction");
                    self.open_gesture(*key);
                }
                let mergeable =
                    idle && self.config.merge_interactive && *origin == ChangeOrigin::Interactive;
                self.record(entry, mergeable, Some(cell));
                if gesture
                    && changes.iter().any(endpoint_bound)
                    && !cell.is_dangling()
                    && self.is_open_gesture(*key)
                {
                    log::debug!("link {key} connected, closing transaction");
                    self.close_gesture(graph);
                }
            }
        }
    }

    /// Drains the graph's pending events and records them.
    ///
    /// Several events may be drained at once. Each is recorded against the
    /// state it carries, but a transaction closed along the way is compacted
    /// against the graph as it is now; syncing after every mutation keeps
    /// the two the same.
    pub fn sync<G: CellGraph + ?Sized>(&mut self, graph: &mut G) {
        for event in graph.drain_events() {
            self.observe(&*graph, &event);
        }
    }

    fn record(&mut self, entry: Entry, mergeable: bool, after: Option<&Cell>) {
        log::trace!("recording {entry:?} ({:?})", self.mode);
        let Some(stack) = self.stack.recording_stack(self.mode) else {
            return;
        };
        add_to_history(stack, entry, mergeable, after);
        self.stack.trim_root(self.config.max_history);
    }

    fn open_gesture(&mut self, key: CellKey) {
        self.start();
        self.gestures.push(Gesture {
            key,
            depth: self.stack.depth(),
        });
    }

    /// Whether the innermost open transaction was opened for `key`.
    fn is_open_gesture(&self, key: CellKey) -> bool {
        self.gestures.last()
            == Some(&Gesture {
                key,
                depth: self.stack.depth(),
            })
    }

    fn close_gesture<G: CellGraph + ?Sized>(&mut self, graph: &G) {
        self.gestures.pop();
        self.stop(graph);
    }

    /// Opens a nested transaction.
    pub fn start(&mut self) {
        self.stack.start();
        log::debug!("transaction opened (depth {})", self.stack.depth());
    }

    /// Closes the innermost transaction; see [`TransactionStack::stop`].
    pub fn stop<G: CellGraph + ?Sized>(&mut self, graph: &G) -> bool {
        if self.stack.depth() == 0 {
            return false;
        }
        let committed = self.stack.stop(graph);
        self.stack.trim_root(self.config.max_history);
        let depth = self.stack.depth();
        self.gestures.retain(|gesture| gesture.depth <= depth);
        log::debug!("transaction closed (depth {depth}, committed: {committed})");
        committed
    }

    /// Reverts the most recent history step.
    ///
    /// With `record_redo` the replay is recorded as one step on top of the
    /// future; without it the future is left exactly as it was. Returns
    /// `Ok(false)` when there is nothing to undo.
    pub fn undo<G: CellGraph + ?Sized>(&mut self, graph: &mut G, record_redo: bool) -> GraphResult<bool> {
        let Some(step) = self.stack.active_mut().history.pop() else {
            return Ok(false);
        };
        log::debug!("undo: replaying {} entries", step.len());
        let future = mem::take(&mut self.stack.active_mut().future);

        self.mode = ReplayMode::Undoing {
            record: record_redo,
        };
        self.stack.start();
        let replayed = self.replay(graph, step);
        let recorded = mem::take(&mut self.stack.active_mut().future);
        self.stack.stop(&*graph);
        self.mode = ReplayMode::Idle;

        let redo = Transaction::from_entries(optimize_history(&*graph, recorded));
        let active = self.stack.active_mut();
        active.future = future;
        active.future.extend(redo);

        replayed.map(|()| true)
    }

    /// Re-applies the most recently undone step. Returns `Ok(false)` when
    /// there is nothing to redo.
    pub fn redo<G: CellGraph + ?Sized>(&mut self, graph: &mut G) -> GraphResult<bool> {
        let Some(step) = self.stack.active_mut().future.pop() else {
            return Ok(false);
        };
        log::debug!("redo: replaying {} entries", step.len());
        let future = mem::take(&mut self.stack.active_mut().future);

        self.mode = ReplayMode::Redoing;
        self.stack.start();
        let replayed = self.replay(graph, step);
        self.stack.stop(&*graph);
        self.mode = ReplayMode::Idle;

        self.stack.active_mut().future = future;
        self.stack.trim_root(self.config.max_history);

        replayed.map(|()| true)
    }

    /// Closes the innermost transaction and reverts whatever it recorded,
    /// leaving no redo step behind. Returns whether anything was reverted.
    pub fn abort<G: CellGraph + ?Sized>(&mut self, graph: &mut G) -> GraphResult<bool> {
        if !self.stop(&*graph) {
            return Ok(false);
        }
        log::debug!("aborting transaction");
        self.undo(graph, false)
    }

    /// Forgets every step and every open transaction.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.gestures.clear();
        self.mode = ReplayMode::Idle;
    }

    fn replay<G: CellGraph + ?Sized>(&mut self, graph: &mut G, step: Transaction) -> GraphResult {
        let entries = step.flatten();
        for entry in entries.iter().rev() {
            let result = entry::invert_apply(graph, entry);
            self.sync(graph);
            if let Err(err) = result {
                log::warn!("replay stopped at {entry:?}: {err}");
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.stack.active().history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.stack.active().future.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.stack.active().history.len()
    }

    pub fn future_len(&self) -> usize {
        self.stack.active().future.len()
    }

    /// Undo steps of the active environment, oldest first.
    pub fn history(&self) -> &[Transaction] {
        &self.stack.active().history
    }

    /// Redo steps of the active environment; the next to redo is last.
    pub fn future(&self) -> &[Transaction] {
        &self.stack.active().future
    }

    pub fn active(&self) -> &Environment {
        self.stack.active()
    }

    /// Number of open transactions.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn mode(&self) -> ReplayMode {
        self.mode
    }
}

impl Default for UndoReactor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UndoReactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoReactor")
            .field("history", &self.history_len())
            .field("future", &self.future_len())
            .field("depth", &self.depth())
            .field("gestures", &self.gestures.len())
            .field("mode", &self.mode)
            .finish()
    }
}

fn is_endpoint(change: &AttributeChange) -> bool {
    change.name == SOURCE || change.name == TARGET
}

fn is_bound(value: &Value) -> bool {
    bound_id(value).is_some()
}

/// Bound -> free.
fn endpoint_unbound(change: &AttributeChange) -> bool {
    is_endpoint(change) && is_bound(&change.previous) && !is_bound(&change.current)
}

/// Free -> bound.
fn endpoint_bound(change: &AttributeChange) -> bool {
    is_endpoint(change) && !is_bound(&change.previous) && is_bound(&change.current)
}
