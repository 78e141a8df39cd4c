//! Transactional undo/redo for a [`CellGraph`](crate::graph::CellGraph).
//!
//! The engine watches a graph's [`GraphEvent`](crate::graph::GraphEvent)s and
//! records, for each, the entry that would reverse it. Entries recorded inside
//! a transaction are compacted when the transaction stops and become a
//! single undo step.
//!
//! - [`Entry`] / [`Transaction`]: reversible deltas and their grouping
//! - [`has_effect`]: whether an entry would still change anything
//! - [`add_to_history`] / [`optimize_history`]: streaming and batch compaction
//! - [`TransactionStack`] / [`Environment`]: nested history/future scopes
//! - [`UndoReactor`]: the recorder and undo/redo executor
//! - [`change_id`]: identifier changes that keep references intact
//!
//! # Replay
//!
//! Undo and redo run with a [`ReplayMode`] set, which routes the mutations
//! they cause: undoing records into the future (so the step can be redone),
//! redoing records back into history. Replay inside its own nested
//! transaction means a multi-entry step is always recorded as one step in
//! the opposite stack.

mod compact;
mod effect;
mod entry;
mod environment;
mod reactor;
mod rewire;

pub use compact::{add_to_history, optimize_history};
pub use effect::{has_effect, has_effect_on};
pub use entry::{
    Entry, Transaction, invert_apply, invert_apply_all, record_add, record_change, record_remove,
};
pub use environment::{Environment, ReplayMode, TransactionStack};
pub use reactor::UndoReactor;
pub use rewire::{change_detached_id, change_id};
