//! Nested transaction scopes.
//!
//! Every [`start`](TransactionStack::start) suspends the active
//! [`Environment`] and installs a fresh one; the matching
//! [`stop`](TransactionStack::stop) compacts what the inner environment
//! recorded and folds it into the resumed one as a single step. The root
//! environment is never popped.

use std::mem;

use super::compact::optimize_history;
use super::entry::Transaction;
use crate::graph::CellGraph;

/// A history/future pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    /// Undo steps, most recent last.
    pub history: Vec<Transaction>,
    /// Redo steps, next to redo last.
    pub future: Vec<Transaction>,
}

impl Environment {
    pub fn is_empty(&self) -> bool {
        self.history.is_empty() && self.future.is_empty()
    }
}

/// What the engine is doing while mutations are being observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    /// Ordinary editing: recordings go to history and truncate the future.
    #[default]
    Idle,
    /// Replaying an undo step: recordings go to the future, or nowhere when
    /// `record` is off.
    Undoing { record: bool },
    /// Replaying a redo step: recordings go to history.
    Redoing,
}

impl ReplayMode {
    pub fn is_replaying(self) -> bool {
        self != Self::Idle
    }
}

/// The stack of open environments.
#[derive(Debug, Default)]
pub struct TransactionStack {
    active: Environment,
    suspended: Vec<Environment>,
}

impl TransactionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The environment currently receiving recordings.
    pub fn active(&self) -> &Environment {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut Environment {
        &mut self.active
    }

    /// Number of open transactions; `0` means the root is active.
    pub fn depth(&self) -> usize {
        self.suspended.len()
    }

    /// Opens a nested transaction.
    pub fn start(&mut self) {
        self.active.future.clear();
        let outer = mem::take(&mut self.active);
        self.suspended.push(outer);
    }

    /// Closes the innermost transaction.
    ///
    /// Returns `true` if it recorded something with an observable effect,
    /// which is then pushed onto the resumed environment's history. An
    /// unmatched stop does nothing and returns `false`.
    pub fn stop<G: CellGraph + ?Sized>(&mut self, graph: &G) -> bool {
        let Some(outer) = self.suspended.pop() else {
            return false;
        };
        let finished = mem::replace(&mut self.active, outer);
        match Transaction::from_entries(optimize_history(graph, finished.history)) {
            Some(step) => {
                self.active.history.push(step);
                true
            }
            None => false,
        }
    }

    /// Drops every environment and resets the root to empty.
    pub fn clear(&mut self) {
        self.suspended.clear();
        self.active = Environment::default();
    }

    /// The stack new recordings go to in the given mode.
    ///
    /// Ordinary recordings truncate the future. `None` means the recording
    /// is discarded.
    pub fn recording_stack(&mut self, mode: ReplayMode) -> Option<&mut Vec<Transaction>> {
        match mode {
            ReplayMode::Idle => {
                self.active.future.clear();
                Some(&mut self.active.history)
            }
            ReplayMode::Undoing { record: true } => Some(&mut self.active.future),
            ReplayMode::Undoing { record: false } => None,
            ReplayMode::Redoing => Some(&mut self.active.history),
        }
    }

    /// Drops the oldest root history steps beyond `max` (`0` = unbounded).
    /// Nested environments are left alone.
    pub fn trim_root(&mut self, max: usize) {
        if max == 0 || !self.suspended.is_empty() {
            return;
        }
        let history = &mut self.active.history;
        if history.len() > max {
            let excess = history.len() - max;
            history.drain(..excess);
            log::debug!("dropped {excess} oldest undo step(s)");
        }
    }
}
