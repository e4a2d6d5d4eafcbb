//! # Update Tracker
//!
//! Transactional buffering and dispatch of change records. Every owner — an
//! entity for its scalar fields, a tracked list for its structure — carries
//! one tracker.
//!
//! ## Semantics
//!
//! - With no transaction open, a recorded change dispatches immediately to
//!   the listener as a batch of one.
//! - Inside a transaction, changes accumulate and dispatch as a single batch
//!   when the outermost transaction ends. Nested begin/end pairs coalesce
//!   into exactly one dispatch at the outermost boundary.
//! - A transaction opened with logging disabled drops its records entirely
//!   and dispatches nothing at close. Bulk load uses this to keep document
//!   population out of the undo record.
//!
//! Transactions nest strictly LIFO; the model is single-threaded and
//! single-writer throughout.

use std::fmt;
use std::mem;

/// Receives dispatched change batches. Batches are handed over by value:
/// removal records own the displaced elements, so whoever keeps history
/// takes ownership of them here.
pub type Listener<C> = Box<dyn FnMut(Vec<C>)>;

/// Per-owner transactional change buffer.
pub struct UpdateTracker<C> {
    listener: Option<Listener<C>>,
    pending: Vec<C>,
    depth: u32,
    log_changes: bool,
    dirty: bool,
}

impl<C> UpdateTracker<C> {
    pub fn new() -> Self {
        Self {
            listener: None,
            pending: Vec::new(),
            depth: 0,
            log_changes: true,
            dirty: false,
        }
    }

    /// Record one change. Dispatches immediately when no transaction is
    /// open; otherwise buffers (unless this transaction disabled logging)
    /// and marks the transaction dirty. Returns whether dispatch happened
    /// now.
    pub fn record(&mut self, change: C) -> bool {
        if self.depth == 0 {
            if let Some(listener) = self.listener.as_mut() {
                listener(vec![change]);
            }
            true
        } else {
            if self.log_changes {
                self.pending.push(change);
            }
            self.dirty = true;
            false
        }
    }

    /// Open a transaction. On the outermost open the buffer is reset and
    /// the logging flag latched; nested opens leave both untouched.
    pub fn begin_transaction(&mut self, log_changes: bool) {
        if self.depth == 0 {
            self.pending.clear();
            self.log_changes = log_changes;
            self.dirty = false;
        }
        self.depth += 1;
    }

    /// Close the innermost transaction. On the outermost close, a dirty
    /// transaction with buffered records dispatches them as one batch in
    /// record order; a logging-disabled transaction dispatches nothing.
    pub fn end_transaction(&mut self) {
        debug_assert!(
            self.depth > 0,
            "end_transaction without a matching begin_transaction"
        );
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return;
        }

        if self.dirty && !self.pending.is_empty() {
            let batch = mem::take(&mut self.pending);
            if let Some(listener) = self.listener.as_mut() {
                listener(batch);
            }
        }
        self.pending.clear();
        self.dirty = false;
        self.log_changes = true;
    }

    pub fn in_transaction(&self) -> bool {
        self.depth > 0
    }

    pub fn set_listener(&mut self, listener: impl FnMut(Vec<C>) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }
}

impl<C> Default for UpdateTracker<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for UpdateTracker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateTracker")
            .field("depth", &self.depth)
            .field("log_changes", &self.log_changes)
            .field("pending", &self.pending.len())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
