//! Solver Worklist
//!
//! Pending-evaluation queue ordered to approximate topological order:
//! extraction always returns the pending statement with the smallest order
//! number, so producers tend to be evaluated before their consumers.
//! Insertion is idempotent; a statement already pending is not queued
//! twice.

use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::features::fixpoint::domain::StmtId;

/// Priority worklist keyed on order number
#[derive(Debug, Default)]
pub struct Worklist {
    heap: BinaryHeap<Reverse<(u32, StmtId)>>,
    pending: FxHashSet<StmtId>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a statement keyed by `order`. Returns false if it was
    /// already pending (no duplicate evaluation is queued).
    pub fn insert(&mut self, stmt: StmtId, order: u32) -> bool {
        if !self.pending.insert(stmt) {
            return false;
        }
        self.heap.push(Reverse((order, stmt)));
        true
    }

    /// Take the pending statement with the smallest order number
    pub fn take(&mut self) -> Option<StmtId> {
        while let Some(Reverse((_, stmt))) = self.heap.pop() {
            // heap entries whose statement is no longer pending are stale;
            // skip them
            if self.pending.remove(&stmt) {
                return Some(stmt);
            }
        }
        None
    }

    #[inline]
    pub fn contains(&self, stmt: StmtId) -> bool {
        self.pending.contains(&stmt)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every pending statement, clearing the worklist.
    /// Used for the reorder cycle: drain, renumber, re-insert.
    pub fn drain(&mut self) -> Vec<StmtId> {
        self.heap.clear();
        self.pending.drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_lowest_order_first() {
        let mut wl = Worklist::new();
        wl.insert(10, 5);
        wl.insert(11, 1);
        wl.insert(12, 3);

        assert_eq!(wl.take(), Some(11));
        assert_eq!(wl.take(), Some(12));
        assert_eq!(wl.take(), Some(10));
        assert_eq!(wl.take(), None);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut wl = Worklist::new();
        assert!(wl.insert(7, 2));
        assert!(!wl.insert(7, 2));
        assert!(!wl.insert(7, 9));

        assert_eq!(wl.len(), 1);
        assert_eq!(wl.take(), Some(7));
        assert_eq!(wl.take(), None);
    }

    #[test]
    fn test_reinsert_after_take() {
        let mut wl = Worklist::new();
        wl.insert(7, 2);
        assert_eq!(wl.take(), Some(7));
        assert!(wl.insert(7, 2));
        assert_eq!(wl.take(), Some(7));
    }

    #[test]
    fn test_drain_clears_everything() {
        let mut wl = Worklist::new();
        wl.insert(1, 4);
        wl.insert(2, 3);

        let mut drained = wl.drain();
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2]);
        assert!(wl.is_empty());
        assert_eq!(wl.take(), None);
    }

    #[test]
    fn test_contains_tracks_pending_only() {
        let mut wl = Worklist::new();
        wl.insert(3, 1);
        assert!(wl.contains(3));
        wl.take();
        assert!(!wl.contains(3));
    }
}
