//! Propagation Operators over Key Sets
//!
//! The dataflow operators a pointer-analysis client instantiates the
//! engine with. All are monotone: outputs only grow as inputs grow.
//!
//! - `SeedOp`   (nullary): contribute a constant set, then settle forever
//! - `AssignOp` (unary):   lhs ⊇ rhs
//! - `FilterOp` (unary):   lhs ⊇ rhs ∩ allowed
//! - `UnionOp`  (n-ary):   lhs ⊇ ∪ operands

use crate::features::fixpoint::domain::{Evaluation, Operator};
use crate::features::instance_keys::domain::key_set::KeySet;

/// Introduces a constant key set into its left-hand side. After the first
/// contribution nothing can change its output again, so it reports itself
/// settled and gets pruned from the graph.
#[derive(Debug)]
pub struct SeedOp {
    keys: KeySet,
}

impl SeedOp {
    pub fn new(keys: KeySet) -> Self {
        Self { keys }
    }
}

impl Operator<KeySet> for SeedOp {
    fn name(&self) -> &str {
        "seed"
    }

    fn evaluate(&self, lhs: Option<&KeySet>, _operands: &[&KeySet]) -> Evaluation<KeySet> {
        let current = lhs.expect("seed statement requires a left-hand side");
        let mut next = current.clone();
        if next.union_with(&self.keys) {
            Evaluation::grew(next).and_fixed()
        } else {
            Evaluation::unchanged().and_fixed()
        }
    }
}

/// Simple assignment: lhs ⊇ rhs
#[derive(Debug, Default)]
pub struct AssignOp;

impl Operator<KeySet> for AssignOp {
    fn name(&self) -> &str {
        "assign"
    }

    fn evaluate(&self, lhs: Option<&KeySet>, operands: &[&KeySet]) -> Evaluation<KeySet> {
        let current = lhs.expect("assign statement requires a left-hand side");
        let rhs = operands[0];
        if rhs.subset_of(current) {
            return Evaluation::unchanged();
        }
        let mut next = current.clone();
        next.union_with(rhs);
        Evaluation::grew(next)
    }
}

/// Filtered assignment: lhs ⊇ rhs ∩ allowed. The shape of type filters in
/// pointer analysis (casts, exception catch clauses).
#[derive(Debug)]
pub struct FilterOp {
    allowed: KeySet,
}

impl FilterOp {
    pub fn new(allowed: KeySet) -> Self {
        Self { allowed }
    }
}

impl Operator<KeySet> for FilterOp {
    fn name(&self) -> &str {
        "filter"
    }

    fn evaluate(&self, lhs: Option<&KeySet>, operands: &[&KeySet]) -> Evaluation<KeySet> {
        let current = lhs.expect("filter statement requires a left-hand side");
        let mut filtered = operands[0].clone();
        filtered.intersect_with(&self.allowed);
        if filtered.subset_of(current) {
            return Evaluation::unchanged();
        }
        let mut next = current.clone();
        next.union_with(&filtered);
        Evaluation::grew(next)
    }
}

/// N-ary union: lhs ⊇ ∪ operands
#[derive(Debug, Default)]
pub struct UnionOp;

impl Operator<KeySet> for UnionOp {
    fn name(&self) -> &str {
        "union"
    }

    fn evaluate(&self, lhs: Option<&KeySet>, operands: &[&KeySet]) -> Evaluation<KeySet> {
        let current = lhs.expect("union statement requires a left-hand side");
        let mut next = current.clone();
        let mut grew = false;
        for rhs in operands {
            grew |= next.union_with(rhs);
        }
        if grew {
            Evaluation::grew(next)
        } else {
            Evaluation::unchanged()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_contributes_then_settles() {
        let op = SeedOp::new(KeySet::from_iter([1, 2]));
        let bottom = KeySet::new();

        let first = op.evaluate(Some(&bottom), &[]);
        assert!(first.fixed);
        assert_eq!(first.value, Some(KeySet::from_iter([1, 2])));

        let grown = first.value.unwrap();
        let second = op.evaluate(Some(&grown), &[]);
        assert!(second.fixed);
        assert_eq!(second.value, None);
    }

    #[test]
    fn test_assign_fast_not_changed_path() {
        let op = AssignOp;
        let rhs = KeySet::from_iter([3]);
        let lhs = KeySet::from_iter([3, 5]);
        assert_eq!(op.evaluate(Some(&lhs), &[&rhs]).value, None);

        let bottom = KeySet::new();
        let eval = op.evaluate(Some(&bottom), &[&rhs]);
        assert_eq!(eval.value, Some(KeySet::from_iter([3])));
        assert!(!eval.fixed);
    }

    #[test]
    fn test_filter_keeps_only_allowed() {
        let op = FilterOp::new(KeySet::from_iter([1, 2]));
        let rhs = KeySet::from_iter([2, 3, 4]);
        let bottom = KeySet::new();

        let eval = op.evaluate(Some(&bottom), &[&rhs]);
        assert_eq!(eval.value, Some(KeySet::from_iter([2])));

        // nothing admissible left: unchanged
        let grown = KeySet::from_iter([2]);
        assert_eq!(op.evaluate(Some(&grown), &[&rhs]).value, None);
    }

    #[test]
    fn test_union_merges_all_operands() {
        let op = UnionOp;
        let a = KeySet::from_iter([1]);
        let b = KeySet::from_iter([2]);
        let c = KeySet::from_iter([1, 3]);
        let bottom = KeySet::new();

        let eval = op.evaluate(Some(&bottom), &[&a, &b, &c]);
        assert_eq!(eval.value, Some(KeySet::from_iter([1, 2, 3])));

        let grown = eval.value.unwrap();
        assert_eq!(op.evaluate(Some(&grown), &[&a, &b, &c]).value, None);
    }
}
