//! Dataflow Statements (Equations)
//!
//! A statement binds one registered operator to a left-hand-side variable
//! and an ordered list of operand variables. It is the unit of evaluation
//! and of deduplication: two statements are equal iff they share the same
//! operator handle, the same left-hand side and the same ordered operands.
//!
//! Arity is one polymorphic shape with a tag, not a class per operand
//! count: the 0..3-operand cases are stored inline with no heap
//! allocation, arbitrary arity falls back to a boxed slice.

use super::variable::VarId;

/// Statement identifier (stable handle)
pub type StmtId = u32;

/// Handle of an operator registered with the solver
pub type OperatorId = u32;

/// Ordered right-hand-side operand list, tagged by arity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operands {
    Nullary,
    Unary(VarId),
    Binary(VarId, VarId),
    Ternary(VarId, VarId, VarId),
    Nary(Box<[VarId]>),
}

impl Operands {
    /// Build from a slice, picking the inline representation when it fits
    pub fn from_slice(rhs: &[VarId]) -> Self {
        match *rhs {
            [] => Operands::Nullary,
            [a] => Operands::Unary(a),
            [a, b] => Operands::Binary(a, b),
            [a, b, c] => Operands::Ternary(a, b, c),
            _ => Operands::Nary(rhs.to_vec().into_boxed_slice()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Operands::Nullary => 0,
            Operands::Unary(_) => 1,
            Operands::Binary(_, _) => 2,
            Operands::Ternary(_, _, _) => 3,
            Operands::Nary(xs) => xs.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Operands::Nullary)
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<VarId> {
        match (self, i) {
            (Operands::Unary(a), 0) => Some(*a),
            (Operands::Binary(a, _), 0) => Some(*a),
            (Operands::Binary(_, b), 1) => Some(*b),
            (Operands::Ternary(a, _, _), 0) => Some(*a),
            (Operands::Ternary(_, b, _), 1) => Some(*b),
            (Operands::Ternary(_, _, c), 2) => Some(*c),
            (Operands::Nary(xs), _) => xs.get(i).copied(),
            _ => None,
        }
    }

    /// Iterate operands in order
    pub fn iter(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.len()).map_while(move |i| self.get(i))
    }

    #[inline]
    pub fn contains(&self, v: VarId) -> bool {
        self.iter().any(|x| x == v)
    }
}

/// One dataflow equation: `lhs := op(operands)`
///
/// `lhs` is `None` only for nullary diagnostic statements; a statement with
/// a left-hand side is the sole producer recorded for that variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    /// Operator handle; operator identity for deduplication
    pub op: OperatorId,

    /// Variable written by this statement
    pub lhs: Option<VarId>,

    /// Ordered operand variables read by this statement
    pub operands: Operands,
}

impl Statement {
    #[inline]
    pub fn nullary(op: OperatorId, lhs: Option<VarId>) -> Self {
        Self {
            op,
            lhs,
            operands: Operands::Nullary,
        }
    }

    #[inline]
    pub fn unary(op: OperatorId, lhs: VarId, rhs: VarId) -> Self {
        Self {
            op,
            lhs: Some(lhs),
            operands: Operands::Unary(rhs),
        }
    }

    #[inline]
    pub fn binary(op: OperatorId, lhs: VarId, a: VarId, b: VarId) -> Self {
        Self {
            op,
            lhs: Some(lhs),
            operands: Operands::Binary(a, b),
        }
    }

    #[inline]
    pub fn ternary(op: OperatorId, lhs: VarId, a: VarId, b: VarId, c: VarId) -> Self {
        Self {
            op,
            lhs: Some(lhs),
            operands: Operands::Ternary(a, b, c),
        }
    }

    #[inline]
    pub fn nary(op: OperatorId, lhs: Option<VarId>, rhs: &[VarId]) -> Self {
        Self {
            op,
            lhs,
            operands: Operands::from_slice(rhs),
        }
    }

    /// Whether this statement reads `v`
    #[inline]
    pub fn uses(&self, v: VarId) -> bool {
        self.operands.contains(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_picks_inline_variants() {
        assert_eq!(Operands::from_slice(&[]), Operands::Nullary);
        assert_eq!(Operands::from_slice(&[4]), Operands::Unary(4));
        assert_eq!(Operands::from_slice(&[4, 5]), Operands::Binary(4, 5));
        assert_eq!(Operands::from_slice(&[4, 5, 6]), Operands::Ternary(4, 5, 6));
        assert!(matches!(
            Operands::from_slice(&[4, 5, 6, 7]),
            Operands::Nary(_)
        ));
    }

    #[test]
    fn test_iter_preserves_order() {
        let ops = Operands::from_slice(&[9, 3, 7, 1]);
        assert_eq!(ops.iter().collect::<Vec<_>>(), vec![9, 3, 7, 1]);
        assert_eq!(ops.len(), 4);
        assert!(ops.contains(7));
        assert!(!ops.contains(2));
    }

    #[test]
    fn test_statement_identity() {
        let a = Statement::unary(0, 1, 2);
        let b = Statement::unary(0, 1, 2);
        let c = Statement::unary(1, 1, 2);
        let d = Statement::unary(0, 1, 3);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_operand_order_matters_for_identity() {
        let a = Statement::binary(0, 1, 2, 3);
        let b = Statement::binary(0, 1, 3, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_nary_normalizes_to_inline_shape() {
        // Same logical operands through different constructors normalize
        // to the same tagged shape.
        let s1 = Statement::nary(0, Some(1), &[2, 3]);
        let s2 = Statement::binary(0, 1, 2, 3);
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_uses() {
        let s = Statement::ternary(0, 1, 2, 3, 4);
        assert!(s.uses(3));
        assert!(!s.uses(1)); // lhs is written, not read
    }
}
