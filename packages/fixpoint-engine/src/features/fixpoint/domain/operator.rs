//! Operators and Evaluation Results
//!
//! An operator is the client-supplied function of a dataflow equation. It
//! reads the current operand values and the current left-hand-side value
//! and reports whether the left-hand side grew, whether evaluation had an
//! effect beyond the lattice value, and whether the statement is settled
//! forever.
//!
//! Operators MUST be monotone with respect to the value domain. The engine
//! does not verify this; violating it breaks termination.

use super::variable::AbstractValue;

/// Outcome of one statement evaluation, as seen by the solve loop.
///
/// Tagged replacement for a bit-mask result byte: the three flags are
/// independent and every combination is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalResult {
    /// The left-hand-side value grew
    pub changed: bool,

    /// The operator had an effect beyond the lattice value; re-evaluation
    /// is not free even when operands are unchanged
    pub side_effect: bool,

    /// The statement will never produce a different result again and may
    /// be removed from the graph
    pub fixed: bool,
}

impl EvalResult {
    #[inline]
    pub fn unchanged() -> Self {
        Self::default()
    }

    #[inline]
    pub fn changed() -> Self {
        Self {
            changed: true,
            ..Self::default()
        }
    }
}

/// What an operator returns from [`Operator::evaluate`].
///
/// `value` carries the new left-hand-side value exactly when it grew; the
/// engine writes it back and reports CHANGED. Returning `None` is the fast
/// NOT_CHANGED path and must be cheap when operands have not contributed
/// anything new since the last evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation<V> {
    /// New left-hand-side value, if it grew
    pub value: Option<V>,

    /// The operator had an effect beyond the lattice value
    pub side_effect: bool,

    /// The statement is permanently settled
    pub fixed: bool,
}

impl<V> Evaluation<V> {
    /// The left-hand side did not grow
    #[inline]
    pub fn unchanged() -> Self {
        Self {
            value: None,
            side_effect: false,
            fixed: false,
        }
    }

    /// The left-hand side grew to `value`
    #[inline]
    pub fn grew(value: V) -> Self {
        Self {
            value: Some(value),
            side_effect: false,
            fixed: false,
        }
    }

    /// Mark the statement permanently settled
    #[inline]
    pub fn and_fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Record an effect beyond the lattice value
    #[inline]
    pub fn with_side_effect(mut self) -> Self {
        self.side_effect = true;
        self
    }
}

/// A monotone operator over the value domain `V`.
///
/// Implementations are registered once with the solver and addressed by
/// handle; two statements are considered equal only if they share the same
/// registered operator. Side-effecting operators take `&self` and use
/// interior mutability for whatever state they touch; they must set
/// `side_effect` on their evaluations.
///
/// Evaluation must not panic on valid inputs; a panicking operator aborts
/// the whole solve with no per-statement recovery.
pub trait Operator<V: AbstractValue>: std::fmt::Debug {
    /// Diagnostic name, used in trace output
    fn name(&self) -> &str {
        "op"
    }

    /// Recompute the left-hand-side value from the current operand values.
    ///
    /// `lhs` is `None` for diagnostic statements with no left-hand side;
    /// such operators must return `value: None` (there is nowhere to write
    /// a result, and the engine will not fan out).
    fn evaluate(&self, lhs: Option<&V>, operands: &[&V]) -> Evaluation<V>;
}
