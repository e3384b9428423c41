//! # Fixed-Point Equation Solver
//!
//! Domain-agnostic iterative solver for large systems of monotone
//! dataflow equations over an abstract domain. The engine knows nothing
//! about any particular analysis; it only knows variables, operators and
//! the graph connecting them. Pointer analysis, call-graph construction
//! and slicing are clients that instantiate the value domain and feed
//! statements in, possibly while solving is already under way.
//!
//! Design points:
//! - One statement shape with an arity tag instead of a class per operand
//!   count; 0..3 operands stay inline.
//! - Statements are hash-consed; re-adding an equation is a no-op.
//! - Evaluation order approximates topological order via per-variable
//!   order numbers, renumbered adaptively as the graph grows.
//! - Statements reporting themselves permanently settled are pruned.
//!
//! ## Usage
//! ```text
//! let mut solver = FixpointSolver::new();
//! let assign = solver.register_operator(AssignOp);
//! let a = solver.new_variable(KeySet::singleton(k));
//! let b = solver.new_variable(KeySet::new());
//! solver.add_unary(b, assign, a, Activation::Enqueue)?;
//! solver.solve()?;
//! ```

pub mod domain;
pub mod infrastructure;

pub use domain::{
    AbstractValue, EvalResult, Evaluation, Operands, Operator, OperatorId, Statement, StmtId,
    VarId,
};
pub use infrastructure::{
    Activation, EquationGraph, FixpointSolver, SolverConfig, SolverSnapshot, SolverStats, Worklist,
};
