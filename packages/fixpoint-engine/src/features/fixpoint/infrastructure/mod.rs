//! Infrastructure layer for the fixpoint engine
//!
//! - **EquationGraph**: statement/variable arena, uses-index, reordering
//! - **Worklist**: order-number priority queue with idempotent insertion
//! - **FixpointSolver**: the evaluate/propagate orchestration loop

pub mod equation_graph;
pub mod solver;
pub mod worklist;

pub use equation_graph::EquationGraph;
pub use solver::{Activation, FixpointSolver, SolverConfig, SolverSnapshot, SolverStats};
pub use worklist::Worklist;
