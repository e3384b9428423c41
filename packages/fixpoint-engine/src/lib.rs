/*
 * fixpoint-engine - Iterative Fixed-Point Dataflow Solver
 *
 * Feature-First Architecture:
 * - features/fixpoint/      : domain-agnostic monotone equation solver
 * - features/instance_keys/ : type-based instance-key domain + client
 *
 * The solver computes the least solution of a system of monotone
 * dataflow equations over an abstract domain, staying close to
 * topological evaluation order while the equation graph keeps growing
 * during solving.
 */

#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::should_implement_trait)] // from_iter naming intentional

/// Feature modules
pub mod features;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use errors::{FixpointError, Result};
pub use features::fixpoint::{
    AbstractValue, Activation, EquationGraph, EvalResult, Evaluation, FixpointSolver, Operands,
    Operator, OperatorId, SolverConfig, SolverSnapshot, SolverStats, Statement, StmtId, VarId,
    Worklist,
};
pub use features::instance_keys::{
    AssignOp, FilterOp, InstanceKey, InstanceKeyFactory, KeyId, KeyKind, KeySet,
    PropagationSystem, SeedOp, TypeId, UnionOp,
};
