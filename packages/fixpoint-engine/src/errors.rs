//! Error types for fixpoint-engine
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

/// Main error type for fixpoint solver operations
#[derive(Debug, Error)]
pub enum FixpointError {
    /// A statement-creation call named a variable handle that was never allocated
    #[error("unknown variable handle v{0}")]
    UnknownVariable(u32),

    /// A statement-creation call named an operator that was never registered
    #[error("unknown operator handle op{0}")]
    UnknownOperator(u32),

    /// An n-ary statement was created with an empty operand list
    #[error("n-ary statement requires at least one operand")]
    EmptyOperands,

    /// The periodic maintenance hook requested that the solve be aborted
    #[error("solve cancelled: {0}")]
    Cancelled(String),
}

/// Result type alias for fixpoint operations
pub type Result<T> = std::result::Result<T, FixpointError>;
