//! Domain layer for the fixpoint engine
//!
//! Variables, operators and statements. Everything here is
//! domain-agnostic: the engine knows only handles, operand lists and the
//! grow/settled signals operators report.

pub mod operator;
pub mod statement;
pub mod variable;

pub use operator::{EvalResult, Evaluation, Operator};
pub use statement::{OperatorId, Operands, Statement, StmtId};
pub use variable::{AbstractValue, VarId, VariableCell};
