//! Feature modules
//!
//! - `fixpoint`: the domain-agnostic equation solver
//! - `instance_keys`: the type-based instance-key domain and its
//!   propagation client

pub mod fixpoint;
pub mod instance_keys;
