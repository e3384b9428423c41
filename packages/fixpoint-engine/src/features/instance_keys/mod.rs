//! # Instance-Key Value Domain
//!
//! A concrete abstract domain instantiating the fixpoint engine: each
//! lattice element is a set of instance keys, where an instance key
//! stands for an equivalence class of runtime allocations. The
//! class-based policy merges all allocations of one concrete type into a
//! single key, keeping the domain small and its height finite.
//!
//! The engine itself (`features::fixpoint`) never sees any of this; it is
//! one client among possible many.

pub mod application;
pub mod domain;

pub use application::{AssignOp, FilterOp, PropagationSystem, SeedOp, UnionOp};
pub use domain::{InstanceKey, InstanceKeyFactory, KeyId, KeyKind, KeySet, TypeId};
