//! Name-Based Propagation System
//!
//! Thin client facade over the fixpoint engine for flow-insensitive
//! points-to propagation: program variables are referred to by name,
//! allocations by concrete type, and the facade turns each program fact
//! into one engine statement. Call-graph construction policy and context
//! sensitivity stay with the embedding system.
//!
//! ## Usage
//! ```text
//! let mut system = PropagationSystem::new();
//! system.add_alloc("x", "A")?;
//! system.add_assign("y", "x")?;
//! system.solve()?;
//! assert_eq!(system.points_to("y"), vec!["[A]"]);
//! ```

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::features::fixpoint::domain::{OperatorId, VarId};
use crate::features::fixpoint::infrastructure::{Activation, FixpointSolver, SolverConfig};
use crate::features::instance_keys::application::operators::{
    AssignOp, FilterOp, SeedOp, UnionOp,
};
use crate::features::instance_keys::domain::instance_key::{InstanceKeyFactory, KeyId};
use crate::features::instance_keys::domain::key_set::KeySet;

/// Flow-insensitive points-to propagation over named variables
pub struct PropagationSystem {
    solver: FixpointSolver<KeySet>,
    factory: InstanceKeyFactory,

    var_ids: FxHashMap<String, VarId>,
    var_names: FxHashMap<VarId, String>,

    assign_op: OperatorId,
    union_op: OperatorId,

    /// One seed operator registration per distinct key set shape
    seed_ops: FxHashMap<KeyId, OperatorId>,

    /// One filter operator registration per distinct allowed set
    filter_ops: FxHashMap<Vec<KeyId>, OperatorId>,
}

impl Default for PropagationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl PropagationSystem {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        let mut solver = FixpointSolver::with_config(config);
        let assign_op = solver.register_operator(AssignOp);
        let union_op = solver.register_operator(UnionOp);
        Self {
            solver,
            factory: InstanceKeyFactory::new(),
            var_ids: FxHashMap::default(),
            var_names: FxHashMap::default(),
            assign_op,
            union_op,
            seed_ops: FxHashMap::default(),
            filter_ops: FxHashMap::default(),
        }
    }

    fn var(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.var_ids.get(name) {
            return id;
        }
        let id = self.solver.new_variable(KeySet::new());
        self.var_ids.insert(name.to_string(), id);
        self.var_names.insert(id, name.to_string());
        id
    }

    /// `var = new T()`: var's set includes the key of concrete type
    /// `type_name`
    pub fn add_alloc(&mut self, var: &str, type_name: &str) -> Result<()> {
        let key = self.factory.key_for_allocation(type_name);
        let lhs = self.var(var);
        let op = match self.seed_ops.get(&key) {
            Some(&op) => op,
            None => {
                let op = self.solver.register_operator(SeedOp::new(KeySet::singleton(key)));
                self.seed_ops.insert(key, op);
                op
            }
        };
        self.solver.add_nullary(Some(lhs), op, Activation::Enqueue)?;
        Ok(())
    }

    /// `dst = src`
    pub fn add_assign(&mut self, dst: &str, src: &str) -> Result<()> {
        let lhs = self.var(dst);
        let rhs = self.var(src);
        self.solver
            .add_unary(lhs, self.assign_op, rhs, Activation::Enqueue)?;
        Ok(())
    }

    /// `dst = (T) src`: only keys of the allowed types flow
    pub fn add_filter(&mut self, dst: &str, src: &str, allowed_types: &[&str]) -> Result<()> {
        let mut allowed: Vec<KeyId> = allowed_types
            .iter()
            .map(|t| self.factory.key_for_allocation(t))
            .collect();
        allowed.sort_unstable();
        allowed.dedup();

        let lhs = self.var(dst);
        let rhs = self.var(src);
        let op = match self.filter_ops.get(&allowed) {
            Some(&op) => op,
            None => {
                let set = KeySet::from_iter(allowed.iter().copied());
                let op = self.solver.register_operator(FilterOp::new(set));
                self.filter_ops.insert(allowed, op);
                op
            }
        };
        self.solver.add_unary(lhs, op, rhs, Activation::Enqueue)?;
        Ok(())
    }

    /// `dst = φ(srcs...)`: merge point
    pub fn add_union(&mut self, dst: &str, srcs: &[&str]) -> Result<()> {
        let lhs = self.var(dst);
        let rhs: Vec<VarId> = srcs.iter().map(|s| self.var(s)).collect();
        self.solver
            .add_statement(lhs, self.union_op, &rhs, Activation::Enqueue)?;
        Ok(())
    }

    /// Iterate to the least fixed point. Returns whether anything changed;
    /// callers interleaving fact generation with solving use this to drive
    /// their outer loop.
    pub fn solve(&mut self) -> Result<bool> {
        self.solver.solve()
    }

    /// Display names of the keys `var` may point to, sorted
    pub fn points_to(&self, var: &str) -> Vec<String> {
        let Some(&id) = self.var_ids.get(var) else {
            return Vec::new();
        };
        self.solver
            .value(id)
            .iter()
            .filter_map(|k| self.factory.key(k))
            .map(|k| k.to_string())
            .collect()
    }

    /// Whether two variables may point to a common key
    pub fn may_alias(&self, a: &str, b: &str) -> bool {
        let (Some(&ia), Some(&ib)) = (self.var_ids.get(a), self.var_ids.get(b)) else {
            return false;
        };
        let sa = self.solver.value(ia);
        self.solver.value(ib).iter().any(|k| sa.contains(k))
    }

    pub fn solver(&self) -> &FixpointSolver<KeySet> {
        &self.solver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_assign_chain() {
        let mut system = PropagationSystem::new();
        system.add_alloc("x", "A").unwrap();
        system.add_assign("y", "x").unwrap();
        system.add_assign("z", "y").unwrap();
        assert!(system.solve().unwrap());

        assert_eq!(system.points_to("z"), vec!["[A]".to_string()]);
        assert!(system.may_alias("x", "z"));
        assert!(system.solver().empty_worklist());
    }

    #[test]
    fn test_filter_blocks_wrong_type() {
        let mut system = PropagationSystem::new();
        system.add_alloc("x", "A").unwrap();
        system.add_alloc("x", "B").unwrap();
        system.add_filter("y", "x", &["A"]).unwrap();
        system.solve().unwrap();

        assert_eq!(system.points_to("y"), vec!["[A]".to_string()]);
        assert!(system.may_alias("x", "y"));
    }

    #[test]
    fn test_union_merge_point() {
        let mut system = PropagationSystem::new();
        system.add_alloc("a", "A").unwrap();
        system.add_alloc("b", "B").unwrap();
        system.add_union("m", &["a", "b"]).unwrap();
        system.solve().unwrap();

        let mut pts = system.points_to("m");
        pts.sort();
        assert_eq!(pts, vec!["[A]".to_string(), "[B]".to_string()]);
    }

    #[test]
    fn test_assignment_cycle_converges() {
        let mut system = PropagationSystem::new();
        system.add_alloc("p", "A").unwrap();
        system.add_assign("q", "p").unwrap();
        system.add_assign("p", "q").unwrap();
        system.solve().unwrap();

        assert!(system.may_alias("p", "q"));
        assert!(system.solver().empty_worklist());
    }

    #[test]
    fn test_incremental_growth_between_solves() {
        let mut system = PropagationSystem::new();
        system.add_alloc("x", "A").unwrap();
        system.add_assign("y", "x").unwrap();
        assert!(system.solve().unwrap());

        // discover a new fact after convergence, as call-graph clients do
        system.add_assign("z", "y").unwrap();
        assert!(system.solve().unwrap());
        assert_eq!(system.points_to("z"), vec!["[A]".to_string()]);

        // converged: another round changes nothing
        assert!(!system.solve().unwrap());
    }

    #[test]
    fn test_unknown_variable_has_empty_points_to() {
        let system = PropagationSystem::new();
        assert!(system.points_to("nope").is_empty());
        assert!(!system.may_alias("nope", "nah"));
    }
}
