//! Iterative Fixed-Point Solver
//!
//! Drives a system of monotone dataflow equations to its least fixed
//! point. Clients register operators, allocate variables and add
//! statements; the solver evaluates pending statements in approximate
//! topological order, fans changes out through the uses-index, prunes
//! statements that report themselves permanently settled, and periodically
//! renumbers the whole graph when it has grown or churned enough for the
//! old order to go stale.
//!
//! # Algorithm
//! ```text
//! while worklist ≠ ∅:
//!   maybe reorder (growth-factor or evaluation-volume trigger)
//!   s = lowest-order pending statement
//!   r = evaluate(s)
//!   if r.changed: enqueue every statement reading s.lhs
//!   if r.fixed:   remove s from the graph
//! ```
//! Convergence follows from operator monotonicity and finite lattice
//! height; confluence from monotonicity, not from evaluation order.
//!
//! # References
//! - Kildall, G. "A Unified Approach to Global Program Optimization" (POPL 1973)
//! - Kam, J. & Ullman, J. "Monotone Data Flow Analysis Frameworks" (Acta Inf. 1977)

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::features::fixpoint::domain::{
    AbstractValue, EvalResult, Operands, Operator, OperatorId, Statement, StmtId, VarId,
};
use crate::features::fixpoint::infrastructure::equation_graph::EquationGraph;
use crate::features::fixpoint::infrastructure::worklist::Worklist;
use crate::FixpointError;

/// What to do with a statement right after it is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Evaluate immediately, integrating its initial contribution
    /// synchronously (fan-out and pruning included)
    Eager,

    /// Enqueue on the worklist for the next solve
    Enqueue,

    /// Register only; the statement stays dormant until an operand
    /// changes or it is enqueued externally
    Dormant,
}

/// Solver tuning knobs, fixed at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Reorder when statements added since the last reorder exceed this
    /// fraction of the total statement count
    pub topological_growth_factor: f64,

    /// Reorder after this many evaluations without one; `u64::MAX`
    /// disables the volume trigger
    pub max_evals_between_reorders: u64,

    /// Skip growth-triggered reorders while the graph holds no more
    /// statements than this
    pub min_size_for_topsort: u32,

    /// Evaluations between verbose-hook firings; 0 disables
    pub verbose_interval: u64,

    /// Evaluations between maintenance-hook firings; 0 disables
    pub maintenance_interval: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            topological_growth_factor: 0.1,
            max_evals_between_reorders: 500_000,
            min_size_for_topsort: 0,
            verbose_interval: 100_000,
            maintenance_interval: 100_000,
        }
    }
}

impl SolverConfig {
    pub fn with_growth_factor(mut self, factor: f64) -> Self {
        self.topological_growth_factor = factor;
        self
    }

    pub fn with_max_evals_between_reorders(mut self, max: u64) -> Self {
        self.max_evals_between_reorders = max;
        self
    }

    pub fn with_min_size_for_topsort(mut self, min: u32) -> Self {
        self.min_size_for_topsort = min;
        self
    }

    pub fn with_verbose_interval(mut self, interval: u64) -> Self {
        self.verbose_interval = interval;
        self
    }

    pub fn with_maintenance_interval(mut self, interval: u64) -> Self {
        self.maintenance_interval = interval;
        self
    }
}

/// Evaluation counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverStats {
    /// Statements evaluated
    pub evaluations: u64,

    /// Statements created (duplicates excluded)
    pub created: u64,

    /// Evaluations that grew a variable
    pub changed: u64,

    /// Statements pruned after reporting themselves settled
    pub removed: u64,

    /// Topological reorders performed
    pub reorders: u64,
}

/// Progress snapshot handed to the instrumentation hooks
#[derive(Debug, Clone, Copy)]
pub struct SolverSnapshot {
    pub evaluations: u64,
    pub created: u64,
    pub worklist_len: usize,
}

type VerboseHook = Box<dyn FnMut(&SolverSnapshot)>;
type MaintenanceHook = Box<dyn FnMut(&SolverSnapshot) -> Result<()>>;

/// Iterative solver over a monotone equation system
pub struct FixpointSolver<V: AbstractValue> {
    graph: EquationGraph<V>,
    worklist: Worklist,
    operators: Vec<Box<dyn Operator<V>>>,
    config: SolverConfig,
    stats: SolverStats,

    /// First solve runs setup exactly once: mandatory initial reorder and
    /// worklist seeding
    first_solve: bool,

    /// Statements added since the last reorder
    stmts_since_reorder: u64,
    evals_at_last_reorder: u64,

    verbose_hook: Option<VerboseHook>,
    maintenance_hook: Option<MaintenanceHook>,
}

impl<V: AbstractValue> Default for FixpointSolver<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: AbstractValue> FixpointSolver<V> {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            graph: EquationGraph::new(),
            worklist: Worklist::new(),
            operators: Vec::new(),
            config,
            stats: SolverStats::default(),
            first_solve: true,
            stmts_since_reorder: 0,
            evals_at_last_reorder: 0,
            verbose_hook: None,
            maintenance_hook: None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Registration and access
    // ═══════════════════════════════════════════════════════════════════

    /// Register an operator; the returned handle is its identity for
    /// statement deduplication
    pub fn register_operator<O: Operator<V> + 'static>(&mut self, op: O) -> OperatorId {
        let id = self.operators.len() as OperatorId;
        self.operators.push(Box::new(op));
        id
    }

    /// Allocate a variable initialized to `initial` (its bottom unless the
    /// client seeds it higher)
    pub fn new_variable(&mut self, initial: V) -> VarId {
        self.graph.new_variable(initial)
    }

    #[inline]
    pub fn value(&self, v: VarId) -> &V {
        self.graph.value(v)
    }

    /// Mutable access for clients that seed or grow a variable directly.
    /// Callers must only grow the value, and must follow external changes
    /// with [`changed_variable`] so consumers re-evaluate.
    #[inline]
    pub fn value_mut(&mut self, v: VarId) -> &mut V {
        self.graph.value_mut(v)
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn num_evaluations(&self) -> u64 {
        self.stats.evaluations
    }

    pub fn num_statements(&self) -> usize {
        self.graph.num_statements()
    }

    pub fn num_variables(&self) -> usize {
        self.graph.num_variables()
    }

    pub fn statements(&self) -> impl Iterator<Item = (StmtId, &Statement)> {
        self.graph.statements()
    }

    pub fn contains_statement(&self, s: &Statement) -> bool {
        self.graph.contains_statement(s)
    }

    pub fn empty_worklist(&self) -> bool {
        self.worklist.is_empty()
    }

    pub fn worklist_contains(&self, id: StmtId) -> bool {
        self.worklist.contains(id)
    }

    /// Callback fired every `verbose_interval` evaluations
    pub fn set_verbose_hook(&mut self, hook: impl FnMut(&SolverSnapshot) + 'static) {
        self.verbose_hook = Some(Box::new(hook));
    }

    /// Bookkeeping callback fired every `maintenance_interval`
    /// evaluations. Returning an error aborts the solve; this is the
    /// loop's cancellation point.
    pub fn set_maintenance_hook(
        &mut self,
        hook: impl FnMut(&SolverSnapshot) -> Result<()> + 'static,
    ) {
        self.maintenance_hook = Some(Box::new(hook));
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statement creation
    // ═══════════════════════════════════════════════════════════════════

    /// Add a statement with no operands. `lhs` may be omitted for
    /// diagnostic statements; such a statement never fires unless
    /// explicitly enqueued.
    pub fn add_nullary(
        &mut self,
        lhs: Option<VarId>,
        op: OperatorId,
        activation: Activation,
    ) -> Result<StmtId> {
        self.insert_statement(Statement::nullary(op, lhs), activation)
    }

    /// Add `lhs := op(rhs)`
    pub fn add_unary(
        &mut self,
        lhs: VarId,
        op: OperatorId,
        rhs: VarId,
        activation: Activation,
    ) -> Result<StmtId> {
        self.insert_statement(Statement::unary(op, lhs, rhs), activation)
    }

    /// Add `lhs := op(a, b)`
    pub fn add_binary(
        &mut self,
        lhs: VarId,
        op: OperatorId,
        a: VarId,
        b: VarId,
        activation: Activation,
    ) -> Result<StmtId> {
        self.insert_statement(Statement::binary(op, lhs, a, b), activation)
    }

    /// Add `lhs := op(a, b, c)`
    pub fn add_ternary(
        &mut self,
        lhs: VarId,
        op: OperatorId,
        a: VarId,
        b: VarId,
        c: VarId,
        activation: Activation,
    ) -> Result<StmtId> {
        self.insert_statement(Statement::ternary(op, lhs, a, b, c), activation)
    }

    /// Add `lhs := op(rhs...)` with arbitrary arity. An empty operand
    /// list is a programmer error; use [`add_nullary`] for zero operands.
    pub fn add_statement(
        &mut self,
        lhs: VarId,
        op: OperatorId,
        rhs: &[VarId],
        activation: Activation,
    ) -> Result<StmtId> {
        if rhs.is_empty() {
            return Err(FixpointError::EmptyOperands);
        }
        self.insert_statement(Statement::nary(op, Some(lhs), rhs), activation)
    }

    fn insert_statement(&mut self, stmt: Statement, activation: Activation) -> Result<StmtId> {
        self.validate(&stmt)?;

        // Hash-consing: adding an existing equation is a no-op
        if let Some(existing) = self.graph.find(&stmt) {
            return Ok(existing);
        }

        if let Some(lhs) = stmt.lhs {
            self.graph.assign_fresh_order(lhs);
        }
        let id = self.graph.add_statement(stmt);
        self.stats.created += 1;
        self.stmts_since_reorder += 1;

        match activation {
            Activation::Eager => {
                self.evaluate_and_integrate(id)?;
            }
            Activation::Enqueue => self.enqueue(id),
            Activation::Dormant => {}
        }
        Ok(id)
    }

    fn validate(&self, stmt: &Statement) -> Result<()> {
        if stmt.op as usize >= self.operators.len() {
            return Err(FixpointError::UnknownOperator(stmt.op));
        }
        if let Some(lhs) = stmt.lhs {
            if !self.graph.contains_variable(lhs) {
                return Err(FixpointError::UnknownVariable(lhs));
            }
        }
        for operand in stmt.operands.iter() {
            if !self.graph.contains_variable(operand) {
                return Err(FixpointError::UnknownVariable(operand));
            }
        }
        Ok(())
    }

    /// Remove a statement from the system (explicit client removal; FIXED
    /// pruning happens automatically). Pending worklist entries for it
    /// become inert.
    pub fn remove_statement(&mut self, id: StmtId) -> bool {
        let removed = self.graph.remove_statement(id);
        if removed {
            self.stats.removed += 1;
        }
        removed
    }

    // ═══════════════════════════════════════════════════════════════════
    // Propagation
    // ═══════════════════════════════════════════════════════════════════

    fn enqueue(&mut self, id: StmtId) {
        let order = self.graph.statement_order(id);
        self.worklist.insert(id, order);
    }

    /// Notify the solver that `v`'s value changed: every statement reading
    /// `v` becomes pending. This is the sole growth mechanism for the
    /// worklist and the entry point for external (client-made) changes.
    pub fn changed_variable(&mut self, v: VarId) {
        let users: Vec<StmtId> = self.graph.statements_that_use(v).collect();
        for id in users {
            self.enqueue(id);
        }
    }

    /// Enqueue every live statement
    pub fn enqueue_all_statements(&mut self) {
        let ids: Vec<StmtId> = self.graph.statement_ids().collect();
        for id in ids {
            self.enqueue(id);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Evaluation
    // ═══════════════════════════════════════════════════════════════════

    /// Evaluate one statement and write back a grown value. No fan-out,
    /// no pruning, no counters; diagnostic and internal use.
    pub fn evaluate_statement(&mut self, id: StmtId) -> EvalResult {
        let stmt = self.graph.statement(id).expect("statement is live");
        let op = &self.operators[stmt.op as usize];
        let lhs = stmt.lhs;
        let lhs_val = lhs.map(|l| self.graph.value(l));

        let evaluation = match stmt.operands {
            Operands::Nullary => op.evaluate(lhs_val, &[]),
            Operands::Unary(a) => op.evaluate(lhs_val, &[self.graph.value(a)]),
            Operands::Binary(a, b) => {
                op.evaluate(lhs_val, &[self.graph.value(a), self.graph.value(b)])
            }
            Operands::Ternary(a, b, c) => op.evaluate(
                lhs_val,
                &[self.graph.value(a), self.graph.value(b), self.graph.value(c)],
            ),
            Operands::Nary(ref xs) => {
                let vals: Vec<&V> = xs.iter().map(|&x| self.graph.value(x)).collect();
                op.evaluate(lhs_val, &vals)
            }
        };

        let mut result = EvalResult {
            changed: false,
            side_effect: evaluation.side_effect,
            fixed: evaluation.fixed,
        };
        if let Some(new_value) = evaluation.value {
            // A grown value with no lhs has nowhere to go; the flag still
            // reports CHANGED but nothing fans out
            result.changed = true;
            if let Some(l) = lhs {
                *self.graph.value_mut(l) = new_value;
            }
        }
        result
    }

    /// Evaluate `id` and integrate the outcome: counters, hooks, fan-out
    /// on change, pruning on fixed
    fn evaluate_and_integrate(&mut self, id: StmtId) -> Result<EvalResult> {
        let result = self.evaluate_statement(id);
        self.stats.evaluations += 1;
        if result.changed {
            self.stats.changed += 1;
        }

        let interval = self.config.verbose_interval;
        if interval != 0 && self.stats.evaluations % interval == 0 {
            self.verbose_tick();
        }
        let interval = self.config.maintenance_interval;
        if interval != 0 && self.stats.evaluations % interval == 0 {
            if let Some(hook) = &mut self.maintenance_hook {
                let snapshot = SolverSnapshot {
                    evaluations: self.stats.evaluations,
                    created: self.stats.created,
                    worklist_len: self.worklist.len(),
                };
                hook(&snapshot)?;
            }
        }

        if result.changed {
            if let Some(lhs) = self.graph.statement(id).and_then(|s| s.lhs) {
                self.changed_variable(lhs);
            }
        }
        if result.fixed {
            self.remove_statement(id);
        }
        Ok(result)
    }

    fn verbose_tick(&mut self) {
        let snapshot = SolverSnapshot {
            evaluations: self.stats.evaluations,
            created: self.stats.created,
            worklist_len: self.worklist.len(),
        };
        debug!(
            "fixpoint progress: evaluated {} created {} worklist {}",
            snapshot.evaluations, snapshot.created, snapshot.worklist_len
        );
        if let Some(hook) = &mut self.verbose_hook {
            hook(&snapshot);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Reordering policy
    // ═══════════════════════════════════════════════════════════════════

    fn maybe_reorder(&mut self) {
        let total = self.graph.num_statements();
        if total > self.config.min_size_for_topsort as usize {
            let growth = self.stmts_since_reorder as f64 / total as f64;
            if growth > self.config.topological_growth_factor {
                self.reorder_now();
                return;
            }
        }

        if self.stats.evaluations - self.evals_at_last_reorder
            > self.config.max_evals_between_reorders
        {
            self.reorder_now();
        }
    }

    /// Renumber the whole graph, re-keying pending work under the new
    /// order. The worklist is drained and re-populated; membership is
    /// preserved exactly.
    fn reorder_now(&mut self) {
        debug!(
            "reorder: {} statements, {} evaluations",
            self.graph.num_statements(),
            self.stats.evaluations
        );
        let pending = self.worklist.drain();
        self.graph.reorder();
        for id in pending {
            self.enqueue(id);
        }
        self.stats.reorders += 1;
        self.stmts_since_reorder = 0;
        self.evals_at_last_reorder = self.stats.evaluations;
    }

    // ═══════════════════════════════════════════════════════════════════
    // The solve loop
    // ═══════════════════════════════════════════════════════════════════

    /// Iterate to the least fixed point: evaluate pending statements until
    /// the worklist is empty.
    ///
    /// Returns whether any evaluation changed a value across the whole
    /// call, so clients interleaving solving with graph growth can detect
    /// the need for another outer round.
    pub fn solve(&mut self) -> Result<bool> {
        let mut global_change = false;

        if self.first_solve {
            self.reorder_now();
            self.enqueue_all_statements();
            self.first_solve = false;
        }

        while !self.worklist.is_empty() {
            self.maybe_reorder();

            // entries for statements removed since insertion are skipped
            let Some(id) = self.take_next_live() else {
                break;
            };
            let result = self.evaluate_and_integrate(id)?;
            if result.changed {
                global_change = true;
            }
        }
        Ok(global_change)
    }

    fn take_next_live(&mut self) -> Option<StmtId> {
        while let Some(id) = self.worklist.take() {
            if self.graph.statement(id).is_some() {
                return Some(id);
            }
        }
        None
    }

    /// Final variable values keyed by handle; diagnostic convenience
    pub fn values(&self) -> FxHashMap<VarId, V> {
        (0..self.graph.num_variables() as VarId)
            .map(|v| (v, self.graph.value(v).clone()))
            .collect()
    }
}

impl<V: AbstractValue> std::fmt::Debug for FixpointSolver<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixpointSolver")
            .field("variables", &self.graph.num_variables())
            .field("statements", &self.graph.num_statements())
            .field("worklist", &self.worklist.len())
            .field("stats", &self.stats)
            .finish()
    }
}
