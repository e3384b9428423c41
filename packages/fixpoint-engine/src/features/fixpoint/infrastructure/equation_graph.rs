//! Equation Graph
//!
//! Owns all live statements and variables of one fixed-point system. The
//! structure is the dataflow graph itself: for every variable the graph
//! indexes the statements that read it, so a value change fans out to
//! exactly its consumers. Statements are hash-consed; adding an equation
//! that already exists is a no-op at the caller.
//!
//! `reorder` renumbers all variables close to a topological sort of the
//! producer→consumer relation (Kahn's algorithm over operand→lhs edges) so
//! worklist extraction evaluates producers before consumers where the
//! graph is acyclic.

use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::features::fixpoint::domain::{AbstractValue, Statement, StmtId, VarId, VariableCell};

/// The set of dataflow equations over a variable arena
#[derive(Debug)]
pub struct EquationGraph<V> {
    /// Variable arena; `VarId` indexes into this
    vars: Vec<VariableCell<V>>,

    /// Live statements by handle
    stmts: FxHashMap<StmtId, Statement>,

    /// Hash-consing index: statement shape → handle
    index: FxHashMap<Statement, StmtId>,

    /// Uses-index: variable → statements that read it
    uses: FxHashMap<VarId, FxHashSet<StmtId>>,

    next_stmt_id: StmtId,

    /// Next order number to hand out; strictly increasing across the
    /// process lifetime except for the wholesale renumbering in `reorder`
    next_order: u32,
}

impl<V: AbstractValue> Default for EquationGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: AbstractValue> EquationGraph<V> {
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            stmts: FxHashMap::default(),
            index: FxHashMap::default(),
            uses: FxHashMap::default(),
            next_stmt_id: 0,
            next_order: 1,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Variables
    // ═══════════════════════════════════════════════════════════════════

    fn fresh_order(&mut self) -> u32 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    /// Allocate a variable initialized to `initial`
    pub fn new_variable(&mut self, initial: V) -> VarId {
        let order = self.fresh_order();
        let id = self.vars.len() as VarId;
        self.vars.push(VariableCell::new(initial, order));
        id
    }

    /// Give `v` a fresh, strictly increasing order number
    pub fn assign_fresh_order(&mut self, v: VarId) {
        let order = self.fresh_order();
        self.vars[v as usize].set_order(order);
    }

    #[inline]
    pub fn num_variables(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn contains_variable(&self, v: VarId) -> bool {
        (v as usize) < self.vars.len()
    }

    #[inline]
    pub fn value(&self, v: VarId) -> &V {
        self.vars[v as usize].value()
    }

    #[inline]
    pub fn value_mut(&mut self, v: VarId) -> &mut V {
        self.vars[v as usize].value_mut()
    }

    #[inline]
    pub fn order_of(&self, v: VarId) -> u32 {
        self.vars[v as usize].order()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    /// Handle of an equal live statement, if one exists
    #[inline]
    pub fn find(&self, s: &Statement) -> Option<StmtId> {
        self.index.get(s).copied()
    }

    #[inline]
    pub fn contains_statement(&self, s: &Statement) -> bool {
        self.index.contains_key(s)
    }

    /// Insert a statement known not to be present; updates the uses-index
    /// for every operand. Callers deduplicate via [`find`] first.
    pub fn add_statement(&mut self, s: Statement) -> StmtId {
        debug_assert!(!self.contains_statement(&s));
        let id = self.next_stmt_id;
        self.next_stmt_id += 1;

        for operand in s.operands.iter() {
            self.uses.entry(operand).or_default().insert(id);
        }
        self.index.insert(s.clone(), id);
        self.stmts.insert(id, s);
        id
    }

    /// Delete a statement and its uses-index entries. Returns false if the
    /// handle was not live.
    pub fn remove_statement(&mut self, id: StmtId) -> bool {
        let Some(s) = self.stmts.remove(&id) else {
            return false;
        };
        for operand in s.operands.iter() {
            if let Some(users) = self.uses.get_mut(&operand) {
                users.remove(&id);
                if users.is_empty() {
                    self.uses.remove(&operand);
                }
            }
        }
        self.index.remove(&s);
        true
    }

    #[inline]
    pub fn statement(&self, id: StmtId) -> Option<&Statement> {
        self.stmts.get(&id)
    }

    pub fn statements(&self) -> impl Iterator<Item = (StmtId, &Statement)> {
        self.stmts.iter().map(|(&id, s)| (id, s))
    }

    pub fn statement_ids(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.stmts.keys().copied()
    }

    #[inline]
    pub fn num_statements(&self) -> usize {
        self.stmts.len()
    }

    /// Every live statement whose operand list contains `v`, in no
    /// particular order
    pub fn statements_that_use(&self, v: VarId) -> impl Iterator<Item = StmtId> + '_ {
        self.uses.get(&v).into_iter().flatten().copied()
    }

    /// Worklist key of a statement: its left-hand side's order number, or
    /// zero for diagnostic statements with no left-hand side
    #[inline]
    pub fn statement_order(&self, id: StmtId) -> u32 {
        self.stmts
            .get(&id)
            .and_then(|s| s.lhs)
            .map_or(0, |lhs| self.order_of(lhs))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Topological reordering
    // ═══════════════════════════════════════════════════════════════════

    /// Renumber all variables approximating a topological sort of the
    /// producer→consumer relation.
    ///
    /// Kahn's algorithm over operand→lhs edges; ties and leftover cycle
    /// members resolve by previous order, so renumbering is deterministic
    /// and stable for unconstrained variables.
    pub fn reorder(&mut self) {
        let n = self.vars.len();
        if n == 0 {
            return;
        }

        let mut in_degree: Vec<u32> = vec![0; n];
        let mut out_edges: FxHashMap<VarId, Vec<VarId>> = FxHashMap::default();
        let mut seen: FxHashSet<(VarId, VarId)> = FxHashSet::default();

        for s in self.stmts.values() {
            let Some(lhs) = s.lhs else { continue };
            for operand in s.operands.iter() {
                if operand == lhs {
                    continue;
                }
                if seen.insert((operand, lhs)) {
                    in_degree[lhs as usize] += 1;
                    out_edges.entry(operand).or_default().push(lhs);
                }
            }
        }

        // Sources first, smallest previous order breaking ties
        let mut ready: BinaryHeap<Reverse<(u32, VarId)>> = BinaryHeap::new();
        for v in 0..n {
            if in_degree[v] == 0 {
                ready.push(Reverse((self.vars[v].order(), v as VarId)));
            }
        }

        let mut next = 1u32;
        let mut assigned = vec![false; n];
        while let Some(Reverse((_, v))) = ready.pop() {
            self.vars[v as usize].set_order(next);
            assigned[v as usize] = true;
            next += 1;

            if let Some(succs) = out_edges.get(&v) {
                for &succ in succs {
                    let d = &mut in_degree[succ as usize];
                    *d -= 1;
                    if *d == 0 {
                        ready.push(Reverse((self.vars[succ as usize].order(), succ)));
                    }
                }
            }
        }

        // Cycle members never reach in-degree zero; keep their previous
        // relative order after everything acyclic
        let mut leftover: Vec<VarId> = (0..n as VarId)
            .filter(|&v| !assigned[v as usize])
            .collect();
        leftover.sort_by_key(|&v| self.vars[v as usize].order());
        for v in leftover {
            self.vars[v as usize].set_order(next);
            next += 1;
        }

        if self.next_order < next {
            self.next_order = next;
        }
    }
}
