//! Live value analysis.
//!
//! A value is *live* at a program point if some path from that point reaches
//! a use of the value before any redefinition. In SSA each value is defined
//! exactly once, so this reduces to: a value is live if it will still be
//! used on some path.
//!
//! This is a deliberately small client of the generic solver: the same
//! engine that drives the interprocedural points-to analysis runs this
//! backward, function-local analysis unchanged.
//!
//! # Algorithm
//!
//! Backward data flow over sets of value ids:
//!
//! - `OUT[B]` = ∪ `IN[S]` over successors `S`
//! - per instruction, last to first: kill the definition, gen the uses
//! - `IN[B]` is the state after the whole block has been walked

use std::collections::BTreeSet;

use crate::analysis::dataflow::{DataflowAnalysis, Direction, JoinSemiLattice, SolverCx};
use crate::ir::{Function, InstKind, Instruction, Module, ValueId};

/// The lattice: the set of values live at a program point.
///
/// Ordered so printed results are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSet {
    live: BTreeSet<ValueId>,
}

impl LiveSet {
    /// Creates an empty set (nothing live).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `v` is live at this point.
    #[must_use]
    pub fn is_live(&self, v: ValueId) -> bool {
        self.live.contains(&v)
    }

    /// Returns the number of live values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if nothing is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Iterates over the live values in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.live.iter().copied()
    }
}

impl JoinSemiLattice for LiveSet {
    /// Union: live on any successor path means live here.
    fn join_from(&mut self, other: &Self) {
        self.live.extend(other.live.iter().copied());
    }
}

/// Backward liveness over value ids.
///
/// # Example
///
/// ```rust,ignore
/// use ptrscope::analysis::{DataflowSolver, LiveValues};
///
/// let solver = DataflowSolver::new(&module, LiveValues::new());
/// let (results, _) = solver.solve(func);
/// let entry_live = results.in_state(module.entry_ref(func));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveValues;

impl LiveValues {
    /// Creates the analysis.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DataflowAnalysis for LiveValues {
    type State = LiveSet;
    const DIRECTION: Direction = Direction::Backward;

    fn initial(&self, _module: &Module) -> LiveSet {
        LiveSet::new()
    }

    fn transfer_inst(
        &mut self,
        _module: &Module,
        _func: &Function,
        inst: &Instruction,
        state: &mut LiveSet,
        _cx: &mut SolverCx<'_, LiveSet>,
    ) {
        if matches!(inst.kind(), InstKind::DbgInfo) {
            return;
        }
        if let Some(def) = inst.def() {
            state.live.remove(&def);
        }
        for used in inst.uses() {
            state.live.insert(used);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::dataflow::DataflowSolver;
    use crate::ir::{BlockRef, ModuleBuilder, Type};

    #[test]
    fn params_live_at_entry_dead_after_last_use() {
        let mut m = ModuleBuilder::new();
        let plus = m
            .define(
                "plus",
                vec![("a", Type::Int(32)), ("b", Type::Int(32))],
                Type::Int(32),
            )
            .unwrap();
        let mut f = m.body(plus).unwrap();
        let a = f.param(0);
        let b = f.param(1);
        f.block("entry");
        let s = f.other("s", "add", &[a, b], Type::Int(64)).unwrap();
        f.ret(Some(s)).unwrap();
        f.finish().unwrap();
        let module = m.finish().unwrap();

        let func = module.function_by_name("plus").unwrap();
        let (results, _) = DataflowSolver::new(&module, LiveValues::new()).solve(func);

        let entry = module.entry_ref(func);
        let live_in = results.in_state(entry).unwrap();
        assert!(live_in.is_live(a));
        assert!(live_in.is_live(b));
        // The sum is defined and consumed inside the block.
        assert!(!live_in.is_live(s));
        // Nothing is live after the return.
        assert!(results.out_state(entry).unwrap().is_empty());
    }

    #[test]
    fn loop_keeps_counter_live() {
        let mut m = ModuleBuilder::new();
        let count = m
            .define("count", vec![("n", Type::Int(32))], Type::Void)
            .unwrap();
        let mut f = m.body(count).unwrap();
        let n = f.param(0);
        let entry = f.block("entry");
        let header = f.block("header");
        let exit = f.block("exit");
        f.switch_to(entry);
        f.br(header).unwrap();
        f.switch_to(header);
        let c = f.const_int(1);
        let dec = f.other("dec", "sub", &[n, c], Type::Int(64)).unwrap();
        f.cond_br(dec, header, exit).unwrap();
        f.switch_to(exit);
        f.ret(None).unwrap();
        f.finish().unwrap();
        let module = m.finish().unwrap();

        let func = module.function_by_name("count").unwrap();
        let (results, _) = DataflowSolver::new(&module, LiveValues::new()).solve(func);

        // n flows around the back edge, so it is live into the header from
        // both the entry and the loop itself.
        let header_ref = BlockRef::new(func, header);
        assert!(results.in_state(header_ref).unwrap().is_live(n));
        assert!(results.out_state(header_ref).unwrap().is_live(n));
        // And nothing survives past the exit block.
        let exit_ref = BlockRef::new(func, exit);
        assert!(results.out_state(exit_ref).unwrap().is_empty());
    }
}
