//! Worklist-based data flow solver.
//!
//! This module provides the iterative solver that computes fixed points for
//! data flow analyses over a whole module.
//!
//! # Algorithm
//!
//! 1. Seed every block of the start function with the initial value and push
//!    it onto the worklist.
//! 2. While the worklist is non-empty:
//!    a. Remove the smallest block (the worklist is an ordered set, so runs
//!       are deterministic; the fixed point itself is order-independent).
//!    b. Join the neighbor states feeding the block (predecessor outputs
//!       forward, successor inputs backward) into its own boundary state.
//!    c. Apply the transfer function.
//!    d. If the produced state changed, schedule the affected neighbors and
//!       every registered dependent.
//! 3. Drain the side channel after each visit: queued callee entries are
//!    joined into the callee's input and scheduled, which is how blocks of
//!    other functions enter the same worklist.
//!
//! # Termination
//!
//! The caller must guarantee a monotone transfer function over a
//! finite-height lattice; the solver imposes no iteration bound of its own.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};

use crate::ir::{BlockRef, FuncId, Module};

use super::{
    framework::{AnalysisResults, DataflowAnalysis, Direction, SolverCx},
    lattice::JoinSemiLattice,
};

/// Worklist-based data flow solver, generic over the analysis.
///
/// # Usage
///
/// ```rust,ignore
/// use ptrscope::analysis::{DataflowSolver, PointsToAnalysis};
///
/// let solver = DataflowSolver::new(&module, PointsToAnalysis::new());
/// let (results, analysis) = solver.solve(entry);
/// ```
pub struct DataflowSolver<'m, A: DataflowAnalysis> {
    module: &'m Module,
    analysis: A,
    init: A::State,
    results: AnalysisResults<A::State>,
    worklist: BTreeSet<BlockRef>,
    dependents: BTreeMap<BlockRef, BTreeSet<BlockRef>>,
}

impl<'m, A: DataflowAnalysis> DataflowSolver<'m, A> {
    /// Creates a solver for the given module and analysis.
    #[must_use]
    pub fn new(module: &'m Module, analysis: A) -> Self {
        let init = analysis.initial(module);
        Self {
            module,
            analysis,
            init,
            results: AnalysisResults::new(),
            worklist: BTreeSet::new(),
            dependents: BTreeMap::new(),
        }
    }

    /// Runs the analysis from `func` to quiescence.
    ///
    /// Every block of `func` is seeded with the initial value; blocks of
    /// other functions join the worklist when the transfer function requests
    /// them through the side channel. Returns the per-block states and the
    /// analysis itself, so accumulated per-run output can be recovered.
    pub fn solve(mut self, func: FuncId) -> (AnalysisResults<A::State>, A) {
        self.seed(func);

        while let Some(block) = self.worklist.pop_first() {
            self.results.bump_iterations();
            self.step(block);
        }

        debug!(
            "fixed point over {} blocks after {} visits",
            self.results.block_count(),
            self.results.iterations()
        );
        (self.results, self.analysis)
    }

    /// Seeds all blocks of a function and schedules them.
    fn seed(&mut self, func: FuncId) {
        for block in self.module.function(func).blocks() {
            let r = BlockRef::new(func, block.id());
            self.ensure(r);
            self.worklist.insert(r);
        }
    }

    /// Materializes a block's `(in, out)` entry if absent.
    ///
    /// An entry already present keeps its states: pre-populated results are
    /// the seed, not something to overwrite.
    fn ensure(&mut self, block: BlockRef) {
        if !self.results.contains(block) {
            self.results
                .insert(block, self.init.clone(), self.init.clone());
        }
    }

    /// Visits one block: recompute its boundary input, run the transfer, and
    /// propagate on change.
    fn step(&mut self, block: BlockRef) {
        self.ensure(block);
        trace!("visiting {block}");

        // Join the states feeding this block into its current boundary
        // value. Starting from the stored state (rather than bottom) keeps
        // side-channel seeds and prior knowledge; joins are monotone, so
        // nothing is ever lost.
        let mut boundary = match A::DIRECTION {
            Direction::Forward => self.results.entry_mut(block).0.clone(),
            Direction::Backward => self.results.entry_mut(block).1.clone(),
        };
        match A::DIRECTION {
            Direction::Forward => {
                let preds: Vec<BlockRef> = self.module.predecessors(block).collect();
                for pred in preds {
                    if let Some(out) = self.results.out_state(pred) {
                        boundary.join_from(out);
                    }
                }
                self.results.entry_mut(block).0 = boundary.clone();
            }
            Direction::Backward => {
                let succs: Vec<BlockRef> = self.module.successors(block).collect();
                for succ in succs {
                    if let Some(inp) = self.results.in_state(succ) {
                        boundary.join_from(inp);
                    }
                }
                self.results.entry_mut(block).1 = boundary.clone();
            }
        }

        // Apply the transfer function to a copy of the boundary state.
        let mut produced = boundary;
        let func = self.module.function(block.func);
        let blk = self.module.block(block);
        let mut cx = SolverCx::new(self.module, &self.results, block);
        self.analysis
            .transfer_block(self.module, func, blk, &mut produced, &mut cx);
        let (entries, watches) = cx.take_effects();

        for (watched, dependent) in watches {
            self.dependents.entry(watched).or_default().insert(dependent);
        }
        for (entry, state) in entries {
            // A block seen for the first time must run at least once even if
            // the supplied lattice adds nothing to its input.
            let first_visit = !self.results.contains(entry);
            self.ensure(entry);
            let slot = self.results.entry_mut(entry);
            let before = slot.0.clone();
            slot.0.join_from(&state);
            if first_visit || slot.0 != before {
                self.worklist.insert(entry);
            }
        }

        // Store the produced state and propagate if it changed.
        let changed = match A::DIRECTION {
            Direction::Forward => {
                let slot = self.results.entry_mut(block);
                let changed = produced != slot.1;
                slot.1 = produced;
                changed
            }
            Direction::Backward => {
                let slot = self.results.entry_mut(block);
                let changed = produced != slot.0;
                slot.0 = produced;
                changed
            }
        };

        if changed {
            match A::DIRECTION {
                Direction::Forward => {
                    let succs: Vec<BlockRef> = self.module.successors(block).collect();
                    self.worklist.extend(succs);
                }
                Direction::Backward => {
                    let preds: Vec<BlockRef> = self.module.predecessors(block).collect();
                    self.worklist.extend(preds);
                }
            }
            if let Some(deps) = self.dependents.get(&block) {
                self.worklist.extend(deps.iter().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, Instruction, ModuleBuilder, Type};

    /// A forward analysis that counts instructions along paths.
    #[derive(Debug)]
    struct CountInsts;

    #[derive(Debug, Clone, PartialEq)]
    struct Count(u32);

    impl JoinSemiLattice for Count {
        fn join_from(&mut self, other: &Self) {
            self.0 = self.0.max(other.0);
        }
    }

    impl DataflowAnalysis for CountInsts {
        type State = Count;
        const DIRECTION: Direction = Direction::Forward;

        fn initial(&self, _module: &Module) -> Count {
            Count(0)
        }

        fn transfer_inst(
            &mut self,
            _module: &Module,
            _func: &Function,
            _inst: &Instruction,
            state: &mut Count,
            _cx: &mut SolverCx<'_, Count>,
        ) {
            state.0 += 1;
        }
    }

    fn diamond() -> (Module, FuncId) {
        let mut m = ModuleBuilder::new();
        let pick = m
            .define("pick", vec![("k", Type::Int(32))], Type::Int(32))
            .unwrap();
        let mut f = m.body(pick).unwrap();
        let k = f.param(0);
        let entry = f.block("entry");
        let then_b = f.block("then");
        let else_b = f.block("else");
        let join_b = f.block("join");
        f.switch_to(entry);
        f.cond_br(k, then_b, else_b).unwrap();
        f.switch_to(then_b);
        f.br(join_b).unwrap();
        f.switch_to(else_b);
        let x = f.const_int(9);
        f.other("t", "add", &[x, x], Type::Int(64)).unwrap();
        f.br(join_b).unwrap();
        f.switch_to(join_b);
        let zero = f.const_int(0);
        f.ret(Some(zero)).unwrap();
        f.finish().unwrap();
        let module = m.finish().unwrap();
        let func = module.function_by_name("pick").unwrap();
        (module, func)
    }

    #[test]
    fn forward_fixed_point_on_diamond() {
        let (module, func) = diamond();
        let solver = DataflowSolver::new(&module, CountInsts);
        let (results, _) = solver.solve(func);

        // join block input is the max over both paths: entry(1) + else(2).
        let join = BlockRef::new(func, crate::ir::BlockId::new(3));
        assert_eq!(results.in_state(join), Some(&Count(3)));
        assert_eq!(results.out_state(join), Some(&Count(4)));
        assert_eq!(results.block_count(), 4);
    }

    #[test]
    fn fixed_point_inputs_cover_predecessor_outputs() {
        let (module, func) = diamond();
        let solver = DataflowSolver::new(&module, CountInsts);
        let (results, _) = solver.solve(func);

        for (block, (in_state, _)) in results.iter() {
            for pred in module.predecessors(block) {
                let pred_out = results.out_state(pred).unwrap();
                let mut joined = in_state.clone();
                joined.join_from(pred_out);
                assert_eq!(&joined, in_state, "in[{block}] must cover out[{pred}]");
            }
        }
    }

    #[test]
    fn resolving_twice_is_idempotent() {
        let (module, func) = diamond();
        let (first, _) = DataflowSolver::new(&module, CountInsts).solve(func);
        let (second, _) = DataflowSolver::new(&module, CountInsts).solve(func);
        for (block, (in_state, out_state)) in first.iter() {
            assert_eq!(second.in_state(block), Some(in_state));
            assert_eq!(second.out_state(block), Some(out_state));
        }
    }
}
