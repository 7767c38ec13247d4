//! Data flow analysis trait, direction, results, and the solver side channel.
//!
//! This module defines the core abstraction for data flow analyses. Any
//! specific analysis (points-to, liveness) implements the
//! [`DataflowAnalysis`] trait to work with the solver; the solver handles
//! iteration to a fixed point.

use std::collections::BTreeMap;

use crate::ir::{Block, BlockRef, FuncId, Function, Instruction, Module};

use super::lattice::JoinSemiLattice;

/// Direction of data flow analysis.
///
/// The direction determines how information propagates through the CFG and
/// which neighbors are combined at merge points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Information flows forward, from entry to exit.
    ///
    /// Block input is the join of all predecessor outputs.
    ///
    /// Examples: points-to, reaching definitions.
    Forward,

    /// Information flows backward, from exit to entry.
    ///
    /// Block output is the join of all successor inputs.
    ///
    /// Examples: live variables, very busy expressions.
    Backward,
}

/// A data flow analysis runnable by the solver.
///
/// Implementations provide the per-instruction transfer function; the
/// per-block transfer has a default that walks the block in direction order.
/// The solver guarantees nothing about block visit order, only that it
/// re-visits a block whenever the inputs feeding it change, so the transfer
/// must be monotone over a finite-height lattice for the fixed point to
/// exist.
///
/// Analyses take `&mut self` so they can accumulate per-run output alongside
/// the lattice states (the points-to analysis collects resolved call targets
/// this way); the solver hands the analysis back when it is done.
pub trait DataflowAnalysis {
    /// The lattice type representing abstract state at each program point.
    type State: JoinSemiLattice;

    /// The direction of this analysis.
    const DIRECTION: Direction;

    /// Returns the initial state for every block not otherwise seeded.
    fn initial(&self, module: &Module) -> Self::State;

    /// Computes the transfer function for a whole basic block.
    ///
    /// The default walks the instructions forward or backward according to
    /// [`Self::DIRECTION`] and applies [`transfer_inst`](Self::transfer_inst)
    /// to each.
    fn transfer_block(
        &mut self,
        module: &Module,
        func: &Function,
        block: &Block,
        state: &mut Self::State,
        cx: &mut SolverCx<'_, Self::State>,
    ) {
        match Self::DIRECTION {
            Direction::Forward => {
                for inst in block.instructions() {
                    self.transfer_inst(module, func, inst, state, cx);
                }
            }
            Direction::Backward => {
                for inst in block.instructions().iter().rev() {
                    self.transfer_inst(module, func, inst, state, cx);
                }
            }
        }
    }

    /// Computes the transfer function for a single instruction, mutating
    /// `state` in place.
    fn transfer_inst(
        &mut self,
        module: &Module,
        func: &Function,
        inst: &Instruction,
        state: &mut Self::State,
        cx: &mut SolverCx<'_, Self::State>,
    );
}

/// Per-block `(in, out)` states computed by the solver.
///
/// Blocks materialize lazily: a block appears once it has been seeded,
/// scheduled through the side channel, or visited. Pre-seeded entries keep
/// their `in` state as the seed; everything else starts from the analysis'
/// initial value.
#[derive(Debug, Clone)]
pub struct AnalysisResults<S> {
    states: BTreeMap<BlockRef, (S, S)>,
    iterations: usize,
}

impl<S> AnalysisResults<S> {
    pub(crate) fn new() -> Self {
        Self {
            states: BTreeMap::new(),
            iterations: 0,
        }
    }

    /// Returns the input state of a block, if it was ever reached.
    #[must_use]
    pub fn in_state(&self, block: BlockRef) -> Option<&S> {
        self.states.get(&block).map(|(i, _)| i)
    }

    /// Returns the output state of a block, if it was ever reached.
    #[must_use]
    pub fn out_state(&self, block: BlockRef) -> Option<&S> {
        self.states.get(&block).map(|(_, o)| o)
    }

    /// Returns the number of blocks with materialized states.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.states.len()
    }

    /// Returns the number of block visits the solver performed.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Iterates over `(block, (in, out))` pairs in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockRef, &(S, S))> {
        self.states.iter().map(|(&b, s)| (b, s))
    }

    pub(crate) fn contains(&self, block: BlockRef) -> bool {
        self.states.contains_key(&block)
    }

    pub(crate) fn insert(&mut self, block: BlockRef, in_state: S, out_state: S) {
        self.states.insert(block, (in_state, out_state));
    }

    pub(crate) fn entry_mut(&mut self, block: BlockRef) -> &mut (S, S) {
        self.states.get_mut(&block).expect("block not materialized")
    }

    pub(crate) fn bump_iterations(&mut self) {
        self.iterations += 1;
    }
}

/// Side channel between an interprocedural transfer function and the solver.
///
/// This is how call handling stays cooperative: instead of running a nested
/// solver on the callee, the transfer function queues the callee's entry
/// block (with its incoming lattice) and reads the callee's exit state from
/// the shared result table. Caller and callee blocks coexist in one worklist
/// and the fixed point is module-wide, which keeps mutual recursion off the
/// call stack.
///
/// Intraprocedural analyses simply ignore the context.
#[derive(Debug)]
pub struct SolverCx<'a, S> {
    module: &'a Module,
    results: &'a AnalysisResults<S>,
    current: BlockRef,
    entries: Vec<(BlockRef, S)>,
    watches: Vec<(BlockRef, BlockRef)>,
}

impl<'a, S: JoinSemiLattice> SolverCx<'a, S> {
    pub(crate) fn new(
        module: &'a Module,
        results: &'a AnalysisResults<S>,
        current: BlockRef,
    ) -> Self {
        Self {
            module,
            results,
            current,
            entries: Vec::new(),
            watches: Vec::new(),
        }
    }

    /// Returns the block currently being transferred.
    #[must_use]
    pub const fn current(&self) -> BlockRef {
        self.current
    }

    /// Queues `state` to be joined into the input of `entry`, scheduling the
    /// block. Used by call transfer to hand an incoming lattice to a callee.
    pub fn request_entry(&mut self, entry: BlockRef, state: S) {
        self.entries.push((entry, state));
    }

    /// Returns the join of the exit-block outputs of `func` as currently
    /// known, or `None` if no exit state has materialized yet.
    ///
    /// The current block is registered as a dependent of every exit block of
    /// `func`: whenever one of those outputs changes, the solver re-schedules
    /// the current block so the observation is eventually consistent.
    pub fn observe_exit(&mut self, func: FuncId) -> Option<S> {
        let mut acc: Option<S> = None;
        let exits: Vec<BlockRef> = self.module.exit_refs(func).collect();
        for exit in exits {
            self.watches.push((exit, self.current));
            if let Some(out) = self.results.out_state(exit) {
                match &mut acc {
                    None => acc = Some(out.clone()),
                    Some(acc) => acc.join_from(out),
                }
            }
        }
        acc
    }

    /// Consumes the context, handing its queued entries and dependency
    /// registrations back to the solver.
    #[allow(clippy::type_complexity)]
    pub(crate) fn take_effects(self) -> (Vec<(BlockRef, S)>, Vec<(BlockRef, BlockRef)>) {
        (self.entries, self.watches)
    }
}
