//! The points-to transfer function.
//!
//! Interprets the pointer-relevant instructions and drives interprocedural
//! expansion through the solver's side channel. Calls are handled
//! cooperatively: the transfer binds the actuals into a fresh incoming
//! lattice for the callee, queues the callee's entry block, and reads the
//! callee's exit state back from the shared result table. Caller and callee
//! reach a common module-wide fixed point without nested solver runs, which
//! also keeps mutual recursion off the call stack.
//!
//! Malformed shapes (argument-count mismatches, loads through non-pointers)
//! are skipped silently; the output is always a best-effort may-set.

use std::collections::BTreeSet;

use log::trace;

use crate::analysis::dataflow::{DataflowAnalysis, Direction, SolverCx};
use crate::ir::{FuncId, Function, InstKind, Instruction, Module, ValueId, ValueKind};

use super::{callsites::CallSiteResults, state::PointsToState};

/// Interprocedural may-points-to analysis with indirect-call resolution.
///
/// Accumulates a [`CallSiteResults`] while the solver runs; recover it with
/// [`into_results`](Self::into_results) afterwards.
#[derive(Debug, Default)]
pub struct PointsToAnalysis {
    results: CallSiteResults,
}

impl PointsToAnalysis {
    /// Creates the analysis with an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the analysis, returning the resolved call targets.
    #[must_use]
    pub fn into_results(self) -> CallSiteResults {
        self.results
    }

    /// `*ptr = value`.
    ///
    /// Null and other constant stores carry no pointer information and are
    /// dropped. A single resolved target cell gets a strong update; multiple
    /// targets get the sound weak union.
    fn transfer_store(
        &mut self,
        module: &Module,
        value: ValueId,
        ptr: ValueId,
        state: &mut PointsToState,
    ) {
        if module.value(value).is_constant() {
            return;
        }
        let targets = state.resolve_pointer(ptr);
        let sources = state.resolve_value(value);
        if targets.len() == 1 {
            let target = *targets.iter().next().expect("nonempty");
            state.set_pts(target, sources);
        } else {
            for target in targets {
                state.merge_pts(target, &sources);
            }
        }
    }

    /// `result = *ptr`, only observed when the pointee is itself a pointer;
    /// first-level loads of scalars are irrelevant here.
    fn transfer_load(
        &mut self,
        module: &Module,
        ptr: ValueId,
        result: ValueId,
        state: &mut PointsToState,
    ) {
        if !module.value(ptr).ty().pointee_is_pointer() {
            return;
        }
        let contents = state.pts(ptr);
        state.set_binding(result, contents);
    }

    /// Bulk copy: whatever a load from `src` may observe becomes the
    /// contents of the cells behind `dst`.
    fn transfer_memcpy(&mut self, dst: ValueId, src: ValueId, state: &mut PointsToState) {
        let contents = state.pts(src);
        let targets = state.resolve_value(dst);
        if targets.len() == 1 {
            let target = *targets.iter().next().expect("nonempty");
            state.set_pts(target, contents);
        } else {
            // Non-singular destination: degrade to a weak union per target.
            for target in targets {
                state.merge_pts(target, &contents);
            }
        }
    }

    /// `ret value` channels the returned value through the synthetic binding
    /// slot keyed by the function's own value, but only when a caller
    /// allocated that slot before descending.
    fn transfer_return(
        &mut self,
        func: &Function,
        value: Option<ValueId>,
        state: &mut PointsToState,
    ) {
        let slot = func.value();
        if !state.has_binding(slot) {
            return;
        }
        if let Some(value) = value {
            let sources = state.resolve_value(value);
            state.set_binding(slot, sources);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn transfer_call(
        &mut self,
        module: &Module,
        inst: &Instruction,
        callee: ValueId,
        args: &[ValueId],
        result: Option<ValueId>,
        state: &mut PointsToState,
        cx: &mut SolverCx<'_, PointsToState>,
    ) {
        // Determine the callee set: a syntactic function is itself the only
        // target; anything else resolves through its alias binding. An
        // unbound callee expression stays unresolved for now; the fixed
        // point revisits this block once bindings arrive.
        let callees: Vec<ValueId> = if module.value(callee).is_function() {
            vec![callee]
        } else {
            match state.binding(callee) {
                Some(targets) => targets
                    .iter()
                    .copied()
                    .filter(|&t| module.value(t).is_function())
                    .collect(),
                None => return,
            }
        };
        if callees.is_empty() {
            return;
        }

        for &target in &callees {
            if let Some(name) = module.value(target).name() {
                self.results.record(inst.line(), name);
            }
        }

        for &target in &callees {
            let ValueKind::Function(fid) = *module.value(target).kind() else {
                continue;
            };
            let callee_fn = module.function(fid);
            if callee_fn.is_declaration() {
                // Opaque external (e.g. malloc): recorded by name, no body
                // to descend into, no propagation.
                continue;
            }
            trace!(
                "call at line {} descends into '{}'",
                inst.line(),
                callee_fn.name()
            );
            self.descend(module, fid, callee_fn, args, result, state, cx);
        }
    }

    /// Prepares the callee's incoming lattice, schedules its entry, and
    /// folds its currently-known exit state back into the caller.
    #[allow(clippy::too_many_arguments)]
    fn descend(
        &mut self,
        module: &Module,
        fid: FuncId,
        callee: &Function,
        args: &[ValueId],
        result: Option<ValueId>,
        state: &mut PointsToState,
        cx: &mut SolverCx<'_, PointsToState>,
    ) {
        let mut callee_in = PointsToState::new();
        // Reconciliation pairs: (value in the caller, value in the callee).
        let mut pairs: Vec<(ValueId, ValueId)> = Vec::new();

        // Bind pointer-typed actuals to formals. zip drops any surplus on
        // either side, which is the silent policy for arity mismatches.
        for (&actual, &formal) in args.iter().zip(callee.params()) {
            if !module.value(actual).is_pointer() {
                continue;
            }
            let sources = state.resolve_value(actual);
            callee_in.set_binding(formal, sources.clone());
            pairs.push((actual, formal));

            // Carry the memory reachable through the actual across the
            // boundary so the callee sees what the caller's cells hold.
            for cell in state.reachable_cells(&sources) {
                if let Some(contents) = state.cell_contents(cell) {
                    callee_in.set_pts(cell, contents.clone());
                    pairs.push((cell, cell));
                }
            }
        }

        // A pointer-returning callee gets a placeholder self-binding; its
        // `ret` transfer overwrites it with the real sources, and the caller
        // reads them back through the (result, slot) pair.
        let slot = callee.value();
        if callee.return_type().is_pointer() {
            callee_in.set_binding(slot, BTreeSet::from([slot]));
            if let Some(result) = result {
                pairs.push((result, slot));
            }
        }

        let baseline = callee_in.clone();
        cx.request_entry(module.entry_ref(fid), callee_in);

        if let Some(exit) = cx.observe_exit(fid) {
            self.reconcile(module, state, &exit, &baseline, &pairs);
        }
    }

    /// Folds the callee's exit state back into the caller along the
    /// remembered pairs. All merges are unions; a weak update is sound here.
    fn reconcile(
        &mut self,
        module: &Module,
        caller: &mut PointsToState,
        callee_out: &PointsToState,
        callee_in: &PointsToState,
        pairs: &[(ValueId, ValueId)],
    ) {
        for &(caller_v, callee_v) in pairs {
            // The synthetic return slot is the one binding a callee
            // legitimately rewrites; formals keep their binding in SSA, so a
            // difference there is only other call sites' context bleeding
            // through the shared table and must not rebind our actual.
            if matches!(module.value(callee_v).kind(), ValueKind::Function(_)) {
                if let Some(out_binding) = callee_out.binding(callee_v) {
                    if callee_in.binding(callee_v) != Some(out_binding) {
                        caller.merge_binding(caller_v, out_binding);
                    }
                }
            }

            // Carry mutations-through-pointers back: any cell reachable from
            // the callee-side value whose contents moved past what we sent in
            // is unioned into the caller's view.
            let roots = callee_out.resolve_pointer(callee_v);
            for cell in callee_out.reachable_cells(&roots) {
                if let Some(contents) = callee_out.cell_contents(cell) {
                    if callee_in.cell_contents(cell) != Some(contents) {
                        caller.merge_pts(cell, contents);
                    }
                }
            }
        }
    }
}

impl DataflowAnalysis for PointsToAnalysis {
    type State = PointsToState;
    const DIRECTION: Direction = Direction::Forward;

    fn initial(&self, _module: &Module) -> PointsToState {
        PointsToState::new()
    }

    fn transfer_inst(
        &mut self,
        module: &Module,
        func: &Function,
        inst: &Instruction,
        state: &mut PointsToState,
        cx: &mut SolverCx<'_, PointsToState>,
    ) {
        match inst.kind() {
            InstKind::Store { value, ptr } => self.transfer_store(module, *value, *ptr, state),
            InstKind::Load { ptr, result } => self.transfer_load(module, *ptr, *result, state),
            InstKind::GetElementPtr { base, result } => {
                // Field-insensitive: the derived pointer aliases its base.
                let sources = state.resolve_value(*base);
                state.set_binding(*result, sources);
            }
            InstKind::BitCast { src, result } => {
                // Identity is preserved; with arena ids that means an
                // explicit binding to the source.
                let sources = state.resolve_value(*src);
                state.set_binding(*result, sources);
            }
            InstKind::MemCpy { dst, src } => self.transfer_memcpy(*dst, *src, state),
            InstKind::Return { value } => self.transfer_return(func, *value, state),
            InstKind::Call {
                callee,
                args,
                result,
            } => self.transfer_call(module, inst, *callee, args, *result, state, cx),
            // An alloca result is itself the abstract cell; memset writes no
            // pointers; the rest carry no pointer information.
            InstKind::Alloca { .. }
            | InstKind::MemSet { .. }
            | InstKind::Branch { .. }
            | InstKind::CondBranch { .. }
            | InstKind::DbgInfo
            | InstKind::Other { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ModuleBuilder, Type};

    fn fn_ty() -> Type {
        Type::func(vec![Type::Int(32), Type::Int(32)], Type::Int(32))
    }

    /// Builds `plus` and `minus` definitions used as pointer targets.
    fn add_leaf(m: &mut ModuleBuilder, name: &str) -> ValueId {
        let f = m
            .define(name, vec![("a", Type::Int(32)), ("b", Type::Int(32))], Type::Int(32))
            .unwrap();
        let mut b = m.body(f).unwrap();
        let x = b.param(0);
        let y = b.param(1);
        b.block("entry");
        let s = b.other("s", "add", &[x, y], Type::Int(64)).unwrap();
        b.ret(Some(s)).unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn store_then_load_binds_result() {
        let mut m = ModuleBuilder::new();
        let plus = add_leaf(&mut m, "plus");
        let main = m.define("main", vec![], Type::Int(32)).unwrap();
        let mut f = m.body(main).unwrap();
        f.block("entry");
        let fp = f.alloca("fp", fn_ty()).unwrap();
        f.store(plus, fp).unwrap();
        let g = f.load("g", fp).unwrap();
        f.at(7);
        let _r = f.call(Some("r"), g, &[]).unwrap();
        let zero = f.const_int(0);
        f.at(0).ret(Some(zero)).unwrap();
        f.finish().unwrap();
        let module = m.finish().unwrap();

        let func = module.function_by_name("main").unwrap();
        let solver = crate::analysis::DataflowSolver::new(&module, PointsToAnalysis::new());
        let (_, analysis) = solver.solve(func);
        let results = analysis.into_results();
        assert_eq!(
            results.targets(7).map(|s| s.iter().cloned().collect::<Vec<_>>()),
            Some(vec!["plus".to_string()])
        );
    }

    #[test]
    fn null_store_is_dropped() {
        let mut m = ModuleBuilder::new();
        let main = m.define("main", vec![], Type::Void).unwrap();
        let mut f = m.body(main).unwrap();
        f.block("entry");
        let fp = f.alloca("fp", fn_ty()).unwrap();
        let null = f.const_null(Type::ptr(Type::Int(8)));
        f.store(null, fp).unwrap();
        f.ret(None).unwrap();
        f.finish().unwrap();
        let module = m.finish().unwrap();

        let func = module.function_by_name("main").unwrap();
        let solver = crate::analysis::DataflowSolver::new(&module, PointsToAnalysis::new());
        let (results, _) = solver.solve(func);
        let exit = module.exit_refs(func).next().unwrap();
        let out = results.out_state(exit).unwrap();
        assert_eq!(out.cells().count(), 0, "null store must not materialize");
    }

    #[test]
    fn weak_update_accumulates_on_multiple_targets() {
        let mut m = ModuleBuilder::new();
        let plus = add_leaf(&mut m, "plus");
        let minus = add_leaf(&mut m, "minus");
        let main = m.define("main", vec![], Type::Void).unwrap();
        let mut f = m.body(main).unwrap();
        f.block("entry");
        let a = f.alloca("a", fn_ty()).unwrap();
        let b = f.alloca("b", fn_ty()).unwrap();
        let p = f.gep("p", a).unwrap();
        f.ret(None).unwrap();
        f.finish().unwrap();
        let module = m.finish().unwrap();

        // Make p ambiguous between the two cells, then store through it:
        // both stores must accumulate into both cells.
        let mut state = PointsToState::new();
        let mut analysis = PointsToAnalysis::new();
        state.set_binding(p, [a, b].into_iter().collect());
        analysis.transfer_store(&module, plus, p, &mut state);
        analysis.transfer_store(&module, minus, p, &mut state);
        let expect: std::collections::BTreeSet<ValueId> = [plus, minus].into_iter().collect();
        assert_eq!(state.cell_contents(a), Some(&expect));
        assert_eq!(state.cell_contents(b), Some(&expect));
    }

    #[test]
    fn scalar_load_is_ignored() {
        let mut m = ModuleBuilder::new();
        let main = m.define("main", vec![], Type::Void).unwrap();
        let mut f = m.body(main).unwrap();
        f.block("entry");
        let cell = f.alloca("cell", Type::Int(32)).unwrap();
        let c = f.const_int(3);
        f.store(c, cell).unwrap();
        let x = f.load("x", cell).unwrap();
        f.ret(None).unwrap();
        f.finish().unwrap();
        let module = m.finish().unwrap();

        let mut state = PointsToState::new();
        let mut analysis = PointsToAnalysis::new();
        analysis.transfer_load(&module, cell, x, &mut state);
        assert!(!state.has_binding(x));
    }
}
